//! Fixed ten-bin frequency distributions
//!
//! Nine ascending edges define ten bins: bin 0 is open below, bin 9 is open above,
//! and every bin in between is lower-inclusive and upper-exclusive.

use crate::errors::{Result, SkillError};
use serde::Serialize;

/// Number of edges delimiting the bins
pub const EDGE_COUNT: usize = 9;

/// Number of bins produced by the binner
pub const BIN_COUNT: usize = EDGE_COUNT + 1;

/// Edges used for every DAV distribution
pub const STANDARD_EDGES: [f64; EDGE_COUNT] =
    [-10.0, -5.0, 0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0];

/// Validated, strictly ascending bin edges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinEdges([f64; EDGE_COUNT]);

impl BinEdges {
    /// Validate a set of edges.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::InvalidBinEdges`] if the slice does not hold exactly
    /// nine finite, strictly ascending values.
    pub fn new(edges: &[f64]) -> Result<Self> {
        let edges: [f64; EDGE_COUNT] =
            edges.try_into().map_err(|_| SkillError::InvalidBinEdges {
                message: format!("expected {EDGE_COUNT} edges, got {}", edges.len()),
            })?;

        if edges.iter().any(|e| !e.is_finite()) {
            return Err(SkillError::InvalidBinEdges {
                message: "edges must be finite".to_string(),
            });
        }
        if let Some(pair) = edges.windows(2).find(|w| w[0] >= w[1]) {
            return Err(SkillError::InvalidBinEdges {
                message: format!("edges must ascend strictly, found {} then {}", pair[0], pair[1]),
            });
        }

        Ok(Self(edges))
    }

    /// The `{-10, -5, ..., 30}` edges
    #[must_use]
    pub const fn standard() -> Self {
        Self(STANDARD_EDGES)
    }

    /// Index of the bin `value` falls in. `value` must be finite.
    #[must_use]
    pub fn bin_index(&self, value: f64) -> usize {
        // Number of edges <= value, which is exactly the lower-inclusive bin index.
        self.0.partition_point(|&edge| edge <= value)
    }
}

impl Default for BinEdges {
    fn default() -> Self {
        Self::standard()
    }
}

/// Sample counts per bin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Histogram {
    counts: [u64; BIN_COUNT],
    /// Non-finite samples left out of the distribution
    excluded: u64,
}

impl Histogram {
    /// Bin every finite value. Missing (`NaN`) and infinite values are excluded and
    /// counted in [`Histogram::excluded`].
    #[must_use]
    pub fn from_values(values: &[f64], edges: &BinEdges) -> Self {
        let mut counts = [0_u64; BIN_COUNT];
        let mut excluded = 0_u64;

        for &value in values {
            if value.is_finite() {
                counts[edges.bin_index(value)] += 1;
            } else {
                excluded += 1;
            }
        }

        Self { counts, excluded }
    }

    #[must_use]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    #[must_use]
    pub const fn excluded(&self) -> u64 {
        self.excluded
    }

    /// Number of binned samples
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}
