//! Per-grid-point Kling-Gupta Efficiency and RMSD
//!
//! For every point of a [`GridTable`]:
//!
//! ```text
//! KGE  = 1 - sqrt((r - 1)^2 + (σm/σo - 1)^2 + (μm/μo - 1)^2)
//! RMSD = sqrt(σo^2 + σm^2 - 2·σo·σm·r)
//! ```
//!
//! followed by the outlier policy: RMSD above the ceiling is dropped, KGE below the
//! floor is replaced from its valid neighbours in table order.

use super::operations::nan_mean;
use crate::errors::{Result, SkillError};
use crate::grid::{GridPointRecord, GridTable};
use ndarray::Array1;
use serde::Serialize;
use tracing::{debug, warn};

/// Default RMSD ceiling; larger values are treated as invalid
pub const DEFAULT_RMSD_CEILING: f64 = 20.0;

/// Thresholds of the outlier policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierPolicy {
    /// KGE values strictly below this are repaired from neighbours
    pub kge_floor: f64,
    /// RMSD values strictly above this are excluded
    pub rmsd_ceiling: f64,
}

impl Default for OutlierPolicy {
    fn default() -> Self {
        Self {
            kge_floor: -1.0,
            rmsd_ceiling: DEFAULT_RMSD_CEILING,
        }
    }
}

/// RMSD of one point
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rmsd {
    Regular(f64),
    /// The radicand was negative (floating-point cancellation). The value is
    /// `-sqrt(|radicand|)`, signed to mark the point.
    Degenerate(f64),
}

impl Rmsd {
    #[must_use]
    pub const fn value(self) -> f64 {
        match self {
            Self::Regular(v) | Self::Degenerate(v) => v,
        }
    }

    #[must_use]
    pub const fn is_degenerate(self) -> bool {
        matches!(self, Self::Degenerate(_))
    }
}

/// RMSD from the two standard deviations and their correlation
#[must_use]
pub fn point_rmsd(std_obs: f64, std_model: f64, correlation: f64) -> Rmsd {
    let radicand = std_obs.powi(2) + std_model.powi(2) - 2.0 * std_obs * std_model * correlation;
    if radicand < 0.0 {
        Rmsd::Degenerate(-radicand.abs().sqrt())
    } else {
        Rmsd::Regular(radicand.sqrt())
    }
}

/// KGE of one grid point
///
/// # Errors
///
/// Returns [`SkillError::DivisionByZero`] when the reference standard deviation or
/// the reference mean is exactly zero.
pub fn point_kge(record: &GridPointRecord) -> Result<f64> {
    if record.std_obs == 0.0 {
        return Err(SkillError::DivisionByZero {
            context: "reference standard deviation is zero".to_string(),
        });
    }
    if record.mean_obs == 0.0 {
        return Err(SkillError::DivisionByZero {
            context: "reference mean is zero".to_string(),
        });
    }

    let r_term = record.correlation - 1.0;
    let variability = record.std_model / record.std_obs - 1.0;
    let bias = record.mean_model / record.mean_obs - 1.0;

    Ok(1.0 - (r_term.powi(2) + variability.powi(2) + bias.powi(2)).sqrt())
}

/// Replaces every value below `floor` with a value derived from its nearest valid
/// neighbours, and returns the indices that were replaced.
///
/// - both neighbours exist: their mean
/// - no valid value follows (e.g. the last point): the previous valid value
/// - no valid value precedes: the next valid value
/// - no valid value at all: `NaN`
///
/// Only raw valid values are used as neighbours, so one repair never feeds
/// another.
pub fn repair_below_floor(values: &mut [f64], floor: f64) -> Vec<usize> {
    let valid: Vec<bool> = values.iter().map(|&v| v.is_finite() && v >= floor).collect();
    let invalid: Vec<usize> = values
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v < floor)
        .map(|(i, _)| i)
        .collect();

    if invalid.is_empty() {
        return invalid;
    }

    let mut previous = vec![None; values.len()];
    let mut last = None;
    for (i, &ok) in valid.iter().enumerate() {
        previous[i] = last;
        if ok {
            last = Some(values[i]);
        }
    }

    let mut next = vec![None; values.len()];
    let mut upcoming = None;
    for (i, &ok) in valid.iter().enumerate().rev() {
        next[i] = upcoming;
        if ok {
            upcoming = Some(values[i]);
        }
    }

    for &i in &invalid {
        values[i] = match (previous[i], next[i]) {
            (Some(p), Some(n)) => (p + n) / 2.0,
            (Some(p), None) => p,
            (None, Some(n)) => n,
            (None, None) => f64::NAN,
        };
    }

    invalid
}

/// Per-point results in table order
#[derive(Debug, Clone, PartialEq)]
pub struct PointStatistics {
    /// KGE after neighbour repair
    pub kge: Array1<f64>,
    /// RMSD; `NaN` where above the ceiling, negative where degenerate
    pub rmsd: Array1<f64>,
    pub repaired: Vec<usize>,
    pub degenerate: Vec<usize>,
    pub rmsd_excluded: usize,
}

/// Field-mean statistics of one grid table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridSummary {
    pub mean_kge: f64,
    pub mean_rmsd: f64,
    pub mean_corr: f64,
    /// Points that took part after dropping incomplete rows
    pub points: usize,
    pub kge_points: usize,
    pub rmsd_points: usize,
    pub dropped_rows: usize,
    pub repaired_points: usize,
    pub degenerate_points: usize,
    pub rmsd_excluded: usize,
    /// Mean reference and model standard deviations, for Taylor diagrams
    pub mean_std_obs: f64,
    pub mean_std_model: f64,
}

/// Computes KGE and RMSD for every point of `table` and applies the outlier policy.
///
/// # Errors
///
/// Returns [`SkillError::DivisionByZero`] naming the first point whose reference
/// standard deviation or mean is zero.
pub fn compute_point_statistics(
    table: &GridTable,
    policy: &OutlierPolicy,
) -> Result<PointStatistics> {
    let n = table.len();
    let mut kge = Vec::with_capacity(n);
    let mut rmsd = Array1::<f64>::from_elem(n, f64::NAN);
    let mut degenerate = Vec::new();
    let mut rmsd_excluded = 0;

    for (i, record) in table.records().enumerate() {
        let value = point_kge(&record).map_err(|e| match e {
            SkillError::DivisionByZero { context } => SkillError::DivisionByZero {
                context: format!(
                    "{} at grid point {} (lon {}, lat {})",
                    context,
                    table.source_rows()[i],
                    record.lon,
                    record.lat
                ),
            },
            other => other,
        })?;
        kge.push(value);

        let point = point_rmsd(record.std_obs, record.std_model, record.correlation);
        if point.is_degenerate() {
            degenerate.push(i);
        }
        if point.value() > policy.rmsd_ceiling {
            rmsd_excluded += 1;
        } else {
            rmsd[i] = point.value();
        }
    }

    let repaired = repair_below_floor(&mut kge, policy.kge_floor);

    if !degenerate.is_empty() {
        warn!(
            points = degenerate.len(),
            "negative RMSD radicand, values carry a negative sign"
        );
    }
    debug!(
        points = n,
        repaired = repaired.len(),
        rmsd_excluded,
        "grid-point statistics computed"
    );

    Ok(PointStatistics {
        kge: Array1::from(kge),
        rmsd,
        repaired,
        degenerate,
        rmsd_excluded,
    })
}

impl PointStatistics {
    /// Field means over the valid points
    #[must_use]
    pub fn summarize(&self, table: &GridTable) -> GridSummary {
        let (mean_kge, kge_points) = nan_mean(self.kge.view());
        let (mean_rmsd, rmsd_points) = nan_mean(self.rmsd.view());
        let (mean_corr, points) = nan_mean(table.correlation.view());

        GridSummary {
            mean_kge,
            mean_rmsd,
            mean_corr,
            points,
            kge_points,
            rmsd_points,
            dropped_rows: table.dropped_rows(),
            repaired_points: self.repaired.len(),
            degenerate_points: self.degenerate.len(),
            rmsd_excluded: self.rmsd_excluded,
            mean_std_obs: nan_mean(table.std_obs.view()).0,
            mean_std_model: nan_mean(table.std_model.view()).0,
        }
    }
}
