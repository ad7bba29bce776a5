//! Data source abstraction between the file layer and the metric engine
//!
//! The orchestrator never touches files directly. It asks a [`SeriesSource`] for
//! the grid fields and DAV series of one (dataset, parameter) pair; the on-disk
//! implementation lives in [`crate::io`], and [`MemorySource`] serves tests and
//! callers that already hold their data in memory.

use crate::errors::{Result, SkillError};
use crate::grid::GridFields;
use crate::parameters::ClimateParameter;
use crate::series::TimeSeries;
use std::collections::HashMap;

/// The three raw series of one variable used for DAV
#[derive(Debug, Clone, PartialEq)]
pub struct DavSeries {
    pub high_res: TimeSeries,
    pub low_res: TimeSeries,
    pub observed: TimeSeries,
}

/// Supplier of input data for one analysis run
pub trait SeriesSource {
    /// Grid fields of `dataset` compared against `reference`
    fn grid_fields(
        &self,
        dataset: &str,
        reference: &str,
        parameter: ClimateParameter,
    ) -> Result<GridFields>;

    /// Field-mean series for DAV: `dataset` as high-res, `baseline` as low-res and
    /// `observation` as observed
    fn dav_series(
        &self,
        dataset: &str,
        baseline: &str,
        observation: &str,
        parameter: ClimateParameter,
    ) -> Result<DavSeries>;
}

/// In-memory [`SeriesSource`] keyed by dataset and parameter
///
/// Lookups ignore the reference and role names; whatever was inserted for the
/// dataset is returned.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    grids: HashMap<(String, ClimateParameter), GridFields>,
    dav: HashMap<(String, ClimateParameter), DavSeries>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_grid(
        &mut self,
        dataset: impl Into<String>,
        parameter: ClimateParameter,
        fields: GridFields,
    ) -> &mut Self {
        self.grids.insert((dataset.into(), parameter), fields);
        self
    }

    pub fn insert_dav(
        &mut self,
        dataset: impl Into<String>,
        parameter: ClimateParameter,
        series: DavSeries,
    ) -> &mut Self {
        self.dav.insert((dataset.into(), parameter), series);
        self
    }
}

impl SeriesSource for MemorySource {
    fn grid_fields(
        &self,
        dataset: &str,
        _reference: &str,
        parameter: ClimateParameter,
    ) -> Result<GridFields> {
        self.grids
            .get(&(dataset.to_string(), parameter))
            .cloned()
            .ok_or_else(|| {
                SkillError::Generic(format!("no grid fields for {dataset}/{parameter}"))
            })
    }

    fn dav_series(
        &self,
        dataset: &str,
        _baseline: &str,
        _observation: &str,
        parameter: ClimateParameter,
    ) -> Result<DavSeries> {
        self.dav
            .get(&(dataset.to_string(), parameter))
            .cloned()
            .ok_or_else(|| SkillError::Generic(format!("no DAV series for {dataset}/{parameter}")))
    }
}
