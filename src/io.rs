//! Readers for the whitespace-delimited input files and the on-disk data layout
//!
//! Two file families are read:
//!
//! - **field files**, one scalar statistic per grid point. Rows carry
//!   `lon lat value` as their first three tokens; header lines start with `#` or
//!   with a non-numeric token.
//! - **daily timeseries files** without header: `index date time value`.

use crate::data_source::{DavSeries, SeriesSource};
use crate::errors::{Result, SkillError};
use crate::grid::{FieldTable, GridFields};
use crate::parameters::ClimateParameter;
use crate::series::TimeSeries;
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Value tokens that mark a missing grid-point statistic
pub const MISSING_TOKENS: [&str; 5] = ["-999", "-1", "***", "******", "9990"];

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

fn is_missing_token(token: &str) -> bool {
    MISSING_TOKENS.contains(&token)
}

/// Missing tokens and anything that is not a finite number become `NaN`.
fn value_or_missing(token: &str) -> f64 {
    if is_missing_token(token) {
        return f64::NAN;
    }
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(f64::NAN)
}

/// Parses a field file held in memory. `path` is only used in error messages.
pub fn parse_field_table(text: &str, name: &str, path: &Path) -> Result<FieldTable> {
    let mut table = FieldTable::new(name);

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let first = tokens[0];
        if first.parse::<f64>().is_err() && !is_missing_token(first) {
            // header row
            continue;
        }
        if tokens.len() < 3 {
            return Err(SkillError::Parse {
                path: path.to_path_buf(),
                line: index + 1,
                message: format!("expected 'lon lat value', found {} column(s)", tokens.len()),
            });
        }

        table.push(
            value_or_missing(tokens[0]),
            value_or_missing(tokens[1]),
            value_or_missing(tokens[2]),
        );
    }

    Ok(table)
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| SkillError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a grid-point field file.
pub fn read_field_table(path: &Path, name: &str) -> Result<FieldTable> {
    let text = read_text(path)?;
    let table = parse_field_table(&text, name, path)?;
    debug!(path = %path.display(), rows = table.len(), "read field table");
    Ok(table)
}

fn parse_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    let joined = format!("{date} {time}");
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&joined, fmt).ok())
}

/// Parses a daily timeseries file held in memory.
pub fn parse_time_series(text: &str, name: &str, path: &Path) -> Result<TimeSeries> {
    let mut points = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 4 {
            return Err(SkillError::Parse {
                path: path.to_path_buf(),
                line: index + 1,
                message: format!(
                    "expected 'index date time value', found {} column(s)",
                    tokens.len()
                ),
            });
        }

        let stamp = parse_timestamp(tokens[1], tokens[2]).ok_or_else(|| SkillError::Parse {
            path: path.to_path_buf(),
            line: index + 1,
            message: format!("invalid timestamp '{} {}'", tokens[1], tokens[2]),
        })?;
        let value = tokens[3]
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(f64::NAN);

        points.push((stamp, value));
    }

    Ok(TimeSeries::new(name, points))
}

/// Reads a daily timeseries file.
pub fn read_time_series(path: &Path, name: &str) -> Result<TimeSeries> {
    let text = read_text(path)?;
    let series = parse_time_series(&text, name, path)?;
    debug!(path = %path.display(), points = series.len(), "read time series");
    Ok(series)
}

/// Paths of the five grid field files of one (dataset, parameter)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridPaths {
    pub mean_obs: PathBuf,
    pub std_obs: PathBuf,
    pub mean_model: PathBuf,
    pub std_model: PathBuf,
    pub correlation: PathBuf,
}

/// Paths of the three DAV series of one (dataset, parameter)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavPaths {
    pub high_res: PathBuf,
    pub low_res: PathBuf,
    pub observed: PathBuf,
}

/// File naming convention under the data root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn grid_paths(
        &self,
        dataset: &str,
        reference: &str,
        parameter: ClimateParameter,
    ) -> GridPaths {
        let reference_dir = self.root.join("DATA").join("REFERENCE");
        let dataset_dir = self.root.join("DATA").join(dataset);
        let par = parameter.as_str();

        GridPaths {
            mean_obs: reference_dir.join(format!("LU_{reference}_{par}_mean_obs.csv")),
            std_obs: reference_dir.join(format!("LU_{reference}_{par}_std_obs.csv")),
            mean_model: dataset_dir.join(format!("LU_{dataset}_{par}_mean_mod.csv")),
            std_model: dataset_dir.join(format!("LU_{dataset}_{par}_std_mod.csv")),
            correlation: dataset_dir.join(format!("Corr_{reference}_LU_{dataset}_{par}.csv")),
        }
    }

    #[must_use]
    pub fn dav_paths(
        &self,
        dataset: &str,
        baseline: &str,
        observation: &str,
        parameter: ClimateParameter,
    ) -> DavPaths {
        let dav_dir = self.root.join("DATA_DAV");
        let par = parameter.as_str();

        DavPaths {
            high_res: dav_dir
                .join(dataset)
                .join(format!("LU_{dataset}_{par}_fldmean_mod.csv")),
            low_res: dav_dir
                .join(baseline)
                .join(format!("LU_{baseline}_{par}_fldmean_mod.csv")),
            observed: dav_dir
                .join(observation.to_uppercase())
                .join(format!("{observation}_{par}_mean.csv")),
        }
    }
}

/// [`SeriesSource`] reading the on-disk layout
#[derive(Debug, Clone)]
pub struct CsvSource {
    layout: DataLayout,
}

impl CsvSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: DataLayout::new(root),
        }
    }

    #[must_use]
    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }
}

impl SeriesSource for CsvSource {
    fn grid_fields(
        &self,
        dataset: &str,
        reference: &str,
        parameter: ClimateParameter,
    ) -> Result<GridFields> {
        let paths = self.layout.grid_paths(dataset, reference, parameter);
        Ok(GridFields {
            mean_obs: read_field_table(&paths.mean_obs, "M_obs")?,
            std_obs: read_field_table(&paths.std_obs, "S_obs")?,
            mean_model: read_field_table(&paths.mean_model, "M_mod")?,
            std_model: read_field_table(&paths.std_model, "S_mod")?,
            correlation: read_field_table(&paths.correlation, "P")?,
        })
    }

    fn dav_series(
        &self,
        dataset: &str,
        baseline: &str,
        observation: &str,
        parameter: ClimateParameter,
    ) -> Result<DavSeries> {
        let paths = self.layout.dav_paths(dataset, baseline, observation, parameter);
        let name = parameter.as_str();
        Ok(DavSeries {
            high_res: read_time_series(&paths.high_res, name)?,
            low_res: read_time_series(&paths.low_res, name)?,
            observed: read_time_series(&paths.observed, name)?,
        })
    }
}
