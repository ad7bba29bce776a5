//! Time-indexed series and their daily, aligned form used for DAV analysis
//!
//! Raw series come from the I/O layer with arbitrary sub-daily timestamps. They are
//! resampled to calendar days (mean of the finite samples of each day, `NaN` for days
//! without any) and the three series of one variable are then aligned into a
//! [`DailyFrame`]. Alignment never shifts or pads: the daily indices must already be
//! identical, otherwise the frame is rejected with [`SkillError::ShapeMismatch`].

use crate::errors::{Result, SkillError};
use crate::parameters::ClimateParameter;
use crate::statistics::histogram::{BinEdges, Histogram};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Ordered `(timestamp, value)` pairs; `NaN` marks a missing value
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub name: String,
    pub points: Vec<(NaiveDateTime, f64)>,
}

impl TimeSeries {
    pub fn new(name: impl Into<String>, points: Vec<(NaiveDateTime, f64)>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Resamples to one value per calendar day.
    ///
    /// Each day holds the mean of its finite samples. Days between the first and the
    /// last observed day that carry no finite sample become `NaN`.
    #[must_use]
    pub fn resample_daily(&self) -> DailySeries {
        let mut days: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();
        for &(stamp, value) in &self.points {
            let entry = days.entry(stamp.date()).or_insert((0.0, 0));
            if value.is_finite() {
                entry.0 += value;
                entry.1 += 1;
            }
        }

        let (Some(&start), Some(&end)) = (days.keys().next(), days.keys().next_back()) else {
            return DailySeries {
                name: self.name.clone(),
                start: None,
                values: Vec::new(),
            };
        };

        let span = (end - start).num_days() + 1;
        let values = (0..span)
            .map(|offset| {
                let day = start + Duration::days(offset);
                match days.get(&day) {
                    Some(&(sum, count)) if count > 0 => sum / f64::from(count),
                    _ => f64::NAN,
                }
            })
            .collect();

        DailySeries {
            name: self.name.clone(),
            start: Some(start),
            values,
        }
    }
}

/// A gap-free daily series starting at `start`
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    pub name: String,
    pub start: Option<NaiveDate>,
    pub values: Vec<f64>,
}

impl DailySeries {
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn end(&self) -> Option<NaiveDate> {
        let last = i64::try_from(self.values.len()).ok()? - 1;
        self.start.map(|s| s + Duration::days(last))
    }

    /// Number of finite values
    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_finite()).count()
    }
}

/// Role a dataset plays in the DAV comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetRole {
    /// Candidate high-resolution simulation
    HighRes,
    /// Baseline low-resolution simulation
    LowRes,
    /// Observations
    Observed,
}

impl DatasetRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HighRes => "high-res",
            Self::LowRes => "low-res",
            Self::Observed => "observed",
        }
    }
}

impl fmt::Display for DatasetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three daily series of one variable on a common daily index
#[derive(Debug, Clone, PartialEq)]
pub struct DailyFrame {
    pub parameter: ClimateParameter,
    pub start: Option<NaiveDate>,
    high_res: Vec<f64>,
    low_res: Vec<f64>,
    observed: Vec<f64>,
}

impl DailyFrame {
    /// Aligns three daily series.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::ShapeMismatch`] when the series do not share the same
    /// first day and length.
    pub fn align(
        parameter: ClimateParameter,
        high_res: DailySeries,
        low_res: DailySeries,
        observed: DailySeries,
    ) -> Result<Self> {
        for (role, other) in [(DatasetRole::LowRes, &low_res), (DatasetRole::Observed, &observed)] {
            if other.len() != high_res.len() {
                return Err(SkillError::ShapeMismatch {
                    expected: high_res.len(),
                    actual: other.len(),
                    context: format!("{parameter} daily index of the {role} series"),
                });
            }
            if other.start != high_res.start {
                let offset = match (high_res.start, other.start) {
                    (Some(a), Some(b)) => usize::try_from((b - a).num_days().unsigned_abs())
                        .unwrap_or(usize::MAX),
                    _ => usize::MAX,
                };
                return Err(SkillError::ShapeMismatch {
                    expected: 0,
                    actual: offset,
                    context: format!(
                        "{parameter} day offset of the {role} series (starts on {}, high-res on {})",
                        fmt_start(other.start),
                        fmt_start(high_res.start)
                    ),
                });
            }
        }

        Ok(Self {
            parameter,
            start: high_res.start,
            high_res: high_res.values,
            low_res: low_res.values,
            observed: observed.values,
        })
    }

    /// Clamps precipitation below `floor` to zero in every column; other variables
    /// are left untouched.
    pub fn apply_precipitation_floor(&mut self, floor: f64) {
        if !self.parameter.is_precipitation() {
            return;
        }
        for column in [&mut self.high_res, &mut self.low_res, &mut self.observed] {
            clamp_below(column, floor);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.high_res.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.high_res.is_empty()
    }

    #[must_use]
    pub fn column(&self, role: DatasetRole) -> &[f64] {
        match role {
            DatasetRole::HighRes => &self.high_res,
            DatasetRole::LowRes => &self.low_res,
            DatasetRole::Observed => &self.observed,
        }
    }

    /// Bins the requested column, and only that column.
    pub fn histogram(&self, role: DatasetRole, edges: &BinEdges) -> Histogram {
        Histogram::from_values(self.column(role), edges)
    }
}

fn fmt_start(start: Option<NaiveDate>) -> String {
    start.map_or_else(|| "no day".to_string(), |d| d.to_string())
}

/// Sets every value below `floor` to zero. Missing values stay missing.
fn clamp_below(values: &mut [f64], floor: f64) {
    for value in values {
        if *value < floor {
            *value = 0.0;
        }
    }
}
