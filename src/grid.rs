//! Grid-point record tables
//!
//! A [`GridTable`] is the row-wise join of five per-grid-point fields (reference
//! mean and standard deviation, model mean and standard deviation, correlation).
//!
//! # Ordering
//!
//! Rows keep the order in which they appear in the joined input fields. Rows with
//! any missing field are removed, but the relative order of the remaining rows is
//! never changed. Neighbour repair of KGE values relies on this order.

use crate::errors::{Result, SkillError};
use ndarray::Array1;
use tracing::debug;

/// One scalar field read from a grid file: `(lon, lat, value)` per row, `NaN` missing
#[derive(Debug, Clone, PartialEq)]
pub struct FieldTable {
    pub name: String,
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    pub values: Vec<f64>,
}

impl FieldTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lon: Vec::new(),
            lat: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn push(&mut self, lon: f64, lat: f64, value: f64) {
        self.lon.push(lon);
        self.lat.push(lat);
        self.values.push(value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The five fields that make up a grid-point table, before joining
#[derive(Debug, Clone)]
pub struct GridFields {
    pub mean_obs: FieldTable,
    pub std_obs: FieldTable,
    pub mean_model: FieldTable,
    pub std_model: FieldTable,
    pub correlation: FieldTable,
}

/// A single spatial location with paired statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPointRecord {
    pub lon: f64,
    pub lat: f64,
    pub mean_obs: f64,
    pub std_obs: f64,
    pub mean_model: f64,
    pub std_model: f64,
    pub correlation: f64,
}

impl GridPointRecord {
    /// True when every field carries a value
    #[must_use]
    pub fn is_complete(&self) -> bool {
        [
            self.lon,
            self.lat,
            self.mean_obs,
            self.std_obs,
            self.mean_model,
            self.std_model,
            self.correlation,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Complete grid-point records in stable input order
#[derive(Debug, Clone, PartialEq)]
pub struct GridTable {
    pub lon: Array1<f64>,
    pub lat: Array1<f64>,
    pub mean_obs: Array1<f64>,
    pub std_obs: Array1<f64>,
    pub mean_model: Array1<f64>,
    pub std_model: Array1<f64>,
    pub correlation: Array1<f64>,
    /// Row index of each kept record in the input
    source_rows: Vec<usize>,
    dropped_rows: usize,
}

impl GridTable {
    /// Builds a table from records, dropping every incomplete one.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = GridPointRecord>,
    {
        let mut kept: Vec<GridPointRecord> = Vec::new();
        let mut source_rows = Vec::new();
        let mut dropped_rows = 0;

        for (row, record) in records.into_iter().enumerate() {
            if record.is_complete() {
                kept.push(record);
                source_rows.push(row);
            } else {
                dropped_rows += 1;
            }
        }

        if dropped_rows > 0 {
            debug!(dropped_rows, kept = kept.len(), "dropped incomplete grid points");
        }

        let column = |f: fn(&GridPointRecord) -> f64| kept.iter().map(f).collect::<Array1<f64>>();

        Self {
            lon: column(|r| r.lon),
            lat: column(|r| r.lat),
            mean_obs: column(|r| r.mean_obs),
            std_obs: column(|r| r.std_obs),
            mean_model: column(|r| r.mean_model),
            std_model: column(|r| r.std_model),
            correlation: column(|r| r.correlation),
            source_rows,
            dropped_rows,
        }
    }

    /// Joins five fields row by row. Coordinates are taken from the reference mean.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::ShapeMismatch`] if the fields differ in row count.
    pub fn join(fields: &GridFields) -> Result<Self> {
        let expected = fields.mean_obs.len();
        for other in [
            &fields.std_obs,
            &fields.mean_model,
            &fields.std_model,
            &fields.correlation,
        ] {
            if other.len() != expected {
                return Err(SkillError::ShapeMismatch {
                    expected,
                    actual: other.len(),
                    context: format!(
                        "grid field '{}' against '{}'",
                        other.name, fields.mean_obs.name
                    ),
                });
            }
        }

        let records = (0..expected).map(|i| GridPointRecord {
            lon: fields.mean_obs.lon[i],
            lat: fields.mean_obs.lat[i],
            mean_obs: fields.mean_obs.values[i],
            std_obs: fields.std_obs.values[i],
            mean_model: fields.mean_model.values[i],
            std_model: fields.std_model.values[i],
            correlation: fields.correlation.values[i],
        });

        Ok(Self::from_records(records))
    }

    /// Number of participating grid points
    #[must_use]
    pub fn len(&self) -> usize {
        self.mean_obs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mean_obs.is_empty()
    }

    /// Rows removed because a field was missing
    #[must_use]
    pub const fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    #[must_use]
    pub fn source_rows(&self) -> &[usize] {
        &self.source_rows
    }

    /// Records in table order
    pub fn records(&self) -> impl Iterator<Item = GridPointRecord> + '_ {
        (0..self.len()).filter_map(move |i| self.record(i))
    }

    #[must_use]
    pub fn record(&self, index: usize) -> Option<GridPointRecord> {
        (index < self.len()).then(|| GridPointRecord {
            lon: self.lon[index],
            lat: self.lat[index],
            mean_obs: self.mean_obs[index],
            std_obs: self.std_obs[index],
            mean_model: self.mean_model[index],
            std_model: self.std_model[index],
            correlation: self.correlation[index],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(lon: f64, corr: f64) -> GridPointRecord {
        GridPointRecord {
            lon,
            lat: 50.0,
            mean_obs: 10.0,
            std_obs: 2.0,
            mean_model: 11.0,
            std_model: 2.5,
            correlation: corr,
        }
    }

    fn field(name: &str, values: &[f64]) -> FieldTable {
        let mut t = FieldTable::new(name);
        for (i, &v) in values.iter().enumerate() {
            t.push(6.0 + i as f64, 51.0, v);
        }
        t
    }

    #[test]
    fn dropping_a_row_keeps_relative_order() {
        let table = GridTable::from_records(vec![
            record(1.0, 0.9),
            record(2.0, f64::NAN),
            record(3.0, 0.7),
            record(4.0, 0.6),
        ]);

        assert_eq!(table.len(), 3);
        assert_eq!(table.dropped_rows(), 1);
        assert_eq!(table.lon.to_vec(), vec![1.0, 3.0, 4.0]);
        assert_eq!(table.source_rows(), &[0, 2, 3]);
        assert_eq!(table.record(1).unwrap().correlation, 0.7);
        assert!(table.record(3).is_none());

        let lons: Vec<f64> = table.records().map(|r| r.lon).collect();
        assert_eq!(lons, vec![1.0, 3.0, 4.0]);
    }

    #[test]
    fn join_combines_fields_by_row() {
        let fields = GridFields {
            mean_obs: field("M_obs", &[10.0, 12.0]),
            std_obs: field("S_obs", &[1.0, f64::NAN]),
            mean_model: field("M_mod", &[11.0, 13.0]),
            std_model: field("S_mod", &[1.5, 2.0]),
            correlation: field("P", &[0.8, 0.9]),
        };

        let table = GridTable::join(&fields).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.dropped_rows(), 1);
        let r = table.record(0).unwrap();
        assert_eq!((r.lon, r.mean_obs, r.std_model, r.correlation), (6.0, 10.0, 1.5, 0.8));
    }

    #[test]
    fn join_rejects_fields_of_different_length() {
        let fields = GridFields {
            mean_obs: field("M_obs", &[10.0, 12.0]),
            std_obs: field("S_obs", &[1.0, 1.0]),
            mean_model: field("M_mod", &[11.0]),
            std_model: field("S_mod", &[1.5, 2.0]),
            correlation: field("P", &[0.8, 0.9]),
        };

        match GridTable::join(&fields) {
            Err(SkillError::ShapeMismatch {
                expected, actual, ..
            }) => assert_eq!((expected, actual), (2, 1)),
            other => panic!("expected shape mismatch, got {other:?}"),
        }
    }
}
