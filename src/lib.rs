//! LuSkill: skill metrics for land-cover driven regional climate simulations
//!
//! LuSkill compares several candidate simulations, each driven by a different land-cover
//! map, against a reference dataset. For every (dataset, parameter) pair it computes the
//! field-mean Kling-Gupta Efficiency, RMSD and correlation from per-grid-point statistics,
//! and the Distribution Added Value index from daily field-mean series.
//!
//! ## Module Organization
//!
//! - [`statistics`]: histogram binner, DAV index, grid-point KGE/RMSD and reductions
//! - [`series`]: time-indexed series, daily resampling and alignment
//! - [`grid`]: grid-point record tables
//! - [`orchestrator`]: per-pair analysis and full runs with failure recording
//! - [`data_source`]: the seam between file readers and the metric engine
//! - [`io`]: whitespace-delimited file readers and the data layout
//! - [`report`]: text tables, JSON export and Taylor-diagram samples
//! - [`config`]: the analysis configuration
//! - [`errors`]: centralized error handling
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use lu_skill::prelude::*;
//!
//! let config = AnalysisConfig {
//!     data_root: "/data/STAT3".into(),
//!     ..AnalysisConfig::default()
//! };
//! let source = CsvSource::new(config.data_root.clone());
//! let table = MetricOrchestrator::new(config).unwrap().run(&source);
//!
//! for failure in table.failures() {
//!     eprintln!("{failure}");
//! }
//! ```
//!
//! The statistical building blocks can also be used on their own:
//!
//! ```rust
//! use lu_skill::statistics::{dav_index, BinEdges, Histogram};
//!
//! let edges = BinEdges::standard();
//! let obs = Histogram::from_values(&[1.0, 6.0, 12.0, 12.5], &edges);
//! let hr = Histogram::from_values(&[1.5, 6.5, 11.0, 13.0], &edges);
//! let lr = Histogram::from_values(&[-3.0, 6.5, 11.0, 13.0], &edges);
//!
//! let dav = dav_index(hr.counts(), lr.counts(), obs.counts()).unwrap();
//! assert!((dav - 1.0 / 3.0).abs() < 1e-12);
//! ```

// Core modules
pub mod config;
pub mod data_source;
pub mod errors;
pub mod grid;
pub mod io;
pub mod orchestrator;
pub mod parameters;
pub mod report;
pub mod series;
pub mod statistics;

pub mod cli;

// Direct re-exports for the public API
pub use errors::{Result, SkillError};

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::config::{AnalysisConfig, ReferenceMode};
    pub use crate::data_source::{DavSeries, MemorySource, SeriesSource};
    pub use crate::errors::{Result, SkillError};
    pub use crate::grid::{GridPointRecord, GridTable};
    pub use crate::io::CsvSource;
    pub use crate::orchestrator::{MetricOrchestrator, MetricTable, PairOutcome, Stage};
    pub use crate::parameters::ClimateParameter;
    pub use crate::series::TimeSeries;
    pub use crate::statistics::{BinEdges, Histogram, OutlierPolicy, SkillMetric};
}
