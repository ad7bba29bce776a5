//! Statistical metric engine
//!
//! # Organization
//!
//! - [`histogram`]: fixed ten-bin frequency distributions
//! - [`dav`]: Distribution Added Value index from three distributions
//! - [`grid_point`]: per-point KGE and RMSD with the outlier policy
//! - [`operations`]: metric vocabulary and NaN-aware reductions

pub mod dav;
pub mod grid_point;
pub mod histogram;
pub mod operations;

// Re-export the main types and functions for convenience
pub use dav::{dav_index, overlap};
pub use grid_point::{
    compute_point_statistics, point_kge, point_rmsd, repair_below_floor, GridSummary,
    OutlierPolicy, PointStatistics, Rmsd,
};
pub use histogram::{BinEdges, Histogram, BIN_COUNT, STANDARD_EDGES};
pub use operations::{nan_mean, SkillMetric};
