//! Distribution Added Value index
//!
//! Soares and Cardoso (2017): the overlap of a simulated distribution with the
//! observed one is the sum of the bin-wise minima. DAV is the relative gain in
//! overlap of the high-resolution simulation over the low-resolution one.

use crate::errors::{Result, SkillError};
use tracing::debug;

/// Sum of bin-wise minima of two distributions
///
/// # Errors
///
/// Returns [`SkillError::ShapeMismatch`] if the distributions differ in length.
pub fn overlap(model: &[u64], observed: &[u64]) -> Result<u64> {
    if model.len() != observed.len() {
        return Err(SkillError::ShapeMismatch {
            expected: observed.len(),
            actual: model.len(),
            context: "distribution overlap".to_string(),
        });
    }
    Ok(model.iter().zip(observed).map(|(&m, &o)| m.min(o)).sum())
}

/// Computes `DAV = (s_hr - s_lr) / s_lr`.
///
/// Negative values mean the low-resolution simulation matches the observed
/// distribution better.
///
/// # Errors
///
/// - [`SkillError::ShapeMismatch`] if the three distributions differ in length
/// - [`SkillError::DivisionByZero`] if the low-resolution overlap is zero
pub fn dav_index(high_res: &[u64], low_res: &[u64], observed: &[u64]) -> Result<f64> {
    if high_res.len() != low_res.len() {
        return Err(SkillError::ShapeMismatch {
            expected: high_res.len(),
            actual: low_res.len(),
            context: "DAV low-res distribution".to_string(),
        });
    }

    let s_hr = overlap(high_res, observed)?;
    let s_lr = overlap(low_res, observed)?;
    debug!(s_hr, s_lr, "DAV overlaps");

    if s_lr == 0 {
        return Err(SkillError::DivisionByZero {
            context: "DAV low-res overlap with observations is zero".to_string(),
        });
    }

    #[allow(clippy::cast_precision_loss)]
    let (s_hr, s_lr) = (s_hr as f64, s_lr as f64);
    Ok((s_hr - s_lr) / s_lr)
}
