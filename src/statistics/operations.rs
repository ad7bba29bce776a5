//! Core metric vocabulary and NaN-aware reductions

use ndarray::ArrayView1;
use serde::Serialize;

/// Skill metrics reported per (dataset, parameter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkillMetric {
    /// Kling-Gupta Efficiency
    Kge,
    /// Centred root-mean-square deviation
    Rmsd,
    /// Pearson correlation
    Corr,
    /// Distribution Added Value
    Dav,
}

impl SkillMetric {
    pub const ALL: [SkillMetric; 4] = [Self::Kge, Self::Rmsd, Self::Corr, Self::Dav];

    /// Column header used in reports
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kge => "KGE",
            Self::Rmsd => "RMSD",
            Self::Corr => "CORR",
            Self::Dav => "DAV",
        }
    }
}

/// Mean of the finite values of `data` together with how many took part.
///
/// Returns `(NaN, 0)` when no value is finite.
#[must_use]
pub fn nan_mean(data: ArrayView1<'_, f64>) -> (f64, usize) {
    let mut sum = 0.0_f64;
    let mut count = 0_usize;

    for &value in data.iter() {
        // Skip NaN and infinite values
        if value.is_finite() {
            sum += value;
            count += 1;
        }
    }

    if count > 0 {
        #[allow(clippy::cast_precision_loss)]
        let n = count as f64;
        (sum / n, count)
    } else {
        (f64::NAN, 0)
    }
}
