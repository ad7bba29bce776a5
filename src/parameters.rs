//! The climate variables analysed by LuSkill

use crate::errors::{Result, SkillError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Daily precipitation below this amount is treated as a dry day.
pub const PRECIPITATION_FLOOR: f64 = 0.09;

/// Supported climate variables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClimateParameter {
    /// 2 m air temperature, daily mean
    #[serde(rename = "T_2M")]
    T2m,
    /// 2 m air temperature, daily maximum
    #[serde(rename = "TMAX_2M")]
    Tmax2m,
    /// 2 m air temperature, daily minimum
    #[serde(rename = "TMIN_2M")]
    Tmin2m,
    /// Total precipitation
    #[serde(rename = "TOT_PREC")]
    TotPrec,
}

impl ClimateParameter {
    /// All parameters in reporting order
    pub const ALL: [ClimateParameter; 4] = [
        ClimateParameter::T2m,
        ClimateParameter::Tmax2m,
        ClimateParameter::Tmin2m,
        ClimateParameter::TotPrec,
    ];

    /// Name used in file names and reports
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::T2m => "T_2M",
            Self::Tmax2m => "TMAX_2M",
            Self::Tmin2m => "TMIN_2M",
            Self::TotPrec => "TOT_PREC",
        }
    }

    #[must_use]
    pub const fn is_precipitation(self) -> bool {
        matches!(self, Self::TotPrec)
    }
}

impl fmt::Display for ClimateParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClimateParameter {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SkillError::UnknownParameter {
                name: wanted.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("tot_prec".parse::<ClimateParameter>().unwrap(), ClimateParameter::TotPrec);
        assert_eq!(" T_2M ".parse::<ClimateParameter>().unwrap(), ClimateParameter::T2m);
        assert!(matches!(
            "PMSL".parse::<ClimateParameter>(),
            Err(SkillError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn only_precipitation_is_floored() {
        let floored: Vec<_> = ClimateParameter::ALL
            .into_iter()
            .filter(|p| p.is_precipitation())
            .collect();
        assert_eq!(floored, vec![ClimateParameter::TotPrec]);
    }
}
