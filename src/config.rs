//! Analysis configuration
//!
//! Everything a run needs is carried by one [`AnalysisConfig`] value passed to the
//! orchestrator. It can be built from defaults, read from a TOML file, and then
//! adjusted from the command line.

use crate::errors::{Result, SkillError};
use crate::parameters::{ClimateParameter, PRECIPITATION_FLOOR};
use crate::statistics::grid_point::{OutlierPolicy, DEFAULT_RMSD_CEILING};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Land-cover experiments analysed by default
pub const DEFAULT_DATASETS: [&str; 5] = ["E2015", "E38", "E", "G", "GC"];

/// Which reference dataset the grid statistics are computed against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceMode {
    /// Observational reference with the strict KGE floor
    #[default]
    Primary,
    /// Alternative reference with the relaxed KGE floor
    Secondary,
    /// Primary reference with the relaxed KGE floor
    Fallback,
}

impl ReferenceMode {
    /// KGE floor used when none is configured explicitly
    #[must_use]
    pub const fn default_kge_floor(self) -> f64 {
        match self {
            Self::Primary => -1.0,
            Self::Secondary | Self::Fallback => -1.5,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ReferenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceMode {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(Self::Primary),
            "secondary" => Ok(Self::Secondary),
            "fallback" => Ok(Self::Fallback),
            other => Err(SkillError::Config(format!(
                "unknown reference mode '{other}', expected primary, secondary or fallback"
            ))),
        }
    }
}

/// Reference dataset names per mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceNames {
    pub primary: String,
    pub secondary: String,
}

impl Default for ReferenceNames {
    fn default() -> Self {
        Self {
            primary: "hyras".to_string(),
            secondary: "GC".to_string(),
        }
    }
}

/// Names of the datasets playing the fixed DAV roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DavRoles {
    /// Low-resolution baseline run
    pub baseline: String,
    /// Observations
    pub observation: String,
}

impl Default for DavRoles {
    fn default() -> Self {
        Self {
            baseline: "GC".to_string(),
            observation: "hyras".to_string(),
        }
    }
}

/// Configuration of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Root folder holding `DATA/` and `DATA_DAV/`
    pub data_root: PathBuf,
    /// Candidate datasets, in reporting order
    pub datasets: Vec<String>,
    pub parameters: Vec<ClimateParameter>,
    pub mode: ReferenceMode,
    pub references: ReferenceNames,
    pub dav: DavRoles,
    /// Overrides the mode's KGE floor
    pub kge_floor: Option<f64>,
    pub rmsd_ceiling: f64,
    pub precipitation_floor: f64,
    /// Keep per-point KGE/RMSD series in the results
    pub keep_point_series: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("."),
            datasets: DEFAULT_DATASETS.iter().map(|s| (*s).to_string()).collect(),
            parameters: ClimateParameter::ALL.to_vec(),
            mode: ReferenceMode::default(),
            references: ReferenceNames::default(),
            dav: DavRoles::default(),
            kge_floor: None,
            rmsd_ceiling: DEFAULT_RMSD_CEILING,
            precipitation_floor: PRECIPITATION_FLOOR,
            keep_point_series: false,
        }
    }
}

impl AnalysisConfig {
    /// Reads a TOML configuration file; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::FileRead`] when the file cannot be read and
    /// [`SkillError::TomlError`] when its content does not deserialize.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| SkillError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses a TOML configuration held in memory.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::TomlError`] on malformed TOML, unknown parameter
    /// names or an unknown mode.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reference dataset selected by the mode
    #[must_use]
    pub fn reference(&self) -> &str {
        match self.mode {
            ReferenceMode::Primary | ReferenceMode::Fallback => &self.references.primary,
            ReferenceMode::Secondary => &self.references.secondary,
        }
    }

    #[must_use]
    pub fn kge_floor(&self) -> f64 {
        self.kge_floor
            .unwrap_or_else(|| self.mode.default_kge_floor())
    }

    #[must_use]
    pub fn outlier_policy(&self) -> OutlierPolicy {
        OutlierPolicy {
            kge_floor: self.kge_floor(),
            rmsd_ceiling: self.rmsd_ceiling,
        }
    }

    /// Checks the configuration before a run.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Config`] for empty dataset or parameter lists, blank
    /// dataset names, non-finite thresholds or a non-positive RMSD ceiling.
    pub fn validate(&self) -> Result<()> {
        if self.datasets.is_empty() {
            return Err(SkillError::Config("no datasets selected".to_string()));
        }
        if let Some(blank) = self.datasets.iter().position(|d| d.trim().is_empty()) {
            return Err(SkillError::Config(format!("dataset #{blank} has an empty name")));
        }
        if self.parameters.is_empty() {
            return Err(SkillError::Config("no parameters selected".to_string()));
        }
        if !(self.rmsd_ceiling.is_finite() && self.rmsd_ceiling > 0.0) {
            return Err(SkillError::Config(format!(
                "RMSD ceiling must be positive, got {}",
                self.rmsd_ceiling
            )));
        }
        if !self.kge_floor().is_finite() {
            return Err(SkillError::Config("KGE floor must be finite".to_string()));
        }
        if !self.precipitation_floor.is_finite() || self.precipitation_floor < 0.0 {
            return Err(SkillError::Config(format!(
                "precipitation floor must be non-negative, got {}",
                self.precipitation_floor
            )));
        }
        if self.reference().trim().is_empty()
            || self.dav.baseline.trim().is_empty()
            || self.dav.observation.trim().is_empty()
        {
            return Err(SkillError::Config(
                "reference and DAV role names must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
