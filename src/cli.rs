//! Defines command-line interface options using `clap` for the LuSkill application.

use crate::config::{AnalysisConfig, ReferenceMode};
use crate::errors::Result;
use crate::parameters::ClimateParameter;
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

/// Skill metrics of land-cover experiments against a reference dataset
#[derive(Parser, Debug)]
#[command(
    version,
    name = "LuSkill",
    about = "KGE, RMSD, correlation and DAV for land-cover driven climate simulations"
)]
pub struct Args {
    /// Root folder holding DATA/ and DATA_DAV/
    #[arg(short = 'd', long)]
    pub data_root: Option<PathBuf>,

    /// TOML configuration file; command-line options override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Dataset to analyse (repeatable). Defaults to the configured list.
    #[arg(long = "dataset")]
    pub datasets: Vec<String>,

    /// Parameter to analyse (repeatable): T_2M, TMAX_2M, TMIN_2M, TOT_PREC
    #[arg(short, long = "parameter", value_parser = parse_parameter)]
    pub parameters: Vec<ClimateParameter>,

    /// Reference selection: primary, secondary or fallback
    #[arg(short, long, value_parser = parse_mode)]
    pub mode: Option<ReferenceMode>,

    /// KGE values below this are repaired from their neighbours
    #[arg(long, allow_hyphen_values = true)]
    pub kge_floor: Option<f64>,

    /// RMSD values above this are excluded
    #[arg(long)]
    pub rmsd_ceiling: Option<f64>,

    /// Keep per-point KGE and RMSD series in the JSON output
    #[arg(long, default_value_t = false)]
    pub point_series: bool,

    /// Path to save all results as JSON
    #[arg(long)]
    pub output_json: Option<PathBuf>,

    /// Path to save Taylor-diagram samples as JSON
    #[arg(long)]
    pub taylor_json: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Log level: error, warn, info, debug or trace
    #[arg(long, default_value = "info", value_parser = parse_level)]
    pub log_level: Level,
}

fn parse_parameter(s: &str) -> std::result::Result<ClimateParameter, String> {
    s.parse().map_err(|e: crate::errors::SkillError| e.to_string())
}

fn parse_mode(s: &str) -> std::result::Result<ReferenceMode, String> {
    s.parse().map_err(|e: crate::errors::SkillError| e.to_string())
}

fn parse_level(s: &str) -> std::result::Result<Level, String> {
    s.parse()
        .map_err(|_| format!("invalid log level '{s}', expected error, warn, info, debug or trace"))
}

impl Args {
    /// Level for the log subscriber; `--verbose` forces debug.
    #[must_use]
    pub fn max_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else {
            self.log_level
        }
    }

    /// Builds the run configuration: defaults, then the TOML file, then flags.
    pub fn to_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_toml_file(path)?,
            None => AnalysisConfig::default(),
        };

        if let Some(root) = &self.data_root {
            config.data_root = root.clone();
        }
        if !self.datasets.is_empty() {
            config.datasets = self.datasets.clone();
        }
        if !self.parameters.is_empty() {
            config.parameters = self.parameters.clone();
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if self.kge_floor.is_some() {
            config.kge_floor = self.kge_floor;
        }
        if let Some(ceiling) = self.rmsd_ceiling {
            config.rmsd_ceiling = ceiling;
        }
        if self.point_series {
            config.keep_point_series = true;
        }

        config.validate()?;
        Ok(config)
    }
}
