//! Centralized error handling for LuSkill
//!
//! Numeric edge cases that are *policies* rather than failures (a negative RMSD
//! radicand, rows dropped for missing fields) are not represented here; they are
//! counted on the results that produce them.

use std::fmt;
use std::path::PathBuf;

/// Main error type for LuSkill operations
#[derive(Debug)]
pub enum SkillError {
    /// A reference standard deviation, mean or DAV denominator is exactly zero
    DivisionByZero { context: String },

    /// Series or tables expected to align do not
    ShapeMismatch {
        expected: usize,
        actual: usize,
        context: String,
    },

    /// Histogram bin edges are not a strictly ascending set of the required size
    InvalidBinEdges { message: String },

    /// A line of an input file could not be interpreted
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Parameter name outside the supported climate variables
    UnknownParameter { name: String },

    /// Invalid analysis configuration
    Config(String),

    /// I/O operation errors
    IoError(std::io::Error),

    /// An input file could not be read
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON export errors
    JsonError(serde_json::Error),

    /// TOML configuration errors
    TomlError(toml::de::Error),

    /// Generic error for everything else
    Generic(String),
}

impl fmt::Display for SkillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillError::DivisionByZero { context } => write!(f, "Division by zero: {}", context),
            SkillError::ShapeMismatch {
                expected,
                actual,
                context,
            } => write!(
                f,
                "Shape mismatch in {}: expected {} but found {}",
                context, expected, actual
            ),
            SkillError::InvalidBinEdges { message } => write!(f, "Invalid bin edges: {}", message),
            SkillError::Parse {
                path,
                line,
                message,
            } => write!(f, "Parse error in {} at line {}: {}", path.display(), line, message),
            SkillError::UnknownParameter { name } => {
                write!(f, "Unknown climate parameter '{}'", name)
            }
            SkillError::Config(msg) => write!(f, "Configuration error: {}", msg),
            SkillError::IoError(e) => write!(f, "I/O error: {}", e),
            SkillError::FileRead { path, source } => {
                write!(f, "Cannot read {}: {}", path.display(), source)
            }
            SkillError::JsonError(e) => write!(f, "JSON error: {}", e),
            SkillError::TomlError(e) => write!(f, "TOML error: {}", e),
            SkillError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SkillError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SkillError::IoError(e) => Some(e),
            SkillError::FileRead { source, .. } => Some(source),
            SkillError::JsonError(e) => Some(e),
            SkillError::TomlError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SkillError {
    fn from(error: std::io::Error) -> Self {
        SkillError::IoError(error)
    }
}

impl From<serde_json::Error> for SkillError {
    fn from(error: serde_json::Error) -> Self {
        SkillError::JsonError(error)
    }
}

impl From<toml::de::Error> for SkillError {
    fn from(error: toml::de::Error) -> Self {
        SkillError::TomlError(error)
    }
}

impl From<String> for SkillError {
    fn from(error: String) -> Self {
        SkillError::Generic(error)
    }
}

impl From<&str> for SkillError {
    fn from(error: &str) -> Self {
        SkillError::Generic(error.to_string())
    }
}

impl SkillError {
    /// Short machine-readable name of the error kind
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            SkillError::DivisionByZero { .. } => "division_by_zero",
            SkillError::ShapeMismatch { .. } => "shape_mismatch",
            SkillError::InvalidBinEdges { .. } => "invalid_bin_edges",
            SkillError::Parse { .. } => "parse",
            SkillError::UnknownParameter { .. } => "unknown_parameter",
            SkillError::Config(_) => "config",
            SkillError::IoError(_) | SkillError::FileRead { .. } => "io",
            SkillError::JsonError(_) => "json",
            SkillError::TomlError(_) => "toml",
            SkillError::Generic(_) => "generic",
        }
    }
}

/// Result type alias for LuSkill operations
pub type Result<T> = std::result::Result<T, SkillError>;
