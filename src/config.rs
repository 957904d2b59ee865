//! TOML-based study configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"study.points"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

/// Top-level study configuration parsed from TOML.
///
/// Describes a two-region convergence study: the horizon, the local and
/// foreign region archives, and the interconnect between them.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudyConfig {
    /// Horizon and pricing parameters.
    #[serde(default)]
    pub study: StudySection,
    /// Local region archive.
    pub local: RegionSection,
    /// Foreign region archive.
    pub foreign: RegionSection,
    /// Interconnect parameters.
    pub interconnect: InterconnectSection,
}

/// Horizon and pricing parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudySection {
    /// Number of points in the horizon (hourly year by default).
    pub points: usize,
    /// Price applied to points with a capacity shortfall.
    pub emergency_price: f64,
    /// Point summarized on stdout after the run.
    pub report_point: usize,
}

impl Default for StudySection {
    fn default() -> Self {
        Self {
            points: 8760,
            emergency_price: 600.0,
            report_point: 0,
        }
    }
}

/// One region archive reference.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionSection {
    /// Path to the archive directory.
    pub archive: PathBuf,
}

/// Interconnect parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterconnectSection {
    /// Link capacity, applied at every point.
    pub capacity: f64,
    /// Optional CSV file with a per-point capacity curve; overrides
    /// `capacity` when set.
    #[serde(default)]
    pub capacity_curve: Option<PathBuf>,
}

impl StudyConfig {
    /// Parses a study from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "study".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a study from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown
    /// fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.study.points == 0 {
            errors.push(ConfigError {
                field: "study.points".into(),
                message: "must be > 0".into(),
            });
        }
        if self.study.report_point >= self.study.points {
            errors.push(ConfigError {
                field: "study.report_point".into(),
                message: "must be < study.points".into(),
            });
        }
        if !self.study.emergency_price.is_finite() || self.study.emergency_price < 0.0 {
            errors.push(ConfigError {
                field: "study.emergency_price".into(),
                message: "must be a finite number >= 0".into(),
            });
        }
        if self.interconnect.capacity < 0.0 {
            errors.push(ConfigError {
                field: "interconnect.capacity".into(),
                message: "must be >= 0".into(),
            });
        }
        if self.local.archive.as_os_str().is_empty() {
            errors.push(ConfigError {
                field: "local.archive".into(),
                message: "must be a directory path".into(),
            });
        }
        if self.foreign.archive.as_os_str().is_empty() {
            errors.push(ConfigError {
                field: "foreign.archive".into(),
                message: "must be a directory path".into(),
            });
        }

        errors
    }
}
