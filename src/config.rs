//! Machine configuration for a compensation run

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Backlash {axis} must be a finite, non-negative distance, got {value}")]
    InvalidBacklash { axis: char, value: f64 },

    #[error("Tolerance must be finite and positive, got {0}")]
    InvalidTolerance(f64),
}

/// Backlash distances (mm) and the comparison epsilon. Immutable for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_backlash_x")]
    pub backlash_x: f64,
    #[serde(default = "default_backlash_y")]
    pub backlash_y: f64,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_backlash_x() -> f64 { 0.202 }
fn default_backlash_y() -> f64 { 0.045 }
fn default_tolerance() -> f64 { 0.005 }

impl Default for Config {
    fn default() -> Self {
        Self {
            backlash_x: default_backlash_x(),
            backlash_y: default_backlash_y(),
            tolerance: default_tolerance(),
        }
    }
}

impl Config {
    pub fn new(backlash_x: f64, backlash_y: f64) -> Self {
        Self {
            backlash_x,
            backlash_y,
            ..Self::default()
        }
    }

    /// Load a JSON config file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (axis, value) in [('X', self.backlash_x), ('Y', self.backlash_y)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidBacklash { axis, value });
            }
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ConfigError::InvalidTolerance(self.tolerance));
        }
        Ok(())
    }
}
