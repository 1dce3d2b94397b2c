//! Configuration for the moving-average calculator.
//!
//! Values here are defaults; command-line flags override them.

use crate::input::TimeZonePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Output file used when none is given.
pub const OUTPUT_FILENAME: &str = "output.json";

/// Main configuration for the calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where aggregate records are written
    pub output_file: PathBuf,

    /// Time zone for naive input timestamps and output dates
    /// (`local`, `utc`, or an IANA name)
    pub timezone: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from(OUTPUT_FILENAME),
            timezone: TimeZonePolicy::Local.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("delivery-sma")
            .join("config.json")
    }

    /// Resolve the configured time zone.
    pub fn timezone_policy(&self) -> Result<TimeZonePolicy, ConfigError> {
        self.timezone.parse().map_err(ConfigError::Timezone)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{0}")]
    Timezone(String),
}
