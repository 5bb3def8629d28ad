//! Tool settings: TOML file with environment variable overrides.
//!
//! Read from `motionlight.toml` in the working directory unless another path
//! is given. Every field has a default so the file is optional. Environment
//! variables take precedence over file values.

use std::path::Path;

use motionlight_app::report::{SortOrder, UNASSIGNED};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Default settings file name.
pub const DEFAULT_PATH: &str = "motionlight.toml";

/// Top-level tool settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub report: ReportConfig,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Report rendering.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Shown in the rule column for uncovered combinations.
    pub unassigned_label: String,
    /// Row order of single-binding truth tables.
    pub sort: SortOrder,
}

impl Config {
    /// Load settings from `path` (if present) then apply environment-variable
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is malformed, or if the
    /// resulting settings are invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MOTIONLIGHT_UNASSIGNED_LABEL") {
            self.report.unassigned_label = val;
        }
        if let Ok(val) = std::env::var("MOTIONLIGHT_SORT") {
            if let Some(sort) = parse_sort(&val) {
                self.report.sort = sort;
            }
        }
        if let Ok(val) = std::env::var("MOTIONLIGHT_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.report.unassigned_label.trim().is_empty() {
            return Err(ConfigError::Validation(
                "report.unassigned_label must not be empty".to_string(),
            ));
        }
        self.env_filter()?;
        Ok(())
    }

    /// Build the tracing filter from `logging.filter`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when the directive does not parse.
    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        EnvFilter::try_new(&self.logging.filter).map_err(|err| {
            ConfigError::Validation(format!("invalid logging.filter '{}': {err}", self.logging.filter))
        })
    }
}

fn parse_sort(value: &str) -> Option<SortOrder> {
    match value {
        "room" => Some(SortOrder::Room),
        "occupancy" => Some(SortOrder::Occupancy),
        "enumeration" => Some(SortOrder::Enumeration),
        _ => None,
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "motionlightctl=info,motionlight_app=warn".to_string(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            unassigned_label: UNASSIGNED.to_string(),
            sort: SortOrder::default(),
        }
    }
}

/// Settings errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse settings file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read settings file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid settings: {0}")]
    Validation(String),
}
