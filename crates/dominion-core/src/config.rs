//! Configuration loading for the Dominion engine.
//!
//! The canonical configuration lives in `dominion-config.yaml` at the
//! project root. This module defines typed structs mirroring the YAML
//! and a loader that reads and validates the file. Every field has a
//! default, so an empty file yields a runnable configuration.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (name, base tick interval).
    #[serde(default)]
    pub world: WorldConfig,

    /// Simulation boundary parameters.
    #[serde(default)]
    pub bounds: RunBoundsConfig,

    /// Territories seeded at startup.
    #[serde(default)]
    pub territories: Vec<TerritorySeed>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yml::from_str(&contents)?)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable simulation name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Real-time milliseconds per tick at `Normal` speed. Faster
    /// speeds divide this interval.
    #[serde(default = "default_base_tick_interval_ms")]
    pub base_tick_interval_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            base_tick_interval_ms: default_base_tick_interval_ms(),
        }
    }
}

/// Simulation boundary parameters. Zero means unlimited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RunBoundsConfig {
    /// Stop after this many executed ticks (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Stop after this many wall-clock seconds (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

/// One territory to create at startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TerritorySeed {
    /// Display name.
    pub name: String,

    /// Starting population.
    #[serde(default = "default_population")]
    pub population: u64,

    /// Starting education level in `[0, 100]`.
    #[serde(default = "default_education_level")]
    pub education_level: f64,

    /// Starting militarism in `[0, 100]`.
    #[serde(default = "default_militarism")]
    pub militarism: f64,

    /// Starting wealth.
    #[serde(default)]
    pub wealth: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (`trace`, `debug`, `info`, `warn`, `error`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON-structured logs instead of human-readable ones.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_world_name() -> String {
    "dominion".to_owned()
}

const fn default_base_tick_interval_ms() -> u64 {
    1000
}

const fn default_population() -> u64 {
    1000
}

const fn default_education_level() -> f64 {
    10.0
}

const fn default_militarism() -> f64 {
    50.0
}

fn default_log_level() -> String {
    "info".to_owned()
}
