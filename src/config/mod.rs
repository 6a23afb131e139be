//! Configuration management for logdash
//!
//! This module handles loading, validating, and providing access to the
//! application configuration. Configuration comes from a TOML file, optionally
//! overridden by `LOGDASH_*` environment variables.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod validation;

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod validation_tests;

#[cfg(test)]
#[path = "tests/config_mod_tests.rs"]
mod config_mod_tests;

use std::{
    env,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use directories::ProjectDirs;

use serde::{Deserialize, Serialize};

use crate::{LogLevel, StoreType};

/// Re-export the error type
pub use error::ConfigError;

/// The environment variable prefix for configuration overrides
const ENV_PREFIX: &str = "LOGDASH_";

/// The application name used for finding config directories
const APP_NAME: &str = "logdash";

/// Main configuration structure.
///
/// # Example
///
/// ```no_run
/// use logdash::config::Config;
///
/// // A missing file falls back to defaults.
/// let config = Config::load("logdash.toml").unwrap();
/// assert_eq!(config.store.table, "system_logs");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where the log table lives
    pub store: StoreConfig,

    /// Query execution settings
    pub query: QueryConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Store type
    #[serde(rename = "type")]
    pub store_type: StoreType,
    /// Database file path for SQLite, connection string for PostgreSQL
    pub url: String,
    /// Name of the log table
    pub table: String,
    /// How long SQLite waits on a locked database before failing, in milliseconds
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::Sqlite,
            url: "system_logs.db".to_string(),
            table: "system_logs".to_string(),
            busy_timeout_ms: 5000,
        }
    }
}

/// Query execution configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryConfig {
    /// Upper bound for one engine operation, in milliseconds. Unset means unbounded.
    pub timeout_ms: Option<u64>,
}

impl QueryConfig {
    /// The configured operation timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
    /// Whether to log to the console (stderr)
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            console: true,
        }
    }
}

impl Config {
    /// Loads the configuration from the specified path.
    ///
    /// A missing file yields the defaults. In both cases `LOGDASH_*`
    /// environment variables are applied afterwards and the result is validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or if
    /// the resulting configuration is invalid.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let mut config = match fs::read_to_string(path) {
            Ok(config_str) => toml::from_str::<Config>(&config_str)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Config file not found at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => return Err(e.into()),
        };

        config.apply_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    ///
    /// Recognised variables: `LOGDASH_STORE_TYPE`, `LOGDASH_STORE_URL`,
    /// `LOGDASH_STORE_TABLE`, `LOGDASH_QUERY_TIMEOUT_MS` and
    /// `LOGDASH_LOGGING_LEVEL`. Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if any recognised variable cannot be parsed.
    pub fn apply_env_vars(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(env::vars())
    }

    /// Applies `(name, value)` overrides using the environment variable naming.
    pub fn apply_overrides<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(stripped) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            match stripped.to_lowercase().as_str() {
                "store_type" => {
                    self.store.store_type = value.parse().map_err(|_| {
                        ConfigError::invalid_value("store.type", value, "Invalid store type")
                    })?;
                }
                "store_url" => self.store.url = value.to_string(),
                "store_table" => self.store.table = value.to_string(),
                "query_timeout_ms" => {
                    let ms = value.parse::<u64>().map_err(|_| {
                        ConfigError::invalid_value("query.timeout_ms", value, "Expected milliseconds")
                    })?;
                    self.query.timeout_ms = Some(ms);
                }
                "logging_level" => {
                    self.logging.level = value.parse().map_err(|_| {
                        ConfigError::invalid_value("logging.level", value, "Invalid log level")
                    })?;
                }
                other => log::debug!("Ignoring unknown override {}{}", ENV_PREFIX, other.to_uppercase()),
            }
        }

        Ok(())
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_config(self)
    }

    /// Serializes the configuration back to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Returns the path to the directory where configuration files should be stored.
    ///
    /// This is OS-specific:
    /// - Linux: `$HOME/.config/logdash`
    /// - macOS: `$HOME/Library/Application Support/org.logdash.logdash`
    /// - Windows: `%APPDATA%\\logdash\\logdash\\config`
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("org", APP_NAME, APP_NAME)
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
    }

    /// `config.toml` inside [`Config::config_dir`].
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }
}
