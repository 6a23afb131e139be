//! Logger installation.
//!
//! The library itself only talks to the `log` facade; binaries and embedders
//! route records to stderr through `env_logger`. Either call [`init_logging`]
//! once a configuration is at hand, or call [`init_early_logging`] before
//! loading it and [`apply_logging_config`] afterwards, so that warnings raised
//! while reading the configuration are not lost.

use log::LevelFilter;

use crate::config::LoggingConfig;
use crate::error::{DashError, Result};

/// Environment variable holding an `env_logger` filter spec that replaces the
/// configured level, e.g. `LOGDASH_LOG=logdash::store=debug`.
pub const LOG_FILTER_ENV: &str = "LOGDASH_LOG";

/// Level in force between [`init_early_logging`] and [`apply_logging_config`].
pub const EARLY_LEVEL: LevelFilter = LevelFilter::Info;

/// Install the global logger at the configured level.
///
/// # Errors
///
/// Returns [`DashError::InvalidInput`] when a logger is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    install()?;
    apply_logging_config(config);
    Ok(())
}

/// Install the global logger before the configuration is known.
///
/// Records at [`EARLY_LEVEL`] and above are shown until
/// [`apply_logging_config`] narrows or widens the level.
///
/// # Errors
///
/// Returns [`DashError::InvalidInput`] when a logger is already installed.
pub fn init_early_logging() -> Result<()> {
    if !install()? {
        log::set_max_level(EARLY_LEVEL);
    }
    Ok(())
}

/// Switch the installed logger to the configured level.
///
/// Does nothing when [`LOG_FILTER_ENV`] is set; that filter stays in charge.
pub fn apply_logging_config(config: &LoggingConfig) {
    if env_filter_set() {
        return;
    }
    let level = if config.console {
        config.level.to_level_filter()
    } else {
        LevelFilter::Off
    };
    log::set_max_level(level);
}

/// Returns whether the filter came from [`LOG_FILTER_ENV`].
fn install() -> Result<bool> {
    let from_env = env_filter_set();
    let mut builder = env_logger::Builder::new();
    if from_env {
        builder.parse_env(env_logger::Env::new().filter(LOG_FILTER_ENV));
    } else {
        // The global max level does the filtering; see `apply_logging_config`.
        builder.filter_level(LevelFilter::Trace);
    }

    builder
        .format_timestamp_millis()
        .try_init()
        .map_err(|e| DashError::invalid_input(format!("Logger already initialized: {}", e)))?;
    Ok(from_env)
}

fn env_filter_set() -> bool {
    std::env::var_os(LOG_FILTER_ENV).is_some()
}
