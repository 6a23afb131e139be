// src/lib.rs

//! Query and aggregation layer for a unified system log dashboard.
//!
//! [`LogQueryEngine`] turns optional filters and a page number into a page of
//! records, whole-table statistics and the distinct values that populate the
//! filter choices. The store (SQLite file or PostgreSQL server) and table are
//! configuration, see [`config::Config`].

pub mod config;
pub mod error;
#[cfg(feature = "logging")]
pub mod logging;
pub mod query;
pub mod store;
pub mod types;

#[cfg(all(test, feature = "sqlite"))]
mod test_utils;

pub use error::{DashError, Result};
pub use query::LogQueryEngine;
pub use types::{
    DashboardView, DistinctValues, FilterCriteria, LogColumn, LogLevel, LogRecord, PageRequest,
    Statistics, StoreType, PAGE_LIMIT,
};

/// Load configuration, install the logger and build an engine.
///
/// With `None` the file is looked up in [`config::Config::default_path`],
/// falling back to `./logdash.toml`. A missing file means defaults.
///
/// # Errors
///
/// Fails on an unreadable or invalid configuration, on a logger that is already
/// installed, or when the configured store type is not compiled in.
#[cfg(feature = "logging")]
pub fn init(config_path: Option<&str>) -> Result<LogQueryEngine> {
    use std::path::PathBuf;

    let path = config_path
        .map(PathBuf::from)
        .or_else(config::Config::default_path)
        .unwrap_or_else(|| PathBuf::from("logdash.toml"));
    logging::init_early_logging()?;
    let config = config::Config::load(&path)?;
    logging::apply_logging_config(&config.logging);
    LogQueryEngine::from_config(&config)
}
