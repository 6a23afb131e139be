//! Configuration validation for logdash
//!
//! This module contains functions for validating the application configuration
//! to ensure all values are within acceptable ranges and consistent with each other.

use super::error::ConfigError;
use super::{Config, LoggingConfig, QueryConfig, StoreConfig};
use crate::StoreType;

/// Longest table name accepted; matches the PostgreSQL identifier limit.
const MAX_TABLE_NAME_LEN: usize = 63;

/// Validates the application configuration.
///
/// # Errors
///
/// Returns a `ConfigError` if any validation check fails.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    validate_store_config(&config.store)?;
    validate_query_config(&config.query)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Checks that `name` can be written into SQL as a table identifier.
///
/// Identifiers cannot be bound as parameters, so only plain ASCII names are accepted.
pub fn validate_table_name(name: &str) -> Result<(), ConfigError> {
    let mut chars = name.chars();
    let starts_well = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if !starts_well || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ConfigError::invalid_value(
            "store.table",
            name,
            "Table name must start with a letter or underscore and contain only letters, digits and underscores",
        ));
    }
    if name.len() > MAX_TABLE_NAME_LEN {
        return Err(ConfigError::invalid_value(
            "store.table",
            name,
            format!("Table name must be at most {} characters", MAX_TABLE_NAME_LEN),
        ));
    }
    Ok(())
}

/// Validates the store configuration.
fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if config.url.trim().is_empty() {
        return Err(ConfigError::missing_value("store.url"));
    }

    validate_table_name(&config.table)?;

    match config.store_type {
        StoreType::Postgres => validate_postgres_url(&config.url)?,
        StoreType::Sqlite => {
            if config.busy_timeout_ms == 0 {
                log::warn!("store.busy_timeout_ms is 0; reads fail immediately while the database is locked");
            }
        }
    }

    Ok(())
}

/// Checks a `postgres://` / `postgresql://` connection string names a server.
///
/// The host may come from the authority or from a `host` query parameter
/// (e.g. a socket directory).
fn validate_postgres_url(raw: &str) -> Result<(), ConfigError> {
    let url = url::Url::parse(raw).map_err(|e| {
        ConfigError::invalid_value(
            "store.url",
            "<unparseable connection string>",
            format!("Invalid URL format: {}", e),
        )
    })?;

    if !matches!(url.scheme(), "postgres" | "postgresql") {
        return Err(ConfigError::invalid_value(
            "store.url",
            redact_url(raw),
            "PostgreSQL connection strings must use the postgres:// or postgresql:// scheme",
        ));
    }

    let has_host = url.host_str().is_some_and(|host| !host.is_empty())
        || url
            .query_pairs()
            .any(|(key, value)| key == "host" && !value.is_empty());
    if !has_host {
        return Err(ConfigError::invalid_value(
            "store.url",
            redact_url(raw),
            "PostgreSQL connection strings must name a host",
        ));
    }

    Ok(())
}

/// A connection string safe to log: passwords in the authority or in a
/// `password` query parameter are masked. Strings carrying no password, such
/// as SQLite file paths, are returned unchanged.
pub fn redact_url(raw: &str) -> String {
    let Ok(mut url) = url::Url::parse(raw) else {
        return raw.to_string();
    };
    let query_password = url.query_pairs().any(|(key, _)| key == "password");
    if url.password().is_none() && !query_password {
        return raw.to_string();
    }

    if url.password().is_some() {
        // Only fails for URLs without a host, which cannot carry a password.
        let _ = url.set_password(Some("***"));
    }

    if query_password {
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(key, value)| {
                let value = if key == "password" { "***".to_string() } else { value.into_owned() };
                (key.into_owned(), value)
            })
            .collect();
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }

    url.to_string()
}

/// Validates the query configuration.
fn validate_query_config(config: &QueryConfig) -> Result<(), ConfigError> {
    if config.timeout_ms == Some(0) {
        return Err(ConfigError::invalid_value(
            "query.timeout_ms",
            0,
            "timeout_ms must be greater than 0; leave it unset for no timeout",
        ));
    }
    Ok(())
}

/// Validates the logging configuration.
fn validate_logging_config(config: &LoggingConfig) -> Result<(), ConfigError> {
    if !config.console {
        log::warn!("Console logging is disabled. No logs will be captured.");
    }
    Ok(())
}
