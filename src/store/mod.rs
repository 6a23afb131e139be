//! Read-only access to the relational log store.
//!
//! A [`LogStore`] knows how to reach the store and hands out one
//! [`StoreConnection`] per engine operation. Connections are owned values:
//! dropping one releases it, whichever way the operation ends.

#[cfg(feature = "sqlite")]
pub mod sqlite;
#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::config::validation::redact_url;
use crate::config::StoreConfig;
use crate::error::{DashError, Result};
use crate::query::builder::{Dialect, Statement};
use crate::types::{LogRecord, StoreType};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;

/// A source of fresh, independent store connections.
#[async_trait]
pub trait LogStore: Send + Sync + fmt::Debug {
    /// Placeholder syntax statements for this store must use.
    fn dialect(&self) -> Dialect;

    /// Open a connection for the exclusive use of one operation.
    ///
    /// Fails with [`DashError::StoreUnavailable`].
    async fn acquire(&self) -> Result<Box<dyn StoreConnection>>;
}

/// One open session with the store.
#[async_trait]
pub trait StoreConnection: Send {
    /// Run a read-only statement and collect its rows.
    ///
    /// Fails with [`DashError::QueryFailed`].
    async fn query(&mut self, statement: &Statement) -> Result<RowSet>;
}

/// Column names plus row values, as returned by a statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    /// Result column names in order
    pub columns: Vec<String>,
    /// One value per column for each row
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    /// Map every row to a [`LogRecord`].
    pub fn into_records(self) -> Vec<LogRecord> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|row| LogRecord::from_columns(columns.iter().cloned().zip(row)))
            .collect()
    }

    /// The single count produced by a `SELECT COUNT(..)`.
    pub fn scalar_count(&self) -> Result<u64> {
        let value = self
            .rows
            .first()
            .and_then(|row| row.first())
            .ok_or_else(|| DashError::query_failed("aggregate query returned no rows"))?;
        as_count(value)
    }

    /// `(key, count)` rows as a map. Rows with a null key are dropped.
    pub fn grouped_counts(&self) -> Result<BTreeMap<String, u64>> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            let [key, count] = row.as_slice() else {
                return Err(DashError::query_failed(format!(
                    "grouped count row has {} columns, expected 2",
                    row.len()
                )));
            };
            let Some(key) = as_text(key) else {
                continue;
            };
            counts.insert(key, as_count(count)?);
        }
        Ok(counts)
    }

    /// Non-null values of the first column, in row order.
    pub fn first_column_text(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.first().and_then(as_text))
            .collect()
    }
}

fn as_count(value: &Value) -> Result<u64> {
    value
        .as_u64()
        .ok_or_else(|| DashError::query_failed(format!("expected a non-negative count, got {}", value)))
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Build the store named by `config`.
///
/// Nothing is opened here; connections are made per operation.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn LogStore>> {
    log::info!("Using {} log store at {}", config.store_type, redact_url(&config.url));
    match config.store_type {
        StoreType::Sqlite => sqlite_store(config),
        StoreType::Postgres => postgres_store(config),
    }
}

#[cfg(feature = "sqlite")]
fn sqlite_store(config: &StoreConfig) -> Result<Arc<dyn LogStore>> {
    Ok(Arc::new(SqliteStore::from_config(config)))
}

#[cfg(not(feature = "sqlite"))]
fn sqlite_store(_config: &StoreConfig) -> Result<Arc<dyn LogStore>> {
    Err(DashError::not_supported("built without the `sqlite` feature"))
}

#[cfg(feature = "postgres")]
fn postgres_store(config: &StoreConfig) -> Result<Arc<dyn LogStore>> {
    Ok(Arc::new(PostgresStore::new(config.url.clone())))
}

#[cfg(not(feature = "postgres"))]
fn postgres_store(_config: &StoreConfig) -> Result<Arc<dyn LogStore>> {
    Err(DashError::not_supported("built without the `postgres` feature"))
}
