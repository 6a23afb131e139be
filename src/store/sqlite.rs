//! SQLite backend.
//!
//! Every connection is opened read-only and does its blocking work on the
//! tokio blocking pool. A query whose future is dropped mid-flight is
//! interrupted through the connection's interrupt handle.

use async_trait::async_trait;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, InterruptHandle, OpenFlags};
use serde_json::{Number, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::StoreConfig;
use crate::error::{DashError, Result};
use crate::query::builder::{Dialect, SqlParam, Statement};
use crate::store::{LogStore, RowSet, StoreConnection};

/// A SQLite database file holding the log table.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteStore {
    /// A store for the database at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// A store as described by the `[store]` section.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(&config.url).with_busy_timeout(Duration::from_millis(config.busy_timeout_ms))
    }

    /// How long to wait on a locked database before failing.
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(path: &Path, busy_timeout: Duration) -> Result<Connection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
            | OpenFlags::SQLITE_OPEN_URI;
        let conn = Connection::open_with_flags(path, flags).map_err(|e| {
            DashError::store_unavailable(format!("cannot open {}: {}", path.display(), e))
        })?;
        conn.busy_timeout(busy_timeout).map_err(|e| {
            DashError::store_unavailable(format!("cannot configure {}: {}", path.display(), e))
        })?;
        Ok(conn)
    }
}

#[async_trait]
impl LogStore for SqliteStore {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn acquire(&self) -> Result<Box<dyn StoreConnection>> {
        let path = self.path.clone();
        let busy_timeout = self.busy_timeout;
        let conn = tokio::task::spawn_blocking(move || Self::open(&path, busy_timeout)).await??;
        log::debug!("[SqliteStore] Opened {} read-only", self.path.display());
        Ok(Box::new(SqliteConnection::new(conn)))
    }
}

/// A read-only connection owned by one engine operation.
pub struct SqliteConnection {
    conn: Option<Connection>,
    interrupt: InterruptHandle,
}

impl SqliteConnection {
    fn new(conn: Connection) -> Self {
        let interrupt = conn.get_interrupt_handle();
        Self {
            conn: Some(conn),
            interrupt,
        }
    }
}

/// Interrupts the running statement unless disarmed first.
struct InterruptOnDrop<'a> {
    handle: &'a InterruptHandle,
    armed: bool,
}

impl Drop for InterruptOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            log::debug!("[SqliteStore] Query abandoned, interrupting");
            self.handle.interrupt();
        }
    }
}

#[async_trait]
impl StoreConnection for SqliteConnection {
    async fn query(&mut self, statement: &Statement) -> Result<RowSet> {
        let conn = self
            .conn
            .take()
            .ok_or_else(|| DashError::query_failed("connection was lost by an earlier failed query"))?;
        let statement = statement.clone();

        let mut guard = InterruptOnDrop {
            handle: &self.interrupt,
            armed: true,
        };
        let (conn, result) = tokio::task::spawn_blocking(move || {
            let result = run_statement(&conn, &statement);
            (conn, result)
        })
        .await?;
        guard.armed = false;

        self.conn = Some(conn);
        result
    }
}

fn run_statement(conn: &Connection, statement: &Statement) -> Result<RowSet> {
    let failed = |e: rusqlite::Error| DashError::query_failed(format!("{} ({})", e, statement.sql));

    let mut prepared = conn.prepare(&statement.sql).map_err(failed)?;
    let columns: Vec<String> = prepared.column_names().into_iter().map(String::from).collect();
    let params = rusqlite::params_from_iter(statement.params.iter().map(|param| match param {
        SqlParam::Text(text) => SqlValue::Text(text.clone()),
        SqlParam::Integer(n) => SqlValue::Integer(*n),
    }));

    let mut rows = prepared.query(params).map_err(failed)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(failed)? {
        let mut values = Vec::with_capacity(columns.len());
        for index in 0..columns.len() {
            values.push(to_json(row.get_ref(index).map_err(failed)?));
        }
        out.push(values);
    }

    Ok(RowSet { columns, rows: out })
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::from(n),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(hex::encode(bytes)),
    }
}
