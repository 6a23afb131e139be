// src/test_utils.rs

use rusqlite::{params, Connection};
use std::path::Path;

/// Table layout used by the tests; mirrors the production `system_logs` table.
pub const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS system_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT,
    ip_address TEXT,
    os_type TEXT,
    log_level TEXT,
    source TEXT,
    message TEXT
)";

/// One row to insert. `None` fields are stored as NULL.
#[derive(Debug, Clone, Default)]
pub struct SeedRow {
    pub timestamp: Option<String>,
    pub ip_address: Option<String>,
    pub os_type: Option<String>,
    pub log_level: Option<String>,
    pub source: Option<String>,
}

impl SeedRow {
    pub fn new(timestamp: &str, ip_address: &str, os_type: &str, log_level: &str, source: &str) -> Self {
        Self {
            timestamp: Some(timestamp.to_string()),
            ip_address: Some(ip_address.to_string()),
            os_type: Some(os_type.to_string()),
            log_level: Some(log_level.to_string()),
            source: Some(source.to_string()),
        }
    }
}

/// Creates the database at `path` and inserts `rows` in order.
pub fn seed_database(path: &Path, rows: &[SeedRow]) {
    let mut conn = Connection::open(path).expect("open seed database");
    conn.execute_batch(SCHEMA).expect("create schema");
    let tx = conn.transaction().expect("begin seed transaction");
    {
        let mut insert = tx
            .prepare(
                "INSERT INTO system_logs (timestamp, ip_address, os_type, log_level, source, message)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .expect("prepare insert");
        for (n, row) in rows.iter().enumerate() {
            insert
                .execute(params![
                    row.timestamp,
                    row.ip_address,
                    row.os_type,
                    row.log_level,
                    row.source,
                    format!("event {}", n),
                ])
                .expect("insert seed row");
        }
    }
    tx.commit().expect("commit seed rows");
}
