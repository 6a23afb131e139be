#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use logdash::query::TableName;
use logdash::store::SqliteStore;
use logdash::LogQueryEngine;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;

pub const TABLE: &str = "system_logs";

/// One row to insert. `None` fields are stored as NULL.
#[derive(Debug, Clone, Default)]
pub struct Row {
    pub timestamp: Option<String>,
    pub ip_address: Option<String>,
    pub os_type: Option<String>,
    pub log_level: Option<String>,
    pub source: Option<String>,
    pub message: Option<String>,
}

impl Row {
    pub fn new(timestamp: &str, ip_address: &str, os_type: &str, log_level: &str, source: &str) -> Self {
        Self {
            timestamp: Some(timestamp.into()),
            ip_address: Some(ip_address.into()),
            os_type: Some(os_type.into()),
            log_level: Some(log_level.into()),
            source: Some(source.into()),
            message: None,
        }
    }
}

pub fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Timestamp `seconds` after the fixed base, in the stored text format.
pub fn ts(seconds: i64) -> String {
    (base_time() + Duration::seconds(seconds))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

pub fn create_table(conn: &Connection) {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS system_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT,
            ip_address TEXT,
            os_type TEXT,
            log_level TEXT,
            source TEXT,
            message TEXT
        )",
    )
    .unwrap();
}

pub fn seed(path: &Path, rows: &[Row]) {
    let mut conn = Connection::open(path).unwrap();
    create_table(&conn);
    let tx = conn.transaction().unwrap();
    {
        let mut insert = tx
            .prepare(
                "INSERT INTO system_logs (timestamp, ip_address, os_type, log_level, source, message)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .unwrap();
        for (n, row) in rows.iter().enumerate() {
            let message = row.message.clone().unwrap_or_else(|| format!("event {}", n));
            insert
                .execute(params![
                    row.timestamp,
                    row.ip_address,
                    row.os_type,
                    row.log_level,
                    row.source,
                    message,
                ])
                .unwrap();
        }
    }
    tx.commit().unwrap();
}

/// 2500 records one second apart: the first 1200 from windows hosts, the
/// rest from linux hosts. Record `i` is stamped `ts(i)`, so the newest is
/// record 2499.
pub fn mixed_fleet() -> Vec<Row> {
    (0..2500i64)
        .map(|i| {
            let (os, ip) = if i < 1200 {
                ("windows", format!("10.0.1.{}", i % 50))
            } else {
                ("linux", format!("192.168.0.{}", i % 40))
            };
            let level = ["INFO", "WARNING", "ERROR"][(i % 3) as usize];
            Row::new(&ts(i), &ip, os, level, if i % 2 == 0 { "sshd" } else { "kernel" })
        })
        .collect()
}

pub fn engine(path: &Path) -> LogQueryEngine<SqliteStore> {
    LogQueryEngine::new(
        Arc::new(SqliteStore::new(path)),
        TableName::new(TABLE).unwrap(),
    )
}
