use criterion::{black_box, criterion_group, criterion_main, Criterion};
use logdash::query::{Dialect, SelectBuilder, TableName};
use logdash::store::SqliteStore;
use logdash::{FilterCriteria, LogQueryEngine, PAGE_LIMIT};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::runtime::Runtime;

fn seed(path: &Path, rows: usize) {
    let mut conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE system_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT, ip_address TEXT, os_type TEXT,
            log_level TEXT, source TEXT, message TEXT
        )",
    )
    .unwrap();
    let tx = conn.transaction().unwrap();
    {
        let mut insert = tx
            .prepare("INSERT INTO system_logs (timestamp, ip_address, os_type, log_level, source, message) VALUES (?1, ?2, ?3, ?4, ?5, ?6)")
            .unwrap();
        for i in 0..rows {
            insert
                .execute(params![
                    format!("2024-03-{:02} {:02}:{:02}:{:02}", 1 + i / 86_400 % 28, i / 3600 % 24, i / 60 % 60, i % 60),
                    format!("10.0.{}.{}", i % 7, i % 200),
                    if i % 3 == 0 { "windows" } else { "linux" },
                    ["INFO", "WARNING", "ERROR"][i % 3],
                    if i % 2 == 0 { "sshd" } else { "kernel" },
                    format!("event {}", i),
                ])
                .unwrap();
        }
    }
    tx.commit().unwrap();
}

fn fixture() -> (TempDir, LogQueryEngine<SqliteStore>) {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("bench.db");
    seed(&db, 20_000);
    let engine = LogQueryEngine::new(
        Arc::new(SqliteStore::new(&db)),
        TableName::new("system_logs").unwrap(),
    );
    (dir, engine)
}

fn bench_build_statement(c: &mut Criterion) {
    let table = TableName::new("system_logs").unwrap();
    let filters = FilterCriteria::new()
        .with_ip_address("10.0.1")
        .with_os_type("linux")
        .with_source("ss%h");
    c.bench_function("build_filtered_select", |b| {
        b.iter(|| {
            SelectBuilder::rows(black_box(&table))
                .filter(black_box(&filters))
                .limit(1000)
                .offset(2000)
                .build(Dialect::Sqlite)
                .unwrap()
        });
    });
}

fn bench_fetch_page(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (_dir, engine) = fixture();
    let filters = FilterCriteria::new().with_os_type("linux");
    c.bench_function("fetch_page", |b| {
        b.to_async(&rt).iter(|| async {
            engine
                .fetch_page(black_box(&filters), PAGE_LIMIT, black_box(1000))
                .await
                .unwrap()
        });
    });
}

fn bench_compute_statistics(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (_dir, engine) = fixture();
    c.bench_function("compute_statistics", |b| {
        b.to_async(&rt).iter(|| async { engine.compute_statistics().await.unwrap() });
    });
}

criterion_group!(benches, bench_build_statement, bench_fetch_page, bench_compute_statistics);
criterion_main!(benches);
