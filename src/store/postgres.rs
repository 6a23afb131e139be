//! PostgreSQL backend.
//!
//! Each operation opens its own client; the connection driver runs as a
//! spawned task and ends when the client is dropped.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Number, Value};
use std::net::IpAddr;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{Client, NoTls, Row};

use crate::config::validation::redact_url;
use crate::error::{DashError, Result};
use crate::query::builder::{Dialect, SqlParam, Statement};
use crate::store::{LogStore, RowSet, StoreConnection};

/// A PostgreSQL database reached through a connection string.
#[derive(Clone)]
pub struct PostgresStore {
    url: String,
}

impl PostgresStore {
    /// A store for `postgres://` / `postgresql://` connection string `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl std::fmt::Debug for PostgresStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStore").field("url", &redact_url(&self.url)).finish()
    }
}

#[async_trait]
impl LogStore for PostgresStore {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn acquire(&self) -> Result<Box<dyn StoreConnection>> {
        let (client, connection) = tokio_postgres::connect(&self.url, NoTls)
            .await
            .map_err(|e| DashError::store_unavailable(format!("cannot connect to PostgreSQL: {}", e)))?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("Postgres connection error: {}", e);
            }
        });
        Ok(Box::new(PostgresConnection { client }))
    }
}

/// A client owned by one engine operation.
pub struct PostgresConnection {
    client: Client,
}

#[async_trait]
impl StoreConnection for PostgresConnection {
    async fn query(&mut self, statement: &Statement) -> Result<RowSet> {
        let failed = |e: tokio_postgres::Error| DashError::query_failed(format!("{} ({})", e, statement.sql));

        let owned: Vec<Box<dyn ToSql + Sync + Send>> = statement
            .params
            .iter()
            .map(|param| -> Box<dyn ToSql + Sync + Send> {
                match param {
                    SqlParam::Text(text) => Box::new(text.clone()),
                    SqlParam::Integer(n) => Box::new(*n),
                }
            })
            .collect();
        let params: Vec<&(dyn ToSql + Sync)> = owned
            .iter()
            .map(|param| param.as_ref() as &(dyn ToSql + Sync))
            .collect();

        let prepared = self.client.prepare(&statement.sql).await.map_err(failed)?;
        let columns: Vec<(String, ColumnKind)> = prepared
            .columns()
            .iter()
            .map(|c| (c.name().to_string(), ColumnKind::of(c.type_())))
            .collect();
        let rows = self.client.query(&prepared, &params).await.map_err(failed)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut values = Vec::with_capacity(columns.len());
            for (index, (_, kind)) in columns.iter().enumerate() {
                values.push(to_json(row, index, *kind).map_err(failed)?);
            }
            out.push(values);
        }

        Ok(RowSet {
            columns: columns.into_iter().map(|(name, _)| name).collect(),
            rows: out,
        })
    }
}

/// How a result column is decoded into JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Timestamp,
    TimestampTz,
    Json,
    Inet,
    Bytes,
    Text,
}

impl ColumnKind {
    fn of(ty: &Type) -> Self {
        if *ty == Type::BOOL {
            ColumnKind::Bool
        } else if *ty == Type::INT2 {
            ColumnKind::Int2
        } else if *ty == Type::INT4 {
            ColumnKind::Int4
        } else if *ty == Type::INT8 {
            ColumnKind::Int8
        } else if *ty == Type::FLOAT4 {
            ColumnKind::Float4
        } else if *ty == Type::FLOAT8 {
            ColumnKind::Float8
        } else if *ty == Type::TIMESTAMP {
            ColumnKind::Timestamp
        } else if *ty == Type::TIMESTAMPTZ {
            ColumnKind::TimestampTz
        } else if *ty == Type::JSON || *ty == Type::JSONB {
            ColumnKind::Json
        } else if *ty == Type::INET {
            ColumnKind::Inet
        } else if *ty == Type::BYTEA {
            ColumnKind::Bytes
        } else {
            ColumnKind::Text
        }
    }
}

fn to_json(row: &Row, index: usize, kind: ColumnKind) -> std::result::Result<Value, tokio_postgres::Error> {
    let value = match kind {
        ColumnKind::Bool => row.try_get::<_, Option<bool>>(index)?.map(Value::from),
        ColumnKind::Int2 => row.try_get::<_, Option<i16>>(index)?.map(Value::from),
        ColumnKind::Int4 => row.try_get::<_, Option<i32>>(index)?.map(Value::from),
        ColumnKind::Int8 => row.try_get::<_, Option<i64>>(index)?.map(Value::from),
        ColumnKind::Float4 => row.try_get::<_, Option<f32>>(index)?.and_then(|f| float(f64::from(f))),
        ColumnKind::Float8 => row.try_get::<_, Option<f64>>(index)?.and_then(float),
        ColumnKind::Timestamp => row.try_get::<_, Option<NaiveDateTime>>(index)?.map(naive_text),
        ColumnKind::TimestampTz => row.try_get::<_, Option<DateTime<Utc>>>(index)?.map(utc_text),
        ColumnKind::Json => row.try_get::<_, Option<Value>>(index)?,
        ColumnKind::Inet => row.try_get::<_, Option<IpAddr>>(index)?.map(|ip| Value::String(ip.to_string())),
        ColumnKind::Bytes => row.try_get::<_, Option<Vec<u8>>>(index)?.map(|b| Value::String(hex::encode(b))),
        ColumnKind::Text => match row.try_get::<_, Option<String>>(index) {
            Ok(text) => text.map(Value::String),
            Err(e) => {
                log::debug!("[PostgresStore] Column {} not mapped: {}", index, e);
                None
            }
        },
    };
    Ok(value.unwrap_or(Value::Null))
}

/// Non-finite floats have no JSON form.
fn float(f: f64) -> Option<Value> {
    Number::from_f64(f).map(Value::Number)
}

fn naive_text(ts: NaiveDateTime) -> Value {
    Value::String(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string())
}

fn utc_text(ts: DateTime<Utc>) -> Value {
    Value::String(ts.to_rfc3339())
}
