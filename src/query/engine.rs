// src/query/engine.rs
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{DashError, Result};
use crate::query::builder::{SelectBuilder, SortOrder, Statement, TableName};
use crate::store::{open_store, LogStore, RowSet, StoreConnection};
use crate::types::{
    total_pages, DashboardView, DistinctValues, FilterCriteria, LogColumn, LogRecord, PageRequest,
    Statistics,
};

/// Read-only queries over the log table.
///
/// The engine holds no connection. Each operation acquires its own from the
/// store, runs its statements one after another on it and drops it before
/// returning, so one engine can serve any number of concurrent callers.
pub struct LogQueryEngine<S: LogStore + ?Sized = dyn LogStore> {
    store: Arc<S>,
    table: TableName,
    timeout: Option<Duration>,
}

impl<S: LogStore + ?Sized> Clone for LogQueryEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            table: self.table.clone(),
            timeout: self.timeout,
        }
    }
}

impl LogQueryEngine<dyn LogStore> {
    /// Build an engine for the store, table and timeout named in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = open_store(&config.store)?;
        let table = TableName::new(config.store.table.clone())?;
        let engine = Self::new(store, table);
        Ok(match config.query.timeout() {
            Some(timeout) => engine.with_timeout(timeout),
            None => engine,
        })
    }
}

impl<S: LogStore + ?Sized> LogQueryEngine<S> {
    /// An engine reading `table` from `store`, without a timeout.
    pub fn new(store: Arc<S>, table: TableName) -> Self {
        Self {
            store,
            table,
            timeout: None,
        }
    }

    /// Bound every operation by `timeout`. An expired operation fails with
    /// [`DashError::Timeout`] and its in-flight statement is abandoned.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The table being queried.
    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// One window of the filtered records, newest first.
    ///
    /// Returns at most `limit` records starting at the zero-based `offset`.
    /// An offset past the last match yields an empty vector.
    pub async fn fetch_page(
        &self,
        filters: &FilterCriteria,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<LogRecord>> {
        let statement = SelectBuilder::rows(&self.table)
            .filter(filters)
            .order_by(LogColumn::Timestamp, SortOrder::Descending)
            .limit(u64::from(limit))
            .offset(offset)
            .build(self.store.dialect())?;

        self.bounded("fetch_page", async {
            let mut conn = self.store.acquire().await?;
            let rows = run(conn.as_mut(), &statement).await?;
            Ok(rows.into_records())
        })
        .await
    }

    /// Totals over the whole table, ignoring any filter.
    ///
    /// The four aggregates are separate statements; if any fails the whole
    /// call fails.
    pub async fn compute_statistics(&self) -> Result<Statistics> {
        let dialect = self.store.dialect();
        let total = SelectBuilder::count(&self.table).build(dialect)?;
        let by_os = SelectBuilder::group_count(&self.table, LogColumn::OsType).build(dialect)?;
        let by_level = SelectBuilder::group_count(&self.table, LogColumn::LogLevel).build(dialect)?;
        let hosts = SelectBuilder::count_distinct(&self.table, LogColumn::IpAddress).build(dialect)?;

        self.bounded("compute_statistics", async {
            let mut conn = self.store.acquire().await?;
            let conn = conn.as_mut();
            Ok(Statistics {
                total: run(conn, &total).await?.scalar_count()?,
                by_os: run(conn, &by_os).await?.grouped_counts()?,
                by_level: run(conn, &by_level).await?.grouped_counts()?,
                unique_hosts: run(conn, &hosts).await?.scalar_count()?,
            })
        })
        .await
    }

    /// Sorted distinct values of each filterable column, for filter choices.
    pub async fn list_distinct_values(&self) -> Result<DistinctValues> {
        let dialect = self.store.dialect();
        let distinct = |column| SelectBuilder::distinct(&self.table, column).build(dialect);
        let ips = distinct(LogColumn::IpAddress)?;
        let os_types = distinct(LogColumn::OsType)?;
        let levels = distinct(LogColumn::LogLevel)?;
        let sources = distinct(LogColumn::Source)?;

        self.bounded("list_distinct_values", async {
            let mut conn = self.store.acquire().await?;
            let conn = conn.as_mut();
            Ok(DistinctValues {
                ips: run(conn, &ips).await?.first_column_text(),
                os_types: run(conn, &os_types).await?.first_column_text(),
                levels: run(conn, &levels).await?.first_column_text(),
                sources: run(conn, &sources).await?.first_column_text(),
            })
        })
        .await
    }

    /// Everything one dashboard page shows.
    ///
    /// `total_pages` is derived from the unfiltered total, so a narrow filter
    /// can leave later pages empty.
    pub async fn dashboard(&self, filters: &FilterCriteria, page: PageRequest) -> Result<DashboardView> {
        let filters = filters.normalized();
        let logs = self.fetch_page(&filters, page.limit(), page.offset()).await?;
        let stats = self.compute_statistics().await?;
        let unique = self.list_distinct_values().await?;

        Ok(DashboardView {
            total_pages: total_pages(stats.total, page.limit()),
            logs,
            stats,
            unique,
            filters,
            page: page.number(),
            limit: page.limit(),
        })
    }

    async fn bounded<T, F>(&self, operation: &str, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, future).await.unwrap_or_else(|_| {
                Err(DashError::timeout(format!("{} exceeded {} ms", operation, limit.as_millis())))
            }),
            None => future.await,
        };
        if let Err(e) = &result {
            log::warn!("[LogQueryEngine] {} on {} failed: {}", operation, self.table, e);
        }
        result
    }
}

async fn run(conn: &mut dyn StoreConnection, statement: &Statement) -> Result<RowSet> {
    log::debug!("[LogQueryEngine] {}", statement);
    conn.query(statement).await
}
