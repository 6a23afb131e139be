//! Parameterized SQL construction for the log table.
//!
//! Only two kinds of text ever reach the SQL string: identifiers from
//! [`LogColumn`] and a validated [`TableName`]. Every user supplied value,
//! including `LIMIT` and `OFFSET`, is carried separately as a [`SqlParam`].

use std::fmt;

use crate::config::validation::validate_table_name;
use crate::error::{DashError, Result};
use crate::types::{FilterCriteria, LogColumn, MatchKind};

/// Placeholder syntax of the target store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `?1`, `?2`, ...
    Sqlite,
    /// `$1`, `$2`, ...
    Postgres,
}

impl Dialect {
    fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Sqlite => format!("?{}", index),
            Dialect::Postgres => format!("${}", index),
        }
    }
}

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    /// Text compared against a column
    Text(String),
    /// Row counts for `LIMIT` / `OFFSET`
    Integer(i64),
}

/// SQL text plus the values for its placeholders, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// SQL with dialect specific placeholders
    pub sql: String,
    /// Values for `?1..` / `$1..`
    pub params: Vec<SqlParam>,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -- {} param(s)", self.sql, self.params.len())
    }
}

/// A table name that is safe to write into SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName(String);

impl TableName {
    /// Accepts plain identifiers only (`[A-Za-z_][A-Za-z0-9_]*`).
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_table_name(&name).map_err(|e| DashError::invalid_input(e.to_string()))?;
        Ok(Self(name))
    }

    /// The bare name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn quoted(&self) -> String {
        quote_ident(&self.0)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest first
    Ascending,
    /// Largest first
    Descending,
}

impl SortOrder {
    fn keyword(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Projection {
    AllColumns,
    CountAll,
    CountDistinct(LogColumn),
    GroupCount(LogColumn),
    Distinct(LogColumn),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Contains(LogColumn, String),
    Equals(LogColumn, String),
    NotNull(LogColumn),
    NotBlank(LogColumn),
}

/// Builds one `SELECT` against the log table.
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    table: TableName,
    projection: Projection,
    conditions: Vec<Condition>,
    order: Option<(LogColumn, SortOrder)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SelectBuilder {
    fn new(table: &TableName, projection: Projection) -> Self {
        Self {
            table: table.clone(),
            projection,
            conditions: Vec::new(),
            order: None,
            limit: None,
            offset: None,
        }
    }

    /// `SELECT *`
    pub fn rows(table: &TableName) -> Self {
        Self::new(table, Projection::AllColumns)
    }

    /// `SELECT COUNT(*)`
    pub fn count(table: &TableName) -> Self {
        Self::new(table, Projection::CountAll)
    }

    /// `SELECT COUNT(DISTINCT column)`
    pub fn count_distinct(table: &TableName, column: LogColumn) -> Self {
        Self::new(table, Projection::CountDistinct(column))
    }

    /// `SELECT column, COUNT(*) ... GROUP BY column`, null keys excluded.
    pub fn group_count(table: &TableName, column: LogColumn) -> Self {
        Self::new(table, Projection::GroupCount(column)).where_not_null(column)
    }

    /// Sorted distinct values of one column, nulls and empty strings excluded.
    pub fn distinct(table: &TableName, column: LogColumn) -> Self {
        Self::new(table, Projection::Distinct(column))
            .where_not_null(column)
            .where_not_blank(column)
            .order_by(column, SortOrder::Ascending)
    }

    /// Adds one condition per active filter field.
    pub fn filter(mut self, criteria: &FilterCriteria) -> Self {
        for predicate in criteria.predicates() {
            let value = predicate.value.to_string();
            self.conditions.push(match predicate.kind {
                MatchKind::Contains => Condition::Contains(predicate.column, value),
                MatchKind::Exact => Condition::Equals(predicate.column, value),
            });
        }
        self
    }

    /// `column IS NOT NULL`
    pub fn where_not_null(mut self, column: LogColumn) -> Self {
        self.conditions.push(Condition::NotNull(column));
        self
    }

    /// `column <> ''`
    pub fn where_not_blank(mut self, column: LogColumn) -> Self {
        self.conditions.push(Condition::NotBlank(column));
        self
    }

    /// `ORDER BY column direction`
    pub fn order_by(mut self, column: LogColumn, order: SortOrder) -> Self {
        self.order = Some((column, order));
        self
    }

    /// `LIMIT n`
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// `OFFSET n`; only rendered together with a limit.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Render SQL and parameters for `dialect`.
    pub fn build(&self, dialect: Dialect) -> Result<Statement> {
        let mut params = Vec::new();
        let mut bind = |param: SqlParam| {
            params.push(param);
            dialect.placeholder(params.len())
        };

        let mut sql = format!("SELECT {} FROM {}", self.projection_sql(), self.table.quoted());

        let clauses: Vec<String> = self
            .conditions
            .iter()
            .map(|condition| match condition {
                Condition::Contains(column, value) => format!(
                    "{} LIKE {} ESCAPE '\\'",
                    quote_ident(column.name()),
                    bind(SqlParam::Text(like_pattern(value)))
                ),
                Condition::Equals(column, value) => format!(
                    "{} = {}",
                    quote_ident(column.name()),
                    bind(SqlParam::Text(value.clone()))
                ),
                Condition::NotNull(column) => format!("{} IS NOT NULL", quote_ident(column.name())),
                Condition::NotBlank(column) => format!("{} <> ''", quote_ident(column.name())),
            })
            .collect();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        if let Projection::GroupCount(column) = self.projection {
            sql.push_str(&format!(" GROUP BY {}", quote_ident(column.name())));
        }

        if let Some((column, order)) = self.order {
            sql.push_str(&format!(" ORDER BY {} {}", quote_ident(column.name()), order.keyword()));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", bind(SqlParam::Integer(to_i64("limit", limit)?))));
            if let Some(offset) = self.offset {
                sql.push_str(&format!(" OFFSET {}", bind(SqlParam::Integer(to_i64("offset", offset)?))));
            }
        }

        Ok(Statement { sql, params })
    }

    fn projection_sql(&self) -> String {
        match self.projection {
            Projection::AllColumns => "*".to_string(),
            Projection::CountAll => "COUNT(*)".to_string(),
            Projection::CountDistinct(column) => format!("COUNT(DISTINCT {})", quote_ident(column.name())),
            Projection::GroupCount(column) => format!("{}, COUNT(*)", quote_ident(column.name())),
            Projection::Distinct(column) => format!("DISTINCT {}", quote_ident(column.name())),
        }
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `%value%` with LIKE metacharacters escaped so the value matches literally.
fn like_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn to_i64(what: &str, value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| DashError::invalid_input(format!("{} {} is out of range", what, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TableName {
        TableName::new("system_logs").unwrap()
    }

    #[test]
    fn test_unfiltered_page() {
        let stmt = SelectBuilder::rows(&table())
            .filter(&FilterCriteria::new())
            .order_by(LogColumn::Timestamp, SortOrder::Descending)
            .limit(1000)
            .offset(2000)
            .build(Dialect::Sqlite)
            .unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM \"system_logs\" ORDER BY \"timestamp\" DESC LIMIT ?1 OFFSET ?2"
        );
        assert_eq!(stmt.params, vec![SqlParam::Integer(1000), SqlParam::Integer(2000)]);
    }

    #[test]
    fn test_filters_are_conjoined_in_column_order() {
        let criteria = FilterCriteria::new()
            .with_source("kern")
            .with_os_type("linux")
            .with_ip_address("10.0");
        let stmt = SelectBuilder::rows(&table())
            .filter(&criteria)
            .order_by(LogColumn::Timestamp, SortOrder::Descending)
            .limit(1000)
            .offset(0)
            .build(Dialect::Postgres)
            .unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM \"system_logs\" WHERE \"ip_address\" LIKE $1 ESCAPE '\\' AND \"os_type\" = $2 \
             AND \"source\" LIKE $3 ESCAPE '\\' ORDER BY \"timestamp\" DESC LIMIT $4 OFFSET $5"
        );
        assert_eq!(
            stmt.params,
            vec![
                SqlParam::Text("%10.0%".into()),
                SqlParam::Text("linux".into()),
                SqlParam::Text("%kern%".into()),
                SqlParam::Integer(1000),
                SqlParam::Integer(0),
            ]
        );
    }

    #[test]
    fn test_values_never_reach_sql_text() {
        let criteria = FilterCriteria::new().with_log_level("ERROR' OR '1'='1");
        let stmt = SelectBuilder::rows(&table()).filter(&criteria).build(Dialect::Sqlite).unwrap();
        assert!(!stmt.sql.contains("OR"));
        assert_eq!(stmt.params, vec![SqlParam::Text("ERROR' OR '1'='1".into())]);
    }

    #[test]
    fn test_like_metacharacters_escaped() {
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn test_aggregate_shapes() {
        let t = table();
        assert_eq!(
            SelectBuilder::count(&t).build(Dialect::Sqlite).unwrap().sql,
            "SELECT COUNT(*) FROM \"system_logs\""
        );
        assert_eq!(
            SelectBuilder::group_count(&t, LogColumn::OsType).build(Dialect::Sqlite).unwrap().sql,
            "SELECT \"os_type\", COUNT(*) FROM \"system_logs\" WHERE \"os_type\" IS NOT NULL GROUP BY \"os_type\""
        );
        assert_eq!(
            SelectBuilder::count_distinct(&t, LogColumn::IpAddress).build(Dialect::Postgres).unwrap().sql,
            "SELECT COUNT(DISTINCT \"ip_address\") FROM \"system_logs\""
        );
        assert_eq!(
            SelectBuilder::distinct(&t, LogColumn::Source).build(Dialect::Postgres).unwrap().sql,
            "SELECT DISTINCT \"source\" FROM \"system_logs\" WHERE \"source\" IS NOT NULL AND \"source\" <> '' \
             ORDER BY \"source\" ASC"
        );
    }

    #[test]
    fn test_offset_out_of_range() {
        let result = SelectBuilder::rows(&table()).limit(10).offset(u64::MAX).build(Dialect::Sqlite);
        assert!(matches!(result, Err(DashError::InvalidInput(_))));
    }

    #[test]
    fn test_table_name_validation() {
        assert!(TableName::new("logs").is_ok());
        assert!(matches!(TableName::new("logs; --"), Err(DashError::InvalidInput(_))));
    }
}
