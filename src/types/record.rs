use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The well-known columns every log table must carry.
///
/// These are the only identifiers the query builder ever writes into SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogColumn {
    /// When the event was recorded; the sort key for pages
    Timestamp,
    /// Originating host address
    IpAddress,
    /// Operating system family of the host
    OsType,
    /// Severity as recorded by the host
    LogLevel,
    /// Emitting service, channel or file
    Source,
}

impl LogColumn {
    /// All well-known columns in table order.
    pub const ALL: [LogColumn; 5] = [
        LogColumn::Timestamp,
        LogColumn::IpAddress,
        LogColumn::OsType,
        LogColumn::LogLevel,
        LogColumn::Source,
    ];

    /// Column name as it appears in the store.
    pub const fn name(self) -> &'static str {
        match self {
            LogColumn::Timestamp => "timestamp",
            LogColumn::IpAddress => "ip_address",
            LogColumn::OsType => "os_type",
            LogColumn::LogLevel => "log_level",
            LogColumn::Source => "source",
        }
    }

    /// Look a column up by its store name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for LogColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the log table.
///
/// The well-known columns are typed; everything else the store returns (an `id`,
/// the message body, vendor specific fields) is kept in `extra` in column order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LogRecord {
    /// Event time as stored
    pub timestamp: Option<String>,
    /// Originating host address
    pub ip_address: Option<String>,
    /// Operating system family
    pub os_type: Option<String>,
    /// Recorded severity
    pub log_level: Option<String>,
    /// Emitting source
    pub source: Option<String>,
    /// Columns without a typed field
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LogRecord {
    /// Build a record from `(column name, value)` pairs in result order.
    ///
    /// Non-text values in a well-known column are kept in their textual form.
    pub fn from_columns<I>(columns: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut record = LogRecord::default();
        for (name, value) in columns {
            match LogColumn::from_name(&name) {
                Some(column) => *record.slot_mut(column) = value_to_text(value),
                None => {
                    record.extra.insert(name, value);
                }
            }
        }
        record
    }

    /// The value of a well-known column.
    pub fn field(&self, column: LogColumn) -> Option<&str> {
        match column {
            LogColumn::Timestamp => self.timestamp.as_deref(),
            LogColumn::IpAddress => self.ip_address.as_deref(),
            LogColumn::OsType => self.os_type.as_deref(),
            LogColumn::LogLevel => self.log_level.as_deref(),
            LogColumn::Source => self.source.as_deref(),
        }
    }

    /// The message body, if the store has a `message` column.
    pub fn message(&self) -> Option<&str> {
        self.extra.get("message").and_then(Value::as_str)
    }

    /// Interpret the stored timestamp.
    ///
    /// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]` (read as UTC) and integer
    /// unix seconds.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        let raw = self.timestamp.as_deref()?.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(Utc.from_utc_datetime(&naive));
            }
        }
        raw.parse::<i64>()
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }

    fn slot_mut(&mut self, column: LogColumn) -> &mut Option<String> {
        match column {
            LogColumn::Timestamp => &mut self.timestamp,
            LogColumn::IpAddress => &mut self.ip_address,
            LogColumn::OsType => &mut self.os_type,
            LogColumn::LogLevel => &mut self.log_level,
            LogColumn::Source => &mut self.source,
        }
    }
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> LogRecord {
        LogRecord::from_columns(vec![
            ("id".to_string(), json!(7)),
            ("timestamp".to_string(), json!("2024-03-01 12:00:05")),
            ("ip_address".to_string(), json!("10.0.0.7")),
            ("os_type".to_string(), json!("linux")),
            ("log_level".to_string(), Value::Null),
            ("source".to_string(), json!("sshd")),
            ("message".to_string(), json!("Accepted publickey")),
        ])
    }

    #[test]
    fn test_known_columns_are_typed_and_rest_pass_through() {
        let record = sample();
        assert_eq!(record.ip_address.as_deref(), Some("10.0.0.7"));
        assert_eq!(record.log_level, None);
        assert_eq!(record.message(), Some("Accepted publickey"));
        assert_eq!(record.extra.keys().collect::<Vec<_>>(), vec!["id", "message"]);
        assert_eq!(record.extra["id"], json!(7));
        assert_eq!(record.field(LogColumn::OsType), Some("linux"));
        assert_eq!(record.field(LogColumn::LogLevel), None);
    }

    #[test]
    fn test_numeric_timestamp_kept_as_text() {
        let record = LogRecord::from_columns(vec![("timestamp".to_string(), json!(1_700_000_000))]);
        assert_eq!(record.timestamp.as_deref(), Some("1700000000"));
        assert_eq!(record.parsed_timestamp().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_parsed_timestamp_formats() {
        let record = sample();
        let ts = record.parsed_timestamp().unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T12:00:05+00:00");

        let mut record = LogRecord::default();
        record.timestamp = Some("2024-03-01T12:00:05+02:00".into());
        assert_eq!(record.parsed_timestamp().unwrap().to_rfc3339(), "2024-03-01T10:00:05+00:00");

        record.timestamp = Some("yesterday".into());
        assert!(record.parsed_timestamp().is_none());
    }

    #[test]
    fn test_serializes_flat() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["message"], json!("Accepted publickey"));
        assert_eq!(value["source"], json!("sshd"));
        assert!(value.get("extra").is_none());
    }

    #[test]
    fn test_column_lookup() {
        assert_eq!(LogColumn::from_name("os_type"), Some(LogColumn::OsType));
        assert_eq!(LogColumn::from_name("message"), None);
        assert_eq!(LogColumn::LogLevel.to_string(), "log_level");
    }
}
