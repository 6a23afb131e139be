use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported relational stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    /// SQLite database file, opened read-only per call
    Sqlite,
    /// PostgreSQL server reached through a connection string
    Postgres,
}

impl Default for StoreType {
    fn default() -> Self {
        Self::Sqlite
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Postgres => write!(f, "postgres"),
        }
    }
}

impl FromStr for StoreType {
    type Err = String;

    /// Parse a string into a StoreType
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            _ => Err(format!("Invalid store type: '{}'", s)),
        }
    }
}
