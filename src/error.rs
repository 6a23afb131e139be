//! Error types for the logdash query layer
//!
//! This module defines the error types used throughout the crate.
//! The main error type is `DashError`, which separates failures to reach the
//! store from failures of the queries run against it.

use thiserror::Error;

/// Main error type for the logdash query layer
#[derive(Error, Debug)]
pub enum DashError {
    /// A connection to the log store could not be opened or acquired
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A connection was obtained but the query itself failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Invalid input provided by the caller
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation exceeded its deadline
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// The requested store backend was not compiled in
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// A blocking worker died before reporting back
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for operations that can fail with a [DashError]
pub type Result<T> = std::result::Result<T, DashError>;

impl DashError {
    /// Create a new store unavailable error
    pub fn store_unavailable<S: Into<String>>(msg: S) -> Self {
        DashError::StoreUnavailable(msg.into())
    }

    /// Create a new query failed error
    pub fn query_failed<S: Into<String>>(msg: S) -> Self {
        DashError::QueryFailed(msg.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        DashError::InvalidInput(msg.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(what: S) -> Self {
        DashError::Timeout(what.into())
    }

    /// Create a new not supported error
    pub fn not_supported<S: Into<String>>(what: S) -> Self {
        DashError::NotSupported(what.into())
    }

    /// Whether the failure happened before any query reached the store.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, DashError::StoreUnavailable(_))
    }
}

impl From<tokio::task::JoinError> for DashError {
    fn from(err: tokio::task::JoinError) -> Self {
        DashError::Internal(format!("Blocking store task failed: {}", err))
    }
}

impl From<tokio::time::error::Elapsed> for DashError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        DashError::timeout(err.to_string())
    }
}
