//! # Query Module
//!
//! Provides the read side of the dashboard:
//! - Paged, filtered record listings ordered newest first
//! - Whole-table statistics
//! - Distinct values for filter choices
//!
//! SQL is produced by [`builder::SelectBuilder`] and executed through a
//! [`crate::store::LogStore`].

pub mod builder;
/// Query engine executing the dashboard's read operations against a store.
pub mod engine;

pub use builder::{Dialect, SelectBuilder, SortOrder, SqlParam, Statement, TableName};
pub use engine::LogQueryEngine;
