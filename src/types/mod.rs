//! Core type definitions for logdash

mod filter;
mod log_level;
mod record;
mod stats;
mod storage;

pub use filter::{total_pages, FilterCriteria, FilterPredicate, MatchKind, PageRequest, PAGE_LIMIT};
pub use log_level::LogLevel;
pub use record::{LogColumn, LogRecord};
pub use stats::{DashboardView, DistinctValues, Statistics};
pub use storage::StoreType;
