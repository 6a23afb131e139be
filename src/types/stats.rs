use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{FilterCriteria, LogRecord};

/// Aggregates over the whole, unfiltered log table.
///
/// The four figures come from independent queries and are not guaranteed to
/// describe the same instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Number of records
    pub total: u64,
    /// Records per operating system family; null families are left out
    pub by_os: BTreeMap<String, u64>,
    /// Records per severity; null severities are left out
    pub by_level: BTreeMap<String, u64>,
    /// Number of distinct host addresses
    pub unique_hosts: u64,
}

impl Statistics {
    /// Records that carry an operating system family.
    pub fn classified_by_os(&self) -> u64 {
        self.by_os.values().sum()
    }
}

/// Distinct values per filterable column, for populating filter choices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistinctValues {
    /// Host addresses
    pub ips: Vec<String>,
    /// Operating system families
    pub os_types: Vec<String>,
    /// Severities
    pub levels: Vec<String>,
    /// Sources
    pub sources: Vec<String>,
}

/// Everything one dashboard page renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    /// Records on this page, newest first
    pub logs: Vec<LogRecord>,
    /// Whole-table statistics
    pub stats: Statistics,
    /// Filter choices
    pub unique: DistinctValues,
    /// The filters that produced `logs`
    pub filters: FilterCriteria,
    /// Requested 1-based page
    pub page: u64,
    /// `ceil(stats.total / limit)`
    pub total_pages: u64,
    /// Records per page
    pub limit: u32,
}
