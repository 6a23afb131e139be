use serde::{Deserialize, Serialize};

use crate::error::{DashError, Result};
use crate::types::LogColumn;

/// Number of records on one dashboard page.
pub const PAGE_LIMIT: u32 = 1000;

/// How a filter value is compared against its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The column contains the value anywhere
    Contains,
    /// The column equals the value
    Exact,
}

/// One active filter condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterPredicate<'a> {
    /// Column the condition applies to
    pub column: LogColumn,
    /// Comparison to use
    pub kind: MatchKind,
    /// Trimmed, non-empty value
    pub value: &'a str,
}

/// User-selected filters for the log listing.
///
/// Each field is optional; a missing or empty field places no constraint on its
/// column. Present fields are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    /// Substring of the host address
    pub ip_address: Option<String>,
    /// Exact operating system family
    pub os_type: Option<String>,
    /// Exact recorded severity
    pub log_level: Option<String>,
    /// Substring of the emitting source
    pub source: Option<String>,
}

impl FilterCriteria {
    /// Criteria that match every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to hosts whose address contains `value`.
    pub fn with_ip_address(mut self, value: impl Into<String>) -> Self {
        self.ip_address = Some(value.into());
        self
    }

    /// Restrict to one operating system family.
    pub fn with_os_type(mut self, value: impl Into<String>) -> Self {
        self.os_type = Some(value.into());
        self
    }

    /// Restrict to one severity.
    pub fn with_log_level(mut self, value: impl Into<String>) -> Self {
        self.log_level = Some(value.into());
        self
    }

    /// Restrict to sources containing `value`.
    pub fn with_source(mut self, value: impl Into<String>) -> Self {
        self.source = Some(value.into());
        self
    }

    /// A copy with surrounding whitespace trimmed and blank fields cleared.
    pub fn normalized(&self) -> Self {
        Self {
            ip_address: clean(&self.ip_address),
            os_type: clean(&self.os_type),
            log_level: clean(&self.log_level),
            source: clean(&self.source),
        }
    }

    /// True when no field constrains the result.
    pub fn is_empty(&self) -> bool {
        self.predicates().is_empty()
    }

    /// The active conditions, in column order.
    ///
    /// Values are matched as given; only empty fields are skipped. Use
    /// [`FilterCriteria::normalized`] to trim user input first.
    pub fn predicates(&self) -> Vec<FilterPredicate<'_>> {
        [
            (LogColumn::IpAddress, MatchKind::Contains, &self.ip_address),
            (LogColumn::OsType, MatchKind::Exact, &self.os_type),
            (LogColumn::LogLevel, MatchKind::Exact, &self.log_level),
            (LogColumn::Source, MatchKind::Contains, &self.source),
        ]
        .into_iter()
        .filter_map(|(column, kind, value)| {
            let value = value.as_deref()?;
            (!value.is_empty()).then_some(FilterPredicate { column, kind, value })
        })
        .collect()
    }
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// A validated 1-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PageRequest(u64);

impl PageRequest {
    /// Validate a page number. Zero is rejected rather than coerced.
    pub fn new(page: u64) -> Result<Self> {
        if page == 0 {
            return Err(DashError::invalid_input("page numbers start at 1"));
        }
        if (page - 1).checked_mul(u64::from(PAGE_LIMIT)).is_none() {
            return Err(DashError::invalid_input(format!("page {} is out of range", page)));
        }
        Ok(Self(page))
    }

    /// The first page.
    pub fn first() -> Self {
        Self(1)
    }

    /// Interpret a raw request parameter the way the dashboard front end does:
    /// a missing, malformed or zero value falls back to the first page.
    pub fn from_param(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.trim().parse::<u64>().ok())
            .and_then(|page| Self::new(page).ok())
            .unwrap_or_else(Self::first)
    }

    /// The 1-based page number.
    pub fn number(self) -> u64 {
        self.0
    }

    /// Records per page.
    pub fn limit(self) -> u32 {
        PAGE_LIMIT
    }

    /// Zero-based offset of the first record on this page.
    pub fn offset(self) -> u64 {
        (self.0 - 1) * u64::from(PAGE_LIMIT)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// Number of pages needed to show `total` records, `limit` at a time.
pub fn total_pages(total: u64, limit: u32) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(u64::from(limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_predicates_skip_empty_fields() {
        let filters = FilterCriteria::new()
            .with_ip_address("10.0")
            .with_os_type("");
        let predicates = filters.predicates();
        assert_eq!(predicates.len(), 1);
        assert_eq!(predicates[0].column, LogColumn::IpAddress);
        assert_eq!(predicates[0].kind, MatchKind::Contains);
        assert_eq!(predicates[0].value, "10.0");
        assert!(FilterCriteria::new().is_empty());
    }

    #[test]
    fn test_predicates_keep_values_verbatim() {
        let filters = FilterCriteria::new().with_os_type(" linux ").with_source("   ");
        let predicates = filters.predicates();
        assert_eq!(predicates.len(), 2);
        assert_eq!(predicates[0].value, " linux ");
        assert_eq!(predicates[1].value, "   ");

        // Trimming belongs to normalization.
        let normalized = filters.normalized();
        let predicates = normalized.predicates();
        assert_eq!(predicates.len(), 1);
        assert_eq!(predicates[0].value, "linux");
    }

    #[test]
    fn test_match_kinds_per_column() {
        let filters = FilterCriteria::new()
            .with_ip_address("10")
            .with_os_type("linux")
            .with_log_level("ERROR")
            .with_source("kern");
        let kinds: Vec<_> = filters.predicates().iter().map(|p| (p.column, p.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (LogColumn::IpAddress, MatchKind::Contains),
                (LogColumn::OsType, MatchKind::Exact),
                (LogColumn::LogLevel, MatchKind::Exact),
                (LogColumn::Source, MatchKind::Contains),
            ]
        );
    }

    #[test]
    fn test_normalized_trims_and_clears() {
        let filters = FilterCriteria::new().with_os_type(" windows ").with_log_level(" ");
        let normalized = filters.normalized();
        assert_eq!(normalized.os_type.as_deref(), Some("windows"));
        assert_eq!(normalized.log_level, None);
    }

    #[test]
    fn test_page_offsets() {
        assert_eq!(PageRequest::first().offset(), 0);
        assert_eq!(PageRequest::new(2).unwrap().offset(), 1000);
        assert_eq!(PageRequest::new(3).unwrap().limit(), PAGE_LIMIT);
        assert_matches!(PageRequest::new(0), Err(DashError::InvalidInput(_)));
        assert_matches!(PageRequest::new(u64::MAX), Err(DashError::InvalidInput(_)));
    }

    #[test]
    fn test_page_from_param_defaults_to_first() {
        assert_eq!(PageRequest::from_param(None).number(), 1);
        assert_eq!(PageRequest::from_param(Some("abc")).number(), 1);
        assert_eq!(PageRequest::from_param(Some("0")).number(), 1);
        assert_eq!(PageRequest::from_param(Some(" 4 ")).number(), 4);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0, PAGE_LIMIT), 0);
        assert_eq!(total_pages(1000, PAGE_LIMIT), 1);
        assert_eq!(total_pages(1001, PAGE_LIMIT), 2);
        assert_eq!(total_pages(2500, PAGE_LIMIT), 3);
    }
}
