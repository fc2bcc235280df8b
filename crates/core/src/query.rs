//! Query types
//!
//! A [`LogQuery`] is a set of independently optional filters plus a page
//! request. Empty strings and `None` mean "no filter on this field".
//!
//! ## Pagination
//!
//! `page` is 1-based. Absent or non-positive `page`/`limit` resolve to
//! [`DEFAULT_PAGE`] and [`DEFAULT_LIMIT`]. Stores resolve them in place when
//! the query executes, so after `query()` returns the caller can read back
//! the page window that was actually used.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::LogRecord;

/// Page used when the query does not ask for a positive one
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when the query does not ask for a positive one
pub const DEFAULT_LIMIT: i64 = 10;

/// Filter and pagination request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogQuery {
    /// Exact level
    pub level: String,
    /// Message pattern (substring in memory, case-insensitive regex when persisted)
    pub message: String,
    /// Exact resource id
    pub resource_id: String,
    /// Exact trace id
    pub trace_id: String,
    /// Exact span id
    pub span_id: String,
    /// Exact commit
    pub commit: String,
    /// Exact `metadata["parentResourceId"]`
    pub parent_resource_id: String,
    /// Inclusive lower time bound
    pub start_time: Option<DateTime<Utc>>,
    /// Inclusive upper time bound
    pub end_time: Option<DateTime<Utc>>,
    /// Regular expression over the message (persistent backends only)
    pub regex_pattern: String,
    /// Full-text search over the message (persistent backends only)
    pub full_text_search: String,
    /// 1-based page number; non-positive means default
    pub page: i64,
    /// Page size; non-positive means default
    pub limit: i64,
}

/// Resolved page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page number, always >= 1
    pub page: u64,
    /// Page size, always >= 1
    pub limit: u64,
}

impl Pagination {
    /// Index of the first record on this page
    ///
    /// Saturates instead of overflowing for absurd page numbers; a page
    /// of 0 is treated as the first page.
    pub fn offset(&self) -> usize {
        let offset = self.page.saturating_sub(1).saturating_mul(self.limit);
        usize::try_from(offset).unwrap_or(usize::MAX)
    }

    /// Page size as usize
    pub fn size(&self) -> usize {
        usize::try_from(self.limit).unwrap_or(usize::MAX)
    }
}

impl LogQuery {
    /// Query that matches everything on the given page
    pub fn page(page: i64, limit: i64) -> Self {
        LogQuery {
            page,
            limit,
            ..Default::default()
        }
    }

    /// Replace non-positive `page`/`limit` with their defaults, in place
    pub fn resolve_pagination(&mut self) -> Pagination {
        if self.page <= 0 {
            self.page = DEFAULT_PAGE;
        }
        if self.limit <= 0 {
            self.limit = DEFAULT_LIMIT;
        }
        Pagination {
            page: self.page as u64,
            limit: self.limit as u64,
        }
    }

    /// True when no filter field is set (pagination is ignored)
    pub fn is_unfiltered(&self) -> bool {
        self.level.is_empty()
            && self.message.is_empty()
            && self.resource_id.is_empty()
            && self.trace_id.is_empty()
            && self.span_id.is_empty()
            && self.commit.is_empty()
            && self.parent_resource_id.is_empty()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.regex_pattern.is_empty()
            && self.full_text_search.is_empty()
    }

    /// Filter on level (builder pattern)
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Filter on message (builder pattern)
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Filter on resource id (builder pattern)
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = resource_id.into();
        self
    }

    /// Filter on trace id (builder pattern)
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = trace_id.into();
        self
    }

    /// Filter on span id (builder pattern)
    pub fn with_span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = span_id.into();
        self
    }

    /// Filter on commit (builder pattern)
    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = commit.into();
        self
    }

    /// Filter on parent resource id (builder pattern)
    pub fn with_parent_resource_id(mut self, parent: impl Into<String>) -> Self {
        self.parent_resource_id = parent.into();
        self
    }

    /// Restrict to an inclusive time range; `None` leaves that side open
    pub fn with_time_range(
        mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        self.start_time = start;
        self.end_time = end;
        self
    }

    /// Regex over the message (builder pattern)
    pub fn with_regex(mut self, pattern: impl Into<String>) -> Self {
        self.regex_pattern = pattern.into();
        self
    }

    /// Full-text search (builder pattern)
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.full_text_search = search.into();
        self
    }

    /// Page request (builder pattern)
    pub fn with_page(mut self, page: i64, limit: i64) -> Self {
        self.page = page;
        self.limit = limit;
        self
    }
}

/// One page of query results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPage {
    /// Matching records on this page, in backend order
    pub records: Vec<LogRecord>,
    /// Number of records on this page (not the total number of matches)
    pub count: usize,
}

impl QueryPage {
    /// Wrap a page of records
    pub fn new(records: Vec<LogRecord>) -> Self {
        let count = records.len();
        QueryPage { records, count }
    }

    /// Page with no records
    pub fn empty() -> Self {
        QueryPage::default()
    }

    /// True when the page holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
