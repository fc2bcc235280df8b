//! Request parameter parsing.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

use logbook_core::LogQuery;

use crate::error::ApiError;

/// Text format of `startTime` / `endTime`, e.g. `2023-09-15T08:00:00Z`
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Query string of `GET /logs`.
///
/// Everything arrives as text so empty values can fall back to defaults
/// and bad values get a clear 400.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryParams {
    /// Exact level
    pub level: String,
    /// Message pattern
    pub message: String,
    /// Exact resource id
    pub resource_id: String,
    /// Exact trace id
    pub trace_id: String,
    /// Exact span id
    pub span_id: String,
    /// Exact commit
    pub commit: String,
    /// Exact `metadata.parentResourceId`
    pub parent_resource_id: String,
    /// Inclusive lower bound in [`TIME_FORMAT`]
    pub start_time: String,
    /// Inclusive upper bound in [`TIME_FORMAT`]
    pub end_time: String,
    /// Regex over the message
    pub regex: String,
    /// Full-text search
    pub search: String,
    /// 1-based page
    pub page: String,
    /// Page size
    pub limit: String,
}

impl TryFrom<QueryParams> for LogQuery {
    type Error = ApiError;

    fn try_from(params: QueryParams) -> Result<Self, Self::Error> {
        Ok(LogQuery {
            level: params.level,
            message: params.message,
            resource_id: params.resource_id,
            trace_id: params.trace_id,
            span_id: params.span_id,
            commit: params.commit,
            parent_resource_id: params.parent_resource_id,
            start_time: parse_time("startTime", &params.start_time)?,
            end_time: parse_time("endTime", &params.end_time)?,
            regex_pattern: params.regex,
            full_text_search: params.search,
            page: parse_int("page", &params.page)?,
            limit: parse_int("limit", &params.limit)?,
        })
    }
}

fn parse_time(name: &str, value: &str) -> Result<Option<DateTime<Utc>>, ApiError> {
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(value, TIME_FORMAT)
        .map(|naive| Some(Utc.from_utc_datetime(&naive)))
        .map_err(|e| ApiError::BadRequest(format!("invalid {} {:?}: {}", name, value, e)))
}

fn parse_int(name: &str, value: &str) -> Result<i64, ApiError> {
    if value.is_empty() {
        return Ok(0);
    }
    value
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("invalid {} {:?}: {}", name, value, e)))
}
