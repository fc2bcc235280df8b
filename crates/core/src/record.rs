//! Log record types
//!
//! - [`LogRecord`]: a stored log entry. Immutable once inserted.
//! - [`IncomingLog`]: the ingestion payload. Every field may be absent and a
//!   missing timestamp means "stamp it at ingestion".

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata key that is filterable as a first-class query field
pub const PARENT_RESOURCE_ID_KEY: &str = "parentResourceId";

/// Unix seconds of `0001-01-01T00:00:00Z`, the zero time clients send for
/// "no timestamp"
const ZERO_TIME_UNIX_SECS: i64 = -62_135_596_800;

/// True for the `0001-01-01T00:00:00Z` zero time
pub fn is_zero_time(time: &DateTime<Utc>) -> bool {
    time.timestamp() == ZERO_TIME_UNIX_SECS && time.timestamp_subsec_nanos() == 0
}

/// A stored log entry
///
/// Identifier fields are free-form; an empty string means absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Severity classification ("error", "info", ...). Free text.
    pub level: String,
    /// Message body
    pub message: String,
    /// Resource that emitted the log
    pub resource_id: String,
    /// When the log was produced
    pub timestamp: DateTime<Utc>,
    /// Distributed trace identifier
    pub trace_id: String,
    /// Span identifier within the trace
    pub span_id: String,
    /// Source revision of the emitter
    pub commit: String,
    /// Free-form string attributes
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl LogRecord {
    /// Create a record with the given level, message and timestamp
    pub fn new(
        level: impl Into<String>,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        LogRecord {
            level: level.into(),
            message: message.into(),
            resource_id: String::new(),
            timestamp,
            trace_id: String::new(),
            span_id: String::new(),
            commit: String::new(),
            metadata: HashMap::new(),
        }
    }

    /// Value of `metadata["parentResourceId"]`, empty when missing
    pub fn parent_resource_id(&self) -> &str {
        self.metadata
            .get(PARENT_RESOURCE_ID_KEY)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Set the resource id (builder pattern)
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = resource_id.into();
        self
    }

    /// Set the trace id (builder pattern)
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = trace_id.into();
        self
    }

    /// Set the span id (builder pattern)
    pub fn with_span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = span_id.into();
        self
    }

    /// Set the commit (builder pattern)
    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = commit.into();
        self
    }

    /// Set `metadata["parentResourceId"]` (builder pattern)
    pub fn with_parent_resource_id(mut self, parent: impl Into<String>) -> Self {
        self.metadata
            .insert(PARENT_RESOURCE_ID_KEY.to_string(), parent.into());
        self
    }

    /// Insert a metadata entry (builder pattern)
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Log payload as received at the ingestion boundary
///
/// Absent fields default to empty strings and an empty map. A `None` or
/// zero-time (`0001-01-01T00:00:00Z`) timestamp is replaced with the
/// current time when ingested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IncomingLog {
    /// See [`LogRecord::level`]
    pub level: String,
    /// See [`LogRecord::message`]
    pub message: String,
    /// See [`LogRecord::resource_id`]
    pub resource_id: String,
    /// `None` or the zero time means "stamp at ingestion"
    pub timestamp: Option<DateTime<Utc>>,
    /// See [`LogRecord::trace_id`]
    pub trace_id: String,
    /// See [`LogRecord::span_id`]
    pub span_id: String,
    /// See [`LogRecord::commit`]
    pub commit: String,
    /// See [`LogRecord::metadata`]
    pub metadata: HashMap<String, String>,
}

impl IncomingLog {
    /// Create a payload with level and message, no timestamp
    pub fn new(level: impl Into<String>, message: impl Into<String>) -> Self {
        IncomingLog {
            level: level.into(),
            message: message.into(),
            ..Default::default()
        }
    }

    /// Convert into a stored record, using `now` when no timestamp was supplied
    pub fn into_record(self, now: DateTime<Utc>) -> LogRecord {
        let timestamp = match self.timestamp {
            Some(time) if !is_zero_time(&time) => time,
            _ => now,
        };
        LogRecord {
            level: self.level,
            message: self.message,
            resource_id: self.resource_id,
            timestamp,
            trace_id: self.trace_id,
            span_id: self.span_id,
            commit: self.commit,
            metadata: self.metadata,
        }
    }
}

impl From<LogRecord> for IncomingLog {
    fn from(record: LogRecord) -> Self {
        IncomingLog {
            level: record.level,
            message: record.message,
            resource_id: record.resource_id,
            timestamp: Some(record.timestamp),
            trace_id: record.trace_id,
            span_id: record.span_id,
            commit: record.commit,
            metadata: record.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 9, 15, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_parent_resource_id_missing_is_empty() {
        let record = LogRecord::new("info", "hello", ts(8));
        assert_eq!(record.parent_resource_id(), "");

        let record = record.with_parent_resource_id("server-0987");
        assert_eq!(record.parent_resource_id(), "server-0987");
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = LogRecord::new("error", "Failed to connect to DB", ts(8))
            .with_resource_id("server-1234")
            .with_trace_id("abc-xyz-123")
            .with_span_id("span-456")
            .with_commit("5e5342f")
            .with_parent_resource_id("server-0987");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["resourceId"], "server-1234");
        assert_eq!(json["traceId"], "abc-xyz-123");
        assert_eq!(json["spanId"], "span-456");
        assert_eq!(json["metadata"]["parentResourceId"], "server-0987");
        assert_eq!(json["timestamp"], "2023-09-15T08:00:00Z");
    }

    #[test]
    fn test_incoming_missing_fields_default() {
        let incoming: IncomingLog = serde_json::from_str(r#"{"level":"info"}"#).unwrap();
        assert_eq!(incoming.level, "info");
        assert_eq!(incoming.message, "");
        assert!(incoming.timestamp.is_none());
        assert!(incoming.metadata.is_empty());
    }

    #[test]
    fn test_incoming_into_record_keeps_supplied_timestamp() {
        let mut incoming = IncomingLog::new("info", "hello");
        incoming.timestamp = Some(ts(8));
        let record = incoming.into_record(ts(12));
        assert_eq!(record.timestamp, ts(8));
    }

    #[test]
    fn test_incoming_into_record_fills_missing_timestamp() {
        let record = IncomingLog::new("info", "hello").into_record(ts(12));
        assert_eq!(record.timestamp, ts(12));
        assert_eq!(record.level, "info");
    }

    #[test]
    fn test_incoming_zero_time_is_stamped() {
        let incoming: IncomingLog =
            serde_json::from_str(r#"{"level":"info","timestamp":"0001-01-01T00:00:00Z"}"#).unwrap();
        let zero = incoming.timestamp.unwrap();
        assert!(is_zero_time(&zero));

        let record = incoming.into_record(ts(12));
        assert_eq!(record.timestamp, ts(12));
    }

    #[test]
    fn test_near_zero_time_is_kept() {
        let just_after = Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 1).unwrap();
        assert!(!is_zero_time(&just_after));

        let mut incoming = IncomingLog::new("info", "hello");
        incoming.timestamp = Some(just_after);
        assert_eq!(incoming.into_record(ts(12)).timestamp, just_after);
    }
}
