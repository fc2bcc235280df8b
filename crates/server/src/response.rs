//! Response bodies.

use serde::{Deserialize, Serialize};

use logbook_core::{LogRecord, QueryPage};

/// Body returned after a successful ingest
pub const INGESTED: &str = "Log ingested successfully";

/// `{"status": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Human-readable status
    pub status: String,
}

impl StatusResponse {
    /// Status body with `status`
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}

/// `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable cause
    pub error: String,
}

/// `{"logs": [...], "count": n}`; `count` is the size of this page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Records on this page
    pub logs: Vec<LogRecord>,
    /// Number of records on this page
    pub count: usize,
}

impl From<QueryPage> for QueryResponse {
    fn from(page: QueryPage) -> Self {
        Self {
            logs: page.records,
            count: page.count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_query_response_shape() {
        let record = LogRecord::new(
            "error",
            "Failed to connect to DB",
            Utc.with_ymd_and_hms(2023, 9, 15, 8, 0, 0).unwrap(),
        )
        .with_resource_id("server-1234");
        let body = serde_json::to_value(QueryResponse::from(QueryPage::new(vec![record]))).unwrap();

        assert_eq!(body["count"], 1);
        assert_eq!(body["logs"][0]["resourceId"], "server-1234");
        assert_eq!(body["logs"][0]["timestamp"], "2023-09-15T08:00:00Z");
    }

    #[test]
    fn test_status_body() {
        let body = serde_json::to_string(&StatusResponse::new(INGESTED)).unwrap();
        assert_eq!(body, r#"{"status":"Log ingested successfully"}"#);
    }
}
