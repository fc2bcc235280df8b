//! Error type for HTTP API responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use logbook_core::Error;
use logbook_ingest::IngestError;

use crate::response::ErrorResponse;

/// Failure of one request, rendered as `{"error": "..."}`
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request could not be parsed
    #[error("{0}")]
    BadRequest(String),

    /// The store rejected an insert
    #[error("Failed to insert log: {}", cause(.0.storage_error()))]
    Ingest(#[from] IngestError),

    /// The store failed a query
    #[error("Failed to query logs")]
    Query(#[source] Error),

    /// The blocking task running the store call died
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Ingest(e) if e.is_cancellation() => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Query(e) if e.is_cancellation() => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Query(Error::InvalidQuery(_)) => StatusCode::BAD_REQUEST,
            ApiError::Ingest(_) | ApiError::Query(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Query(Error::InvalidQuery(detail)) => format!("Invalid query: {}", detail),
            other => other.to_string(),
        }
    }
}

/// Backend failure text without the variant prefix
fn cause(err: &Error) -> String {
    match err {
        Error::Storage(msg) => msg.clone(),
        other => other.to_string(),
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message(),
        };
        (self.status(), Json(body)).into_response()
    }
}
