//! HTTP route handlers.
//!
//! Store calls are synchronous, so each one runs on the blocking pool
//! under an [`OpContext`] carrying the configured deadline. If the client
//! goes away first, the context is cancelled.

use std::time::Duration;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use tracing::error;

use logbook_core::{IncomingLog, LogQuery, OpContext};
use logbook_ingest::IngestionService;

use crate::error::ApiError;
use crate::request::QueryParams;
use crate::response::{QueryResponse, StatusResponse, INGESTED};

/// Shared application state.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Ingestion service over the configured store
    pub service: IngestionService,
    /// Deadline for one insert
    pub insert_timeout: Duration,
    /// Deadline for one query
    pub query_timeout: Duration,
}

/// Cancels the wrapped context when the request future is dropped
struct CancelOnDrop(OpContext);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Handle POST /
pub async fn handle_ingest(
    State(state): State<AppState>,
    payload: Result<Json<IncomingLog>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(incoming) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let ctx = OpContext::with_timeout(state.insert_timeout);
    let _guard = CancelOnDrop(ctx.clone());
    let service = state.service.clone();

    tokio::task::spawn_blocking(move || service.ingest(&ctx, incoming))
        .await?
        .map_err(|e| {
            error!(error = %e, "Error inserting log");
            ApiError::from(e)
        })?;

    Ok(Json(StatusResponse::new(INGESTED)))
}

/// Handle GET /logs
pub async fn handle_query(
    State(state): State<AppState>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let mut query = LogQuery::try_from(params)?;

    let ctx = OpContext::with_timeout(state.query_timeout);
    let _guard = CancelOnDrop(ctx.clone());
    let service = state.service.clone();

    let page = tokio::task::spawn_blocking(move || service.query(&ctx, &mut query))
        .await?
        .map_err(|e| {
            error!(error = %e, "Error querying logs");
            ApiError::Query(e)
        })?;

    Ok(Json(QueryResponse::from(page)))
}

/// Handle GET /-/healthy
pub async fn handle_healthy() -> Json<StatusResponse> {
    Json(StatusResponse::new("ok"))
}
