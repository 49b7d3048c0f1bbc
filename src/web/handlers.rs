//! HTTP request handlers

use super::state::AppState;
use crate::search::{SearchError, SearchRequest};
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::{future, StreamExt};
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Instant;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

/// Content type of streamed responses
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Query parameters for single-query search
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Search query
    pub q: Option<String>,
    /// Candidates to return
    pub limit: Option<usize>,
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = match self {
            SearchError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Batch search handler
pub async fn search(State(state): State<AppState>, Json(request): Json<SearchRequest>) -> Response {
    run_batch(state, request).await
}

/// Single-query search handler
pub async fn search_get(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let request = SearchRequest {
        queries: params.q.into_iter().collect(),
        limit: params.limit,
    };
    run_batch(state, request).await
}

async fn run_batch(state: AppState, request: SearchRequest) -> Response {
    let validated = match request.validate(&state.settings.search) {
        Ok(validated) => validated,
        Err(e) => {
            debug!("Rejected search request: {}", e);
            return e.into_response();
        }
    };

    let request_id = Uuid::new_v4();
    let span = info_span!("search", %request_id, mode = "batch");

    async move {
        state.metrics.inc_request();
        let start = Instant::now();
        let count = validated.queries.len();

        let result = state
            .dispatcher
            .dispatch(validated.queries, validated.limit)
            .collect_all()
            .await;

        info!(
            "Resolved {} queries ({} failed) with {} candidates in {:?}",
            count,
            result.failures.len(),
            result.candidates.len(),
            start.elapsed()
        );

        Json(result).into_response()
    }
    .instrument(span)
    .await
}

/// Streaming search handler
///
/// Each record is written as soon as its query resolves. When the client
/// goes away the body stream is dropped, which cancels the remaining queries.
pub async fn search_stream(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Response {
    let validated = match request.validate(&state.settings.search) {
        Ok(validated) => validated,
        Err(e) => {
            debug!("Rejected stream request: {}", e);
            return e.into_response();
        }
    };

    let request_id = Uuid::new_v4();
    let span = info_span!("search", %request_id, mode = "stream");

    let records = span.in_scope(|| {
        state.metrics.inc_request();
        info!(
            "Streaming {} queries (limit {})",
            validated.queries.len(),
            validated.limit
        );
        state
            .dispatcher
            .dispatch(validated.queries, validated.limit)
            .into_stream()
    });

    let records = records.filter_map(move |item| {
        let _enter = span.enter();
        let line = match item.to_ndjson() {
            Ok(line) => {
                debug!("Sending record for query {}", item.index());
                Some(Ok::<_, Infallible>(line))
            }
            Err(e) => {
                error!("Failed to encode record: {}", e);
                None
            }
        };
        future::ready(line)
    });

    (
        [(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)],
        Body::from_stream(records),
    )
        .into_response()
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "backend": state.backend_name(),
    }))
}

/// Stats handler
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}
