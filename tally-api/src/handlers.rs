//! API route handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::dto::{CountResponse, HealthResponse, KeyQuery};
use crate::error::ApiError;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// Response header carrying the access count after this request.
pub const ACCESS_COUNT_HEADER: &str = "x-access-count";

/// Response header carrying `HIT` or `MISS`.
pub const CACHE_STATUS_HEADER: &str = "x-cache";

fn require_key(query: KeyQuery) -> Result<String> {
    query
        .key
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ApiError::validation("missing 'key' query parameter"))
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        store: state.cache.store().name().into(),
        ttl_seconds: state.cache.config().ttl_seconds,
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// GET /resource?key=<key>
pub async fn get_resource(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KeyQuery>,
) -> Result<Response> {
    let key = require_key(query)?;
    let lookup = state.cache.lookup(&key).await?;

    debug!(
        key = %key,
        outcome = %lookup.outcome,
        access_count = lookup.access_count,
        "Served resource"
    );

    Ok((
        StatusCode::OK,
        [
            ("content-type", "text/plain; charset=utf-8".to_string()),
            (ACCESS_COUNT_HEADER, lookup.access_count.to_string()),
            (CACHE_STATUS_HEADER, lookup.outcome.as_str().to_string()),
        ],
        lookup.value,
    )
        .into_response())
}

/// GET /api/v1/count?key=<key>
pub async fn get_count(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<CountResponse>> {
    let key = require_key(query)?;
    let count = state.cache.access_count(&key).await?;
    Ok(Json(CountResponse { key, count }))
}
