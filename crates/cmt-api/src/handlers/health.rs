//! Health check handlers
//!
//! Endpoints for liveness and readiness probes.

use axum::{extract::State, http::StatusCode, Json};
use cmt_service::dto::{HealthResponse, ReadinessResponse};

use crate::state::AppState;

/// Liveness probe
#[utoipa::path(get, path = "/health", tag = "health",
    responses((status = 200, body = HealthResponse)))]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Readiness probe, fails while the database is unreachable
#[utoipa::path(get, path = "/health/ready", tag = "health",
    responses(
        (status = 200, body = ReadinessResponse),
        (status = 503, body = ReadinessResponse),
    ))]
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let database = state.pool().acquire().await.is_ok();

    let status = if database {
        StatusCode::OK
    } else {
        tracing::warn!("Readiness probe failed to reach the database");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(ReadinessResponse::new(database)))
}
