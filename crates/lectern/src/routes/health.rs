//! Health check endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Basic health check (is the server running?)
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct ReadyResponse {
    status: &'static str,
    storage: bool,
}

/// Readiness check (is the storage backend reachable?)
pub async fn ready_check(
    State(state): State<AppState>,
) -> Result<Json<ReadyResponse>, StatusCode> {
    match state.store.ping().await {
        Ok(()) => Ok(Json(ReadyResponse {
            status: "ready",
            storage: true,
        })),
        Err(err) => {
            tracing::warn!(error = %err, "Storage not ready");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
