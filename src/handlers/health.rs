//! Liveness and readiness probes

use crate::{db, middleware::AppState};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

/// Liveness: the process is up
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness: the database answers
pub async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match db::health_check(&state.db).await {
        db::HealthStatus::Healthy => (
            StatusCode::OK,
            Json(json!({ "status": "ready", "database": "up" })),
        ),
        db::HealthStatus::Unhealthy(reason) => {
            tracing::error!(reason = %reason, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "not_ready", "database": "down" })),
            )
        }
    }
}
