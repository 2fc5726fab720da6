//! Account validation endpoints (administrator only)

use crate::{
    auth::middleware::{require_administrator, AuthContext},
    error::AppError,
    middleware::AppState,
    models::validation::{ApproveValidationRequest, RejectValidationRequest},
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// GET /api/auth/pending-validations
pub async fn list_pending(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    require_administrator(&auth_context)?;

    let pending = state.validation_service.list_pending().await?;
    let count = pending.len();

    Ok(Json(json!({
        "pending": pending,
        "count": count,
    })))
}

/// POST /api/auth/validations/{id}/approve
///
/// The body is optional; approving without notes is the common case.
pub async fn approve(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(request_id): Path<i64>,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, AppError> {
    require_administrator(&auth_context)?;

    let notes = if body.is_empty() {
        None
    } else {
        serde_json::from_slice::<ApproveValidationRequest>(&body)
            .map_err(|_| AppError::validation("Invalid request body"))?
            .notes
    };

    let request = state
        .validation_service
        .approve(request_id, auth_context.user_id, notes)
        .await?;

    Ok(Json(json!({
        "message": "Validation request approved",
        "request": request,
    })))
}

/// POST /api/auth/validations/{id}/reject
pub async fn reject(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(request_id): Path<i64>,
    Json(body): Json<RejectValidationRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_administrator(&auth_context)?;

    let request = state
        .validation_service
        .reject(request_id, auth_context.user_id, body.notes)
        .await?;

    Ok(Json(json!({
        "message": "Validation request rejected",
        "request": request,
    })))
}
