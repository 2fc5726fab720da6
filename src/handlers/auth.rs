//! Authentication endpoints

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::user::{LoginRequest, RefreshTokenRequest, RegisterRequest},
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let response = state.auth_service.register(req).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let response = state.auth_service.login(req).await?;

    Ok(Json(response))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pair = state.auth_service.refresh(&req.refresh_token).await?;

    Ok(Json(pair))
}

/// GET /api/auth/permissions — the caller's current roles and active
/// grants, read from the store rather than the (possibly stale) token
/// snapshot
pub async fn my_permissions(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let roles = state.role_repo.get_user_roles(auth_context.user_id).await?;
    let permissions = state
        .grant_service
        .active_permissions(auth_context.user_id)
        .await?;

    Ok(Json(json!({
        "userId": auth_context.user_id,
        "roles": roles,
        "permissions": permissions,
    })))
}
