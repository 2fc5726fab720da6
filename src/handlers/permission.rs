//! Permission catalog and grant endpoints
//!
//! The whole surface requires only an authenticated caller; role-based
//! gating is not part of the grant-management contract.

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::role::{AssignPermissionsRequest, PermissionRef},
    services::grant_service,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// GET /api/permissions — the fixed catalog
pub async fn list_catalog(
    State(state): State<Arc<AppState>>,
    _auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let permissions = state.role_repo.list_permissions().await?;

    Ok(Json(json!({ "permissions": permissions })))
}

/// POST /api/permissions/assign — replace a user's grant set
pub async fn assign(
    State(state): State<Arc<AppState>>,
    _auth_context: AuthContext,
    Json(req): Json<AssignPermissionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let expires_at = grant_service::parse_expiry(&req.expires_at)?;

    let written = state
        .grant_service
        .assign(req.user_id, &req.permissions, expires_at)
        .await?;

    Ok(Json(json!({
        "message": "Permissions assigned",
        "userId": req.user_id,
        "assigned": written,
        "expiresAt": expires_at,
    })))
}

/// GET /api/permissions/user/{id} — a user's active grants
pub async fn user_permissions(
    State(state): State<Arc<AppState>>,
    _auth_context: AuthContext,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let permissions = state.grant_service.active_permissions(user_id).await?;

    Ok(Json(json!({
        "userId": user_id,
        "permissions": permissions,
    })))
}

/// GET /api/permissions/check/{user_id}/{permission} — does the user
/// hold it right now? Answered from the ledger, never from token
/// claims, so revocations are visible immediately. The permission
/// segment may be a numeric id or a name.
pub async fn check(
    State(state): State<Arc<AppState>>,
    _auth_context: AuthContext,
    Path((user_id, permission)): Path<(i64, String)>,
) -> Result<impl IntoResponse, AppError> {
    let reference = PermissionRef::parse(&permission);

    let held = state.grant_service.has_permission(user_id, &reference).await?;

    Ok(Json(json!({
        "userId": user_id,
        "permission": permission,
        "hasPermission": held,
    })))
}

/// DELETE /api/permissions/user/{id} — revoke every grant a user holds
pub async fn revoke_all(
    State(state): State<Arc<AppState>>,
    _auth_context: AuthContext,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let removed = state.grant_service.revoke_all(user_id).await?;

    if !removed {
        return Err(AppError::not_found("User has no permissions to revoke"));
    }

    Ok(Json(json!({
        "message": "Permissions revoked",
        "userId": user_id,
    })))
}
