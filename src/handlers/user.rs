//! User profile and administrative user management endpoints

use crate::{
    auth::middleware::{require_administrator, AuthContext},
    error::AppError,
    middleware::AppState,
    models::user::{CreateUserRequest, UpdateProfileRequest, UserResponse, UserWithAccess},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

/// GET /api/users/profile — the caller's profile with current roles and
/// active permissions
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .user_repo
        .find_by_id(auth_context.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let roles = state.role_repo.get_user_roles(user.id).await?;
    let permissions = state.grant_service.active_permission_names(user.id).await?;

    Ok(Json(UserWithAccess {
        user: user.into(),
        roles,
        permissions,
    }))
}

/// PUT /api/users/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let user = state
        .user_repo
        .update_profile(auth_context.user_id, &req)
        .await?;

    Ok(Json(json!({
        "message": "Profile updated",
        "user": UserResponse::from(user),
    })))
}

/// GET /api/users (administrator)
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    require_administrator(&auth_context)?;

    let users = state.user_repo.list().await?;
    let users: Vec<UserResponse> = users.into_iter().map(|u| u.into()).collect();
    let count = users.len();

    Ok(Json(json!({
        "users": users,
        "count": count,
    })))
}

/// GET /api/users/{id} (administrator)
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    require_administrator(&auth_context)?;

    let user = state
        .user_repo
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let roles = state.role_repo.get_user_roles(user.id).await?;
    let permissions = state.grant_service.active_permission_names(user.id).await?;

    Ok(Json(UserWithAccess {
        user: user.into(),
        roles,
        permissions,
    }))
}

/// POST /api/users (administrator) — direct creation, the account comes
/// up active with its role assigned, skipping the validation queue
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_administrator(&auth_context)?;
    req.validate()?;

    let user = state.auth_service.create_user(req).await?;

    tracing::info!(user_id = user.id, admin_id = auth_context.user_id, "User created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created",
            "user": UserResponse::from(user),
        })),
    ))
}

/// PUT /api/users/{id} (administrator) — edit another user's identity
/// fields
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_administrator(&auth_context)?;
    req.validate()?;

    let user = state.user_repo.update_profile(user_id, &req).await?;

    tracing::info!(user_id, admin_id = auth_context.user_id, "User updated");

    Ok(Json(json!({
        "message": "User updated",
        "user": UserResponse::from(user),
    })))
}

/// DELETE /api/users/{id} (administrator)
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    require_administrator(&auth_context)?;

    if user_id == auth_context.user_id {
        return Err(AppError::validation("Cannot delete your own account"));
    }

    state.user_repo.delete(user_id).await?;

    tracing::info!(user_id, admin_id = auth_context.user_id, "User deleted");

    Ok(Json(json!({ "message": "User deleted" })))
}
