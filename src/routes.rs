//! Route registration

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};

use crate::{handlers, middleware::AppState};

// Large enough for base64 profile photos in update requests
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Build the application router from an already-wired state
pub fn create_router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready));

    // Credential endpoints: unauthenticated, under the stricter limiter
    let credential_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::login_rate_limit_middleware,
        ));

    let authenticated_routes = Router::new()
        // Caller's own access
        .route("/api/auth/permissions", get(handlers::auth::my_permissions))
        // Account validation queue (administrator)
        .route(
            "/api/auth/pending-validations",
            get(handlers::validation::list_pending),
        )
        .route(
            "/api/auth/validations/{id}/approve",
            post(handlers::validation::approve),
        )
        .route(
            "/api/auth/validations/{id}/reject",
            post(handlers::validation::reject),
        )
        // Permission catalog and grants
        .route("/api/permissions", get(handlers::permission::list_catalog))
        .route("/api/permissions/assign", post(handlers::permission::assign))
        .route(
            "/api/permissions/user/{id}",
            get(handlers::permission::user_permissions)
                .delete(handlers::permission::revoke_all),
        )
        .route(
            "/api/permissions/check/{user_id}/{permission}",
            get(handlers::permission::check),
        )
        // Profiles and user management
        .route(
            "/api/users/profile",
            get(handlers::user::get_profile).put(handlers::user::update_profile),
        )
        .route(
            "/api/users",
            get(handlers::user::list_users).post(handlers::user::create_user),
        )
        .route(
            "/api/users/{id}",
            get(handlers::user::get_user)
                .put(handlers::user::update_user)
                .delete(handlers::user::delete_user),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.jwt_service.clone(),
            crate::auth::middleware::jwt_auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(credential_routes)
        .merge(authenticated_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::rate_limit_middleware,
        ))
        .layer(axum::middleware::from_fn(
            crate::middleware::request_tracking_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}
