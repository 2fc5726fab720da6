//! JWT authentication middleware and role gate

use crate::{auth::jwt::JwtService, error::AppError};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated identity attached to request extensions.
/// The roles/permissions lists are the token's login-time snapshot;
/// handlers that need current data must re-query the grant ledger.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: i64,
    pub email: String,
    pub role: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

impl AuthContext {
    pub fn is_administrator(&self) -> bool {
        self.role == "administrator" || self.roles.iter().any(|r| r == "administrator")
    }
}

// FromRequestParts lets handlers take AuthContext directly as an argument
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AppError::Unauthenticated)
    }
}

/// Extract the bearer token from the Authorization header
pub fn extract_token(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer ").map(|t| t.to_string()))
        .ok_or(AppError::Unauthenticated)
}

fn context_from_token(jwt_service: &JwtService, token: &str) -> Result<AuthContext, AppError> {
    let claims = jwt_service.verify_access_token(token)?;
    let user_id = claims.sub.parse::<i64>().map_err(|_| AppError::InvalidToken)?;

    Ok(AuthContext {
        user_id,
        email: claims.email,
        role: claims.role,
        roles: claims.roles,
        permissions: claims.permissions,
    })
}

/// Mandatory authentication: missing token rejects with 401
/// (Unauthenticated), a bad or expired token with InvalidToken.
pub async fn jwt_auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(req.headers())?;
    let auth_context = context_from_token(&jwt_service, &token)?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

/// Optional authentication: attaches a context when a valid token is
/// present and otherwise lets the request through unauthenticated, so
/// downstream logic can branch on identity presence.
pub async fn optional_auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Ok(token) = extract_token(req.headers()) {
        if let Ok(auth_context) = context_from_token(&jwt_service, &token) {
            req.extensions_mut().insert(auth_context);
        }
    }

    next.run(req).await
}

/// Coarse role gate over the token's role claims
pub fn require_role(ctx: &AuthContext, allowed: &[&str]) -> Result<(), AppError> {
    let held = allowed
        .iter()
        .any(|a| ctx.role == *a || ctx.roles.iter().any(|r| r == a));

    if !held {
        tracing::warn!(
            user_id = ctx.user_id,
            role = %ctx.role,
            required = ?allowed,
            "Role check failed"
        );
        return Err(AppError::Forbidden);
    }

    Ok(())
}

/// Administrator-only gate
pub fn require_administrator(ctx: &AuthContext) -> Result<(), AppError> {
    require_role(ctx, &["administrator"])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: &str, roles: Vec<&str>) -> AuthContext {
        AuthContext {
            user_id: 1,
            email: "a@x.com".to_string(),
            role: role.to_string(),
            roles: roles.into_iter().map(|s| s.to_string()).collect(),
            permissions: vec![],
        }
    }

    #[test]
    fn test_extract_token_valid() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer test_token_123".parse().unwrap());

        let token = extract_token(&headers).unwrap();
        assert_eq!(token, "test_token_123");
    }

    #[test]
    fn test_extract_token_missing() {
        let headers = HeaderMap::new();
        assert!(matches!(
            extract_token(&headers),
            Err(AppError::Unauthenticated)
        ));
    }

    #[test]
    fn test_extract_token_invalid_format() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "InvalidFormat".parse().unwrap());

        assert!(extract_token(&headers).is_err());
    }

    #[test]
    fn test_require_role_matches_primary_or_list() {
        let c = ctx("instructor", vec!["instructor"]);
        assert!(require_role(&c, &["instructor", "staff"]).is_ok());
        assert!(matches!(
            require_role(&c, &["administrator"]),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn test_require_administrator() {
        assert!(require_administrator(&ctx("administrator", vec![])).is_ok());
        assert!(require_administrator(&ctx("applicant", vec!["applicant"])).is_err());
    }
}
