//! Unified error model.
//! Every failure that crosses the HTTP boundary is an `AppError`; the
//! response envelope never leaks internals (SQL, hashes, stack traces).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or wrong credential. The message is identical for unknown
    /// email and wrong password so account existence cannot be probed.
    #[error("Authentication failed")]
    Unauthenticated,

    /// Malformed, forged or expired token
    #[error("Invalid token")]
    InvalidToken,

    #[error("Access denied")]
    Forbidden,

    /// Account exists but is not active; carries the status so the client
    /// knows whether it is pending review or was rejected.
    #[error("Account is not active: {0}")]
    AccountInactive(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::AccountInactive(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// User-facing message, stripped of anything sensitive
    pub fn user_message(&self) -> String {
        match self {
            AppError::Unauthenticated => "Invalid credentials".to_string(),
            AppError::InvalidToken => "Invalid or expired token".to_string(),
            AppError::Forbidden => "Access denied".to_string(),
            AppError::AccountInactive(status) => match status.as_str() {
                "pending" => {
                    "Your account is pending validation by an administrator".to_string()
                }
                "rejected" => {
                    "Your account request has been rejected. Contact an administrator"
                        .to_string()
                }
                other => format!("Your account is not active ({other})"),
            },
            AppError::NotFound(msg) => format!("Resource not found: {msg}"),
            AppError::Conflict(msg) => msg.clone(),
            AppError::Validation(msg) => msg.clone(),
            AppError::RateLimitExceeded => "Rate limit exceeded".to_string(),
            AppError::Database(_) => "Database error occurred".to_string(),
            AppError::Config(_) => "Configuration error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }

    pub fn code(&self) -> u16 {
        self.status_code().as_u16()
    }

    // Convenience constructors
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// Map a write error, surfacing a unique-constraint violation as
    /// `Conflict` instead of a generic database failure. Pre-read
    /// duplicate checks race with concurrent writers; the constraint is
    /// the authority.
    pub fn from_write_error(e: sqlx::Error, duplicate_msg: &str) -> Self {
        match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::conflict(duplicate_msg)
            }
            other => AppError::Database(other),
        }
    }
}

/// Error response DTO
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: u16,
    pub message: String,
    #[serde(rename = "requestId")]
    pub request_id: String,
    /// Present only on `AccountInactive` so the client can branch on it
    #[serde(rename = "accountStatus", skip_serializing_if = "Option::is_none")]
    pub account_status: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        let account_status = match &self {
            AppError::AccountInactive(s) => Some(s.clone()),
            _ => None,
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code(),
                message: self.user_message(),
                request_id,
                account_status,
            },
        };

        tracing::error!(
            code = self.code(),
            message = %self,
            request_id = %error_response.error.request_id,
            "Application error"
        );

        (status, Json(error_response)).into_response()
    }
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Config(s)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::Unauthenticated.code(), 401);
        assert_eq!(AppError::InvalidToken.code(), 401);
        assert_eq!(AppError::Forbidden.code(), 403);
        assert_eq!(AppError::AccountInactive("pending".to_string()).code(), 403);
        assert_eq!(AppError::NotFound("test".to_string()).code(), 404);
        assert_eq!(AppError::Conflict("duplicate".to_string()).code(), 409);
        assert_eq!(AppError::Validation("test".to_string()).code(), 400);
        assert_eq!(AppError::RateLimitExceeded.code(), 429);
    }

    #[test]
    fn test_user_message_no_sensitive_info() {
        let error = AppError::Database(sqlx::Error::RowNotFound);
        let message = error.user_message();
        assert_eq!(message, "Database error occurred");
        assert!(!message.contains("sqlx"));
    }

    #[test]
    fn test_credential_errors_are_indistinguishable() {
        // Unknown email and wrong password must surface identically
        assert_eq!(
            AppError::Unauthenticated.user_message(),
            "Invalid credentials"
        );
    }
}
