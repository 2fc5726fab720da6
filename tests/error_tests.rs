//! Error model unit tests

use axum::http::StatusCode;
use campus_access::error::AppError;

#[test]
fn test_error_status_codes() {
    assert_eq!(AppError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(
        AppError::AccountInactive("pending".to_string()).status_code(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        AppError::NotFound("resource".to_string()).status_code(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        AppError::Conflict("duplicate".to_string()).status_code(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        AppError::Validation("error".to_string()).status_code(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(AppError::RateLimitExceeded.status_code(), StatusCode::TOO_MANY_REQUESTS);
}

#[test]
fn test_database_error_status_code() {
    let app_error = AppError::Database(sqlx::Error::RowNotFound);
    assert_eq!(app_error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_from_write_error_keeps_non_constraint_failures() {
    // Only unique violations become conflicts; anything else stays a
    // database error
    let mapped = AppError::from_write_error(sqlx::Error::RowNotFound, "duplicate");
    assert!(matches!(mapped, AppError::Database(_)));
    assert_eq!(mapped.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_user_messages_no_sensitive_info() {
    let db_error = AppError::Database(sqlx::Error::RowNotFound);
    let message = db_error.user_message();
    assert_eq!(message, "Database error occurred");
    assert!(!message.to_lowercase().contains("sqlx"));
    assert!(!message.to_lowercase().contains("row"));

    let config_error = AppError::Config("Missing secret".to_string());
    let message = config_error.user_message();
    assert_eq!(message, "Configuration error");
    assert!(!message.contains("secret"));
}

#[test]
fn test_credential_failures_are_indistinguishable() {
    // Unknown email and wrong password must surface as the same message,
    // so clients cannot probe which accounts exist
    assert_eq!(AppError::Unauthenticated.user_message(), "Invalid credentials");
}

#[test]
fn test_account_inactive_messages_name_the_state() {
    let pending = AppError::AccountInactive("pending".to_string());
    assert!(pending.user_message().contains("pending"));

    let rejected = AppError::AccountInactive("rejected".to_string());
    assert!(rejected.user_message().contains("rejected"));
}

#[tokio::test]
async fn test_error_response_envelope() {
    use axum::response::IntoResponse;
    use http_body_util::BodyExt;

    let response = AppError::AccountInactive("pending".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["error"]["code"], 403);
    assert_eq!(body["error"]["accountStatus"], "pending");
    assert!(body["error"]["requestId"].is_string());
}

#[test]
fn test_from_sqlx_error() {
    let app_error: AppError = sqlx::Error::RowNotFound.into();
    assert!(matches!(app_error, AppError::Database(_)));
}

#[test]
fn test_from_validator_errors() {
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(email)]
        email: String,
    }

    let probe = Probe {
        email: "nope".to_string(),
    };
    let app_error: AppError = probe.validate().unwrap_err().into();
    assert_eq!(app_error.status_code(), StatusCode::BAD_REQUEST);
}
