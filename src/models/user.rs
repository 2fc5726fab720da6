//! User domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// National identity document number, unique like the email
    pub document: String,
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Primary role tag: applicant, instructor, staff, administrator
    pub role: String,
    /// Account state: active, pending, rejected
    pub status: String,

    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Closed set of roles a user can hold
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Applicant,
    Instructor,
    Staff,
    Administrator,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Applicant => "applicant",
            UserRole::Instructor => "instructor",
            UserRole::Staff => "staff",
            UserRole::Administrator => "administrator",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "applicant" => Some(UserRole::Applicant),
            "instructor" => Some(UserRole::Instructor),
            "staff" => Some(UserRole::Staff),
            "administrator" => Some(UserRole::Administrator),
            _ => None,
        }
    }

    /// Fixed numeric code stored on role assignments for fast filtering
    pub fn type_code(&self) -> i32 {
        match self {
            UserRole::Applicant => 1,
            UserRole::Instructor => 2,
            UserRole::Staff => 3,
            UserRole::Administrator => 4,
        }
    }

    /// Instructor and staff accounts must be approved by an administrator
    /// before they become active.
    pub fn requires_validation(&self) -> bool {
        matches!(self, UserRole::Instructor | UserRole::Staff)
    }
}

/// Account status enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Pending,
    Rejected,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Pending => "pending",
            AccountStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(AccountStatus::Active),
            "pending" => Some(AccountStatus::Pending),
            "rejected" => Some(AccountStatus::Rejected),
            _ => None,
        }
    }
}

/// Registration request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "first name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last name is required"))]
    pub last_name: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, message = "document is required"))]
    pub document: String,
    /// Defaults to applicant when omitted
    pub role: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    pub password: String,
}

/// Refresh request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Administrative user creation; the account is created active and the
/// role assignment is written directly, bypassing validation.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "first name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last name is required"))]
    pub last_name: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, message = "document is required"))]
    pub document: String,
    pub role: String,
}

/// Profile update (self-service)
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "first name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last name is required"))]
    pub last_name: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    /// Current document is kept when omitted
    pub document: Option<String>,
    pub photo_url: Option<String>,
}

/// User response (without sensitive data)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub document: String,
    pub role: String,
    pub status: String,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            document: user.document,
            role: user.role,
            status: user.status,
            photo_url: user.photo_url,
            created_at: user.created_at,
        }
    }
}

/// User plus the access snapshot embedded in tokens at login
#[derive(Debug, Serialize)]
pub struct UserWithAccess {
    #[serde(flatten)]
    pub user: UserResponse,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

/// Registration outcome
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub requires_validation: bool,
}

/// Login outcome
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub user: UserWithAccess,
}
