//! Account validation workflow models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A request for administrative account validation. Exactly one pending
/// request is created per registration that needs review; resolution is
/// terminal (approved or rejected, never back to pending).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ValidationRequest {
    pub id: i64,
    pub user_id: i64,
    pub requested_role: String,
    /// pending, approved, rejected
    pub state: String,
    /// Administrator who resolved the request; null while pending
    pub resolved_by: Option<i64>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validation request state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValidationState {
    Pending,
    Approved,
    Rejected,
}

impl ValidationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationState::Pending => "pending",
            ValidationState::Approved => "approved",
            ValidationState::Rejected => "rejected",
        }
    }
}

/// Pending request joined with the requesting user's identity fields,
/// as shown to administrators (oldest first).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PendingValidation {
    pub id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub document: String,
    pub requested_role: String,
    pub created_at: DateTime<Utc>,
}

/// Approval body; notes are optional when approving
#[derive(Debug, Default, Deserialize)]
pub struct ApproveValidationRequest {
    pub notes: Option<String>,
}

/// Rejection body; notes are mandatory and must be non-blank
#[derive(Debug, Deserialize)]
pub struct RejectValidationRequest {
    pub notes: Option<String>,
}
