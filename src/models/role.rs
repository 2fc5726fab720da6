//! Role and permission domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role (static reference data, seeded by migration)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
    /// Denormalised small integer code, mirrored onto role assignments
    pub type_code: i32,
}

/// Named capability with a stable numeric id
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Permission {
    pub id: i64,
    pub name: String,
}

/// Link between a user and a role
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RoleAssignment {
    pub id: i64,
    pub user_id: i64,
    pub role_id: i64,
    /// Copy of the role's type code for fast filtering without a join
    pub type_code: i32,
    pub created_at: DateTime<Utc>,
}

/// A permission reference as accepted at the API boundary: clients may
/// send either the numeric id or the name. Resolved against the registry
/// exactly once; never passed further down untyped.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PermissionRef {
    ById(i64),
    ByName(String),
}

impl PermissionRef {
    /// Parse a path segment: all-digit strings are treated as ids
    pub fn parse(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(id) => PermissionRef::ById(id),
            Err(_) => PermissionRef::ByName(s.to_string()),
        }
    }
}

impl fmt::Display for PermissionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionRef::ById(id) => write!(f, "#{id}"),
            PermissionRef::ByName(name) => write!(f, "{name}"),
        }
    }
}

/// A grant row joined with its permission name
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GrantedPermission {
    pub id: i64,
    pub name: String,
    pub expires_at: DateTime<Utc>,
}

/// Bulk grant assignment request. An empty permission list is valid and
/// removes every grant the user currently holds.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignPermissionsRequest {
    pub user_id: i64,
    pub permissions: Vec<PermissionRef>,
    /// Expiry timestamp; RFC 3339 or `YYYY-MM-DD [HH:MM:SS]`
    pub expires_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_ref_parse_numeric() {
        assert_eq!(PermissionRef::parse("42"), PermissionRef::ById(42));
    }

    #[test]
    fn test_permission_ref_parse_name() {
        assert_eq!(
            PermissionRef::parse("crear_evento"),
            PermissionRef::ByName("crear_evento".to_string())
        );
    }

    #[test]
    fn test_permission_ref_deserializes_mixed_list() {
        let refs: Vec<PermissionRef> =
            serde_json::from_str(r#"[3, "crear_noticia", 7]"#).unwrap();
        assert_eq!(
            refs,
            vec![
                PermissionRef::ById(3),
                PermissionRef::ByName("crear_noticia".to_string()),
                PermissionRef::ById(7),
            ]
        );
    }

    #[test]
    fn test_assign_request_accepts_empty_list() {
        let req: AssignPermissionsRequest = serde_json::from_str(
            r#"{"userId": 42, "permissions": [], "expiresAt": "2030-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(req.user_id, 42);
        assert!(req.permissions.is_empty());
    }
}
