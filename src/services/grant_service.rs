//! Time-bounded permission grants
//!
//! Grants are replace-on-write: each assignment wipes the user's
//! previous grant set inside one transaction and installs the new one,
//! all sharing a single expiry timestamp. Reads only ever see grants
//! whose expiry is strictly in the future.

use crate::{
    config::AppConfig,
    error::{AppError, Result},
    models::role::{GrantedPermission, PermissionRef},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Clone)]
pub struct GrantService {
    pool: PgPool,
    config: Arc<AppConfig>,
}

impl GrantService {
    pub fn new(pool: PgPool, config: Arc<AppConfig>) -> Self {
        Self { pool, config }
    }

    /// Replace a user's entire grant set with the given permissions,
    /// all expiring at `expires_at`. Returns the number of grants
    /// actually written; identifiers that resolve to no catalog entry
    /// are skipped with a warning rather than failing the batch.
    pub async fn assign(
        &self,
        user_id: i64,
        permissions: &[PermissionRef],
        expires_at: DateTime<Utc>,
    ) -> Result<u64> {
        if self.config.security.reject_past_expiry && expires_at <= Utc::now() {
            return Err(AppError::validation("Expiry must be in the future"));
        }

        let mut tx = self.pool.begin().await?;

        let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::not_found("User not found"));
        }

        sqlx::query("DELETE FROM permission_grants WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        // Resolve inside the transaction so the write set is consistent
        // with the catalog it was checked against.
        let mut seen = HashSet::new();
        let mut written = 0u64;
        for permission in permissions {
            let resolved: Option<(i64,)> = match permission {
                PermissionRef::ById(id) => {
                    sqlx::query_as("SELECT id FROM permissions WHERE id = $1")
                        .bind(id)
                        .fetch_optional(&mut *tx)
                        .await?
                }
                PermissionRef::ByName(name) => {
                    sqlx::query_as("SELECT id FROM permissions WHERE name = $1")
                        .bind(name)
                        .fetch_optional(&mut *tx)
                        .await?
                }
            };

            let Some((permission_id,)) = resolved else {
                tracing::warn!(user_id, permission = %permission, "Skipping unknown permission");
                continue;
            };

            if !seen.insert(permission_id) {
                continue;
            }

            sqlx::query(
                r#"
                INSERT INTO permission_grants (user_id, permission_id, expires_at)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(user_id)
            .bind(permission_id)
            .bind(expires_at)
            .execute(&mut *tx)
            .await?;
            written += 1;
        }

        tx.commit().await?;

        tracing::info!(user_id, count = written, %expires_at, "Permission grants replaced");

        Ok(written)
    }

    /// Unexpired grants for a user, alphabetical by permission name
    pub async fn active_permissions(&self, user_id: i64) -> Result<Vec<GrantedPermission>> {
        let grants = sqlx::query_as::<_, GrantedPermission>(
            r#"
            SELECT p.id, p.name, g.expires_at
            FROM permission_grants g
            JOIN permissions p ON p.id = g.permission_id
            WHERE g.user_id = $1 AND g.expires_at > NOW()
            ORDER BY p.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(grants)
    }

    /// Permission names for embedding into an access token snapshot
    pub async fn active_permission_names(&self, user_id: i64) -> Result<Vec<String>> {
        let grants = self.active_permissions(user_id).await?;
        Ok(grants.into_iter().map(|g| g.name).collect())
    }

    pub async fn has_permission(&self, user_id: i64, permission: &PermissionRef) -> Result<bool> {
        let found: Option<(i64,)> = match permission {
            PermissionRef::ById(id) => {
                sqlx::query_as(
                    r#"
                    SELECT g.permission_id
                    FROM permission_grants g
                    WHERE g.user_id = $1 AND g.permission_id = $2 AND g.expires_at > NOW()
                    "#,
                )
                .bind(user_id)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
            }
            PermissionRef::ByName(name) => {
                sqlx::query_as(
                    r#"
                    SELECT g.permission_id
                    FROM permission_grants g
                    JOIN permissions p ON p.id = g.permission_id
                    WHERE g.user_id = $1 AND p.name = $2 AND g.expires_at > NOW()
                    "#,
                )
                .bind(user_id)
                .bind(name)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        Ok(found.is_some())
    }

    pub async fn require_permission(&self, user_id: i64, permission: &PermissionRef) -> Result<()> {
        if self.has_permission(user_id, permission).await? {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Drop every grant a user holds. Returns false when there was
    /// nothing to remove.
    pub async fn revoke_all(&self, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM permission_grants WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Parse the expiry field from its accepted wire shapes: RFC 3339,
/// `YYYY-MM-DD HH:MM:SS` (taken as UTC), or a bare date (midnight UTC).
pub fn parse_expiry(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(AppError::validation(format!("Invalid expiry timestamp: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_expiry_rfc3339() {
        let dt = parse_expiry("2026-12-31T23:59:59Z").unwrap();
        assert_eq!(dt.year(), 2026);
        assert_eq!(dt.hour(), 23);
    }

    #[test]
    fn test_parse_expiry_rfc3339_with_offset() {
        let dt = parse_expiry("2026-12-31T23:00:00+02:00").unwrap();
        assert_eq!(dt.hour(), 21);
    }

    #[test]
    fn test_parse_expiry_space_separated() {
        let dt = parse_expiry("2026-06-15 08:30:00").unwrap();
        assert_eq!(dt.month(), 6);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_parse_expiry_bare_date() {
        let dt = parse_expiry("2026-06-15").unwrap();
        assert_eq!(dt.hour(), 0);
        assert_eq!(dt.day(), 15);
    }

    #[test]
    fn test_parse_expiry_garbage() {
        assert!(parse_expiry("soon").is_err());
        assert!(parse_expiry("").is_err());
    }
}
