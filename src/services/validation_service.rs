//! Account validation workflow
//!
//! Instructor and staff registrations land in a pending queue that an
//! administrator resolves. Resolution locks the request row so two
//! administrators cannot race each other to a double decision.

use crate::{
    error::{AppError, Result},
    models::validation::{PendingValidation, ValidationRequest, ValidationState},
};
use sqlx::{PgExecutor, PgPool};

#[derive(Clone)]
pub struct ValidationService {
    pool: PgPool,
}

impl ValidationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pending request. Takes an executor so registration can
    /// run it inside the same transaction that creates the user row.
    pub async fn create_request<'e, E>(
        executor: E,
        user_id: i64,
        requested_role: &str,
    ) -> Result<i64>
    where
        E: PgExecutor<'e>,
    {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO validation_requests (user_id, requested_role, state)
            VALUES ($1, $2, 'pending')
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(requested_role)
        .fetch_one(executor)
        .await?;

        Ok(id)
    }

    /// Pending queue, oldest first, with enough applicant detail for an
    /// administrator to decide without a second lookup
    pub async fn list_pending(&self) -> Result<Vec<PendingValidation>> {
        let pending = sqlx::query_as::<_, PendingValidation>(
            r#"
            SELECT vr.id, vr.user_id, u.first_name, u.last_name, u.email,
                   u.document, vr.requested_role, vr.created_at
            FROM validation_requests vr
            JOIN users u ON u.id = vr.user_id
            WHERE vr.state = 'pending'
            ORDER BY vr.created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(pending)
    }

    /// Approve a pending request: mark it approved, activate the
    /// account, and grant the requested role, atomically.
    pub async fn approve(
        &self,
        request_id: i64,
        admin_id: i64,
        notes: Option<String>,
    ) -> Result<ValidationRequest> {
        let mut tx = self.pool.begin().await?;

        let request = Self::lock_pending(&mut tx, request_id).await?;

        let updated = sqlx::query_as::<_, ValidationRequest>(
            r#"
            UPDATE validation_requests
            SET state = 'approved', resolved_by = $2, resolved_at = NOW(), notes = $3
            WHERE id = $1
            RETURNING id, user_id, requested_role, state, resolved_by, resolved_at,
                      notes, created_at
            "#,
        )
        .bind(request_id)
        .bind(admin_id)
        .bind(notes.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET status = 'active', updated_at = NOW() WHERE id = $1")
            .bind(request.user_id)
            .execute(&mut *tx)
            .await?;

        let role: Option<(i64, i32)> =
            sqlx::query_as("SELECT id, type_code FROM roles WHERE name = $1")
                .bind(&request.requested_role)
                .fetch_optional(&mut *tx)
                .await?;

        match role {
            Some((role_id, type_code)) => {
                sqlx::query(
                    r#"
                    INSERT INTO role_assignments (user_id, role_id, type_code)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (user_id, role_id) DO NOTHING
                    "#,
                )
                .bind(request.user_id)
                .bind(role_id)
                .bind(type_code)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                tracing::warn!(
                    request_id,
                    role = %request.requested_role,
                    "Requested role missing from registry, approval proceeds without assignment"
                );
            }
        }

        tx.commit().await?;

        tracing::info!(request_id, user_id = request.user_id, admin_id, "Validation approved");

        Ok(updated)
    }

    /// Reject a pending request. Notes are mandatory so the applicant
    /// gets a reason; the check runs before any database work.
    pub async fn reject(
        &self,
        request_id: i64,
        admin_id: i64,
        notes: Option<String>,
    ) -> Result<ValidationRequest> {
        let notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::validation("Rejection notes are required"))?;

        let mut tx = self.pool.begin().await?;

        let request = Self::lock_pending(&mut tx, request_id).await?;

        let updated = sqlx::query_as::<_, ValidationRequest>(
            r#"
            UPDATE validation_requests
            SET state = 'rejected', resolved_by = $2, resolved_at = NOW(), notes = $3
            WHERE id = $1
            RETURNING id, user_id, requested_role, state, resolved_by, resolved_at,
                      notes, created_at
            "#,
        )
        .bind(request_id)
        .bind(admin_id)
        .bind(&notes)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET status = 'rejected', updated_at = NOW() WHERE id = $1")
            .bind(request.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(request_id, user_id = request.user_id, admin_id, "Validation rejected");

        Ok(updated)
    }

    /// Lock the request row and verify it is still undecided
    async fn lock_pending(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        request_id: i64,
    ) -> Result<ValidationRequest> {
        let request = sqlx::query_as::<_, ValidationRequest>(
            r#"
            SELECT id, user_id, requested_role, state, resolved_by, resolved_at,
                   notes, created_at
            FROM validation_requests
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(request_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::not_found("Validation request not found"))?;

        if request.state != ValidationState::Pending.as_str() {
            return Err(AppError::conflict("Validation request already processed"));
        }

        Ok(request)
    }
}
