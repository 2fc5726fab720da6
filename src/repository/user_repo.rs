//! User persistence

use crate::{
    error::{AppError, Result},
    models::user::{UpdateProfileRequest, User},
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, document, password_hash,
                   role, status, photo_url, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, document, password_hash,
                   role, status, photo_url, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Duplicate check for registration: email and document are both unique
    pub async fn exists_by_email_or_document(&self, email: &str, document: &str) -> Result<bool> {
        let found: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM users WHERE email = $1 OR document = $2 LIMIT 1",
        )
        .bind(email)
        .bind(document)
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.is_some())
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, document, password_hash,
                   role, status, photo_url, created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn update_profile(&self, id: i64, req: &UpdateProfileRequest) -> Result<User> {
        // Document and photo keep their current value when omitted
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET first_name = $2,
                last_name  = $3,
                email      = $4,
                document   = COALESCE($5, document),
                photo_url  = COALESCE($6, photo_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, first_name, last_name, email, document, password_hash,
                      role, status, photo_url, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(&req.email)
        .bind(req.document.as_deref())
        .bind(req.photo_url.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::from_write_error(e, "Email or document already in use"))?
        .ok_or_else(|| AppError::not_found("User not found"))?;

        Ok(user)
    }

    pub async fn update_status(&self, id: i64, status: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User not found"));
        }

        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User not found"));
        }

        Ok(())
    }
}
