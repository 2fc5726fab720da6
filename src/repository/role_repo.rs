//! Role and permission registry

use crate::{
    error::Result,
    models::role::{Permission, PermissionRef, Role},
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT id, name, type_code FROM roles ORDER BY type_code",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    pub async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, type_code FROM roles WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    /// Fixed catalog listing, alphabetical by name
    pub async fn list_permissions(&self) -> Result<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT id, name FROM permissions ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }

    pub async fn find_permission(&self, permission: &PermissionRef) -> Result<Option<Permission>> {
        let found = match permission {
            PermissionRef::ById(id) => {
                sqlx::query_as::<_, Permission>("SELECT id, name FROM permissions WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            PermissionRef::ByName(name) => {
                sqlx::query_as::<_, Permission>("SELECT id, name FROM permissions WHERE name = $1")
                    .bind(name)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };

        Ok(found)
    }

    /// Role names currently assigned to a user
    pub async fn get_user_roles(&self, user_id: i64) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT r.name
            FROM role_assignments ra
            JOIN roles r ON r.id = ra.role_id
            WHERE ra.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Idempotent role assignment
    pub async fn assign_role(&self, user_id: i64, role_id: i64, type_code: i32) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO role_assignments (user_id, role_id, type_code)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, role_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role_id)
        .bind(type_code)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
