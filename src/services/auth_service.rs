//! Registration, login and token refresh

use crate::{
    auth::{JwtService, PasswordHasher, TokenPair},
    config::AppConfig,
    error::{AppError, Result},
    models::user::{
        AccountStatus, CreateUserRequest, LoginRequest, LoginResponse, RegisterRequest,
        RegisterResponse, User, UserRole, UserWithAccess,
    },
    repository::{RoleRepository, UserRepository},
    services::{grant_service::GrantService, validation_service::ValidationService},
};
use sqlx::PgPool;
use std::sync::Arc;

pub struct AuthService {
    pool: PgPool,
    config: Arc<AppConfig>,
    jwt: Arc<JwtService>,
    hasher: PasswordHasher,
    users: UserRepository,
    roles: RoleRepository,
    grants: GrantService,
}

impl AuthService {
    pub fn new(
        pool: PgPool,
        config: Arc<AppConfig>,
        jwt: Arc<JwtService>,
        users: UserRepository,
        roles: RoleRepository,
        grants: GrantService,
    ) -> Self {
        Self {
            pool,
            config,
            jwt,
            hasher: PasswordHasher::new(),
            users,
            roles,
            grants,
        }
    }

    /// Self-service registration. Applicants become active immediately
    /// with their role assigned; instructor and staff registrations are
    /// parked pending administrator validation. Administrator accounts
    /// cannot be created this way at all.
    pub async fn register(&self, req: RegisterRequest) -> Result<RegisterResponse> {
        let role = match req.role.as_deref() {
            None => UserRole::Applicant,
            Some(raw) => UserRole::parse(raw)
                .ok_or_else(|| AppError::validation(format!("Unknown role: {raw}")))?,
        };

        if role == UserRole::Administrator {
            return Err(AppError::validation(
                "Administrator accounts cannot be self-registered",
            ));
        }

        PasswordHasher::validate_password_policy(&req.password, &self.config)?;

        if self
            .users
            .exists_by_email_or_document(&req.email, &req.document)
            .await?
        {
            return Err(AppError::conflict("Email or document already registered"));
        }

        let password_hash = self.hasher.hash(&req.password)?;

        let requires_validation = role.requires_validation();
        let status = if requires_validation {
            AccountStatus::Pending
        } else {
            AccountStatus::Active
        };

        // One transaction covers the user row plus either the pending
        // validation request or the immediate role assignment, so no
        // account can end up half-registered.
        let mut tx = self.pool.begin().await?;

        let (user_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO users (first_name, last_name, email, document, password_hash, role, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(&req.email)
        .bind(&req.document)
        .bind(&password_hash)
        .bind(role.as_str())
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_write_error(e, "Email or document already registered"))?;

        if requires_validation {
            ValidationService::create_request(&mut *tx, user_id, role.as_str()).await?;
        } else {
            let registry_role: Option<(i64, i32)> =
                sqlx::query_as("SELECT id, type_code FROM roles WHERE name = $1")
                    .bind(role.as_str())
                    .fetch_optional(&mut *tx)
                    .await?;

            if let Some((role_id, type_code)) = registry_role {
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
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        tracing::info!(user_id, role = role.as_str(), requires_validation, "User registered");

        let message = if requires_validation {
            "Registration received; the account is pending administrator validation".to_string()
        } else {
            "Registration successful".to_string()
        };

        Ok(RegisterResponse {
            message,
            requires_validation,
        })
    }

    /// Administrative creation. The account comes up active with its
    /// role assigned, skipping the validation queue; the user row and
    /// the role assignment commit together or not at all.
    pub async fn create_user(&self, req: CreateUserRequest) -> Result<User> {
        let role = UserRole::parse(&req.role)
            .ok_or_else(|| AppError::validation(format!("Unknown role: {}", req.role)))?;

        PasswordHasher::validate_password_policy(&req.password, &self.config)?;

        if self
            .users
            .exists_by_email_or_document(&req.email, &req.document)
            .await?
        {
            return Err(AppError::conflict("Email or document already registered"));
        }

        let password_hash = self.hasher.hash(&req.password)?;

        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, email, document, password_hash, role, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'active')
            RETURNING id, first_name, last_name, email, document, password_hash,
                      role, status, photo_url, created_at, updated_at
            "#,
        )
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(&req.email)
        .bind(&req.document)
        .bind(&password_hash)
        .bind(role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_write_error(e, "Email or document already registered"))?;

        let registry_role: Option<(i64, i32)> =
            sqlx::query_as("SELECT id, type_code FROM roles WHERE name = $1")
                .bind(role.as_str())
                .fetch_optional(&mut *tx)
                .await?;

        if let Some((role_id, type_code)) = registry_role {
            sqlx::query(
                r#"
                INSERT INTO role_assignments (user_id, role_id, type_code)
                VALUES ($1, $2, $3)
                ON CONFLICT (user_id, role_id) DO NOTHING
                "#,
            )
            .bind(user.id)
            .bind(role_id)
            .bind(type_code)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(user_id = user.id, role = role.as_str(), "User created by administrator");

        Ok(user)
    }

    /// Authenticate and issue a token pair. Unknown email and wrong
    /// password produce the identical 401; inactive accounts get a 403
    /// that names the account status, but only after the password has
    /// been verified.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse> {
        let user = self
            .users
            .find_by_email(&req.email)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        if !self.hasher.verify(&req.password, &user.password_hash) {
            return Err(AppError::Unauthenticated);
        }

        self.ensure_active(&user)?;

        let (pair, roles, permissions) = self.issue_for(&user).await?;

        Ok(LoginResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in: pair.expires_in,
            user: UserWithAccess {
                user: user.into(),
                roles,
                permissions,
            },
        })
    }

    /// Exchange a refresh token for a fresh pair. The access snapshot is
    /// rebuilt from current data, so refreshing picks up role and grant
    /// changes made since login.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let user_id = self.jwt.verify_refresh_token(refresh_token)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::InvalidToken)?;

        self.ensure_active(&user)?;

        let (pair, _, _) = self.issue_for(&user).await?;

        Ok(pair)
    }

    fn ensure_active(&self, user: &User) -> Result<()> {
        match AccountStatus::parse(&user.status) {
            Some(AccountStatus::Active) => Ok(()),
            Some(status) => Err(AppError::AccountInactive(status.as_str().to_string())),
            None => {
                tracing::error!(user_id = user.id, status = %user.status, "Unknown account status");
                Err(AppError::AccountInactive(user.status.clone()))
            }
        }
    }

    async fn issue_for(&self, user: &User) -> Result<(TokenPair, Vec<String>, Vec<String>)> {
        let roles = self.roles.get_user_roles(user.id).await?;
        let permissions = self.grants.active_permission_names(user.id).await?;

        let pair = self.jwt.issue_token_pair(
            user.id,
            &user.email,
            &user.role,
            roles.clone(),
            permissions.clone(),
        )?;

        Ok((pair, roles, permissions))
    }
}
