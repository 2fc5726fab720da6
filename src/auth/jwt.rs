//! JWT issuance and verification.
//! Access and refresh tokens are signed with independent secrets so that
//! compromise of one class cannot forge the other.
//!
//! Access-token claims are a snapshot taken at login: a permission revoked
//! afterwards stays visible in the claims until the token expires. Checks
//! that need current data must query the grant ledger instead.

use crate::{config::AppConfig, error::AppError};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Subject (user id, decimal string)
    pub sub: String,
    pub email: String,
    /// Primary role tag
    pub role: String,
    /// All role names held at login
    pub roles: Vec<String>,
    /// Active permission names at login (stale-by-design snapshot)
    pub permissions: Vec<String>,
    pub iat: i64,
    pub exp: i64,
    /// Unique token identifier
    pub jti: String,
}

/// Claims carried by refresh tokens; identity only
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Token pair response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the access token expires
    pub expires_in: u64,
}

/// JWT service
pub struct JwtService {
    access_encoding_key: EncodingKey,
    access_decoding_key: DecodingKey,
    refresh_encoding_key: EncodingKey,
    refresh_decoding_key: DecodingKey,
    access_token_exp_secs: u64,
    refresh_token_exp_secs: u64,
}

impl JwtService {
    /// Create JWT service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let access_secret = config.security.access_token_secret.expose_secret();
        let refresh_secret = config.security.refresh_token_secret.expose_secret();

        // HS256 needs at least 32 bytes of key material
        if access_secret.len() < 32 || refresh_secret.len() < 32 {
            return Err(AppError::Config(
                "Token secrets too short (min 32 chars)".to_string(),
            ));
        }

        Ok(Self {
            access_encoding_key: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding_key: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding_key: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding_key: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_token_exp_secs: config.security.access_token_exp_secs,
            refresh_token_exp_secs: config.security.refresh_token_exp_secs,
        })
    }

    /// Issue an access token embedding the caller's current access snapshot
    pub fn issue_access_token(
        &self,
        user_id: i64,
        email: &str,
        role: &str,
        roles: Vec<String>,
        permissions: Vec<String>,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now + Duration::seconds(self.access_token_exp_secs as i64);

        let claims = AccessClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            roles,
            permissions,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.access_encoding_key).map_err(|e| {
            tracing::error!("Failed to encode access token: {:?}", e);
            AppError::Internal("Failed to encode access token".to_string())
        })
    }

    /// Issue a refresh token carrying only the user id
    pub fn issue_refresh_token(&self, user_id: i64) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now + Duration::seconds(self.refresh_token_exp_secs as i64);

        let claims = RefreshClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.refresh_encoding_key).map_err(|e| {
            tracing::error!("Failed to encode refresh token: {:?}", e);
            AppError::Internal("Failed to encode refresh token".to_string())
        })
    }

    /// Issue both tokens at once
    pub fn issue_token_pair(
        &self,
        user_id: i64,
        email: &str,
        role: &str,
        roles: Vec<String>,
        permissions: Vec<String>,
    ) -> Result<TokenPair, AppError> {
        let access_token = self.issue_access_token(user_id, email, role, roles, permissions)?;
        let refresh_token = self.issue_refresh_token(user_id)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access_token_exp_secs,
        })
    }

    /// Verify an access token and return its claims
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AppError> {
        Ok(decode::<AccessClaims>(
            token,
            &self.access_decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| {
            tracing::debug!("Access token verification failed: {:?}", e);
            AppError::InvalidToken
        })?
        .claims)
    }

    /// Verify a refresh token and return the user id it names
    pub fn verify_refresh_token(&self, token: &str) -> Result<i64, AppError> {
        let claims = decode::<RefreshClaims>(
            token,
            &self.refresh_decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| {
            tracing::debug!("Refresh token verification failed: {:?}", e);
            AppError::InvalidToken
        })?
        .claims;

        claims.sub.parse::<i64>().map_err(|_| AppError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AppConfig, DatabaseConfig, LoggingConfig, SecurityConfig, ServerConfig,
    };
    use secrecy::Secret;

    fn test_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                addr: "127.0.0.1:3000".to_string(),
                graceful_shutdown_timeout_secs: 30,
            },
            database: DatabaseConfig {
                url: Secret::new("postgresql://localhost/test".to_string()),
                max_connections: 10,
                min_connections: 1,
                acquire_timeout_secs: 30,
                idle_timeout_secs: 600,
                max_lifetime_secs: 1800,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
            security: SecurityConfig {
                access_token_secret: Secret::new(
                    "test_access_secret_32_characters_long!!".to_string(),
                ),
                refresh_token_secret: Secret::new(
                    "test_refresh_secret_32_characters_long!".to_string(),
                ),
                access_token_exp_secs: 900,
                refresh_token_exp_secs: 604800,
                password_min_length: 6,
                reject_past_expiry: false,
                trust_proxy: true,
            },
        }
    }

    #[test]
    fn test_issue_and_verify_access_token() {
        let service = JwtService::from_config(&test_config()).unwrap();

        let token = service
            .issue_access_token(
                42,
                "a@x.com",
                "instructor",
                vec!["instructor".to_string()],
                vec!["crear_evento".to_string()],
            )
            .unwrap();

        let claims = service.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.role, "instructor");
        assert!(claims.permissions.contains(&"crear_evento".to_string()));
    }

    #[test]
    fn test_issue_and_verify_refresh_token() {
        let service = JwtService::from_config(&test_config()).unwrap();

        let token = service.issue_refresh_token(42).unwrap();
        assert_eq!(service.verify_refresh_token(&token).unwrap(), 42);
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let service = JwtService::from_config(&test_config()).unwrap();

        // Distinct secrets: an access token must not verify as a refresh
        // token, and vice versa
        let access = service
            .issue_access_token(1, "a@x.com", "applicant", vec![], vec![])
            .unwrap();
        assert!(service.verify_refresh_token(&access).is_err());

        let refresh = service.issue_refresh_token(1).unwrap();
        assert!(service.verify_access_token(&refresh).is_err());
    }

    #[test]
    fn test_invalid_token_fails() {
        let service = JwtService::from_config(&test_config()).unwrap();
        assert!(service.verify_access_token("invalid_token").is_err());
        assert!(service.verify_refresh_token("invalid_token").is_err());
    }
}
