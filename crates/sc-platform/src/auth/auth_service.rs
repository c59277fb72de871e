//! Authentication Service
//!
//! HS256 JWT issuance and validation for admin and user sessions.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::shared::error::{PlatformError, Result};

/// Who a token was issued to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    User,
}

/// JWT Claims for access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (admin or user id)
    pub sub: String,

    pub role: Role,

    /// Issuer
    pub iss: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Configuration for the auth service
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret_key: String,
    pub issuer: String,
    pub access_token_expiry_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            issuer: "securecore".to_string(),
            access_token_expiry_secs: 3600,
        }
    }
}

impl From<&sc_config::AuthConfig> for AuthConfig {
    fn from(config: &sc_config::AuthConfig) -> Self {
        Self {
            secret_key: config.jwt_secret.clone(),
            issuer: config.issuer.clone(),
            access_token_expiry_secs: config.token_expiry_secs as i64,
        }
    }
}

pub struct AuthService {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret_key.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret_key.as_bytes());

        info!(issuer = %config.issuer, "AuthService initialized with HS256");

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issue a token for `subject` with the given role.
    pub fn generate_access_token(&self, subject: &str, role: Role) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.access_token_expiry_secs);

        let claims = AccessTokenClaims {
            sub: subject.to_string(),
            role,
            iss: self.config.issuer.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| PlatformError::internal(format!("Failed to encode JWT: {}", e)))
    }

    /// Validate a token and extract its claims
    pub fn validate_token(&self, token: &str) -> Result<AccessTokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);

        decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => PlatformError::TokenExpired,
                _ => PlatformError::InvalidToken { message: e.to_string() },
            })
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(AuthConfig {
            secret_key: "test-secret".to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_generate_and_validate_token() {
        let service = service();
        let token = service.generate_access_token("admin-1", Role::Admin).unwrap();

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "admin-1");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.iss, "securecore");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service().generate_access_token("user-1", Role::User).unwrap();
        let other = AuthService::new(AuthConfig {
            secret_key: "another-secret".to_string(),
            ..Default::default()
        });

        assert!(matches!(
            other.validate_token(&token),
            Err(PlatformError::InvalidToken { .. })
        ));
    }

    #[test]
    fn test_expired_token() {
        let service = AuthService::new(AuthConfig {
            secret_key: "test-secret".to_string(),
            access_token_expiry_secs: -600,
            ..Default::default()
        });
        let token = service.generate_access_token("user-1", Role::User).unwrap();

        assert!(matches!(service.validate_token(&token), Err(PlatformError::TokenExpired)));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), None);
        assert_eq!(extract_bearer_token("Basic abc123"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }
}
