//! Authentication
//!
//! JWT sessions and password hashing.

pub mod auth_service;
pub mod password_service;

pub use auth_service::{extract_bearer_token, AccessTokenClaims, AuthConfig, AuthService, Role};
pub use password_service::{Argon2Config, PasswordPolicy, PasswordService};
