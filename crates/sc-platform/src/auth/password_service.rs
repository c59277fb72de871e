//! Password Authentication Service
//!
//! Password hashing using Argon2id.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use tracing::debug;

use crate::shared::error::{PlatformError, Result};

/// Password policy configuration
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 6,
            max_length: 128,
        }
    }
}

impl PasswordPolicy {
    pub fn with_min_length(min_length: usize) -> Self {
        Self {
            min_length,
            ..Default::default()
        }
    }

    pub fn validate(&self, password: &str) -> std::result::Result<(), String> {
        let length = password.chars().count();
        if length < self.min_length {
            return Err(format!("Password must be at least {} characters", self.min_length));
        }
        if length > self.max_length {
            return Err(format!("Password must be at most {} characters", self.max_length));
        }
        Ok(())
    }
}

/// Argon2id configuration
#[derive(Debug, Clone)]
pub struct Argon2Config {
    /// Memory cost in KiB
    pub memory_cost: u32,
    pub time_cost: u32,
    pub parallelism: u32,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_cost: 19456, // 19 MiB
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl Argon2Config {
    /// Low memory config for tests
    pub fn testing() -> Self {
        Self {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }
}

pub struct PasswordService {
    argon2: Argon2<'static>,
    policy: PasswordPolicy,
}

impl PasswordService {
    pub fn new(config: Argon2Config, policy: PasswordPolicy) -> Result<Self> {
        let params = Params::new(config.memory_cost, config.time_cost, config.parallelism, None)
            .map_err(|e| PlatformError::internal(format!("Invalid Argon2 params: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        Ok(Self { argon2, policy })
    }

    /// Hash a password after checking it against the policy
    pub fn hash_password(&self, password: &str) -> Result<String> {
        self.policy.validate(password).map_err(PlatformError::validation)?;

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PlatformError::internal(format!("Failed to hash password: {}", e)))?;

        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PlatformError::internal(format!("Invalid password hash format: {}", e)))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => {
                debug!("Password verification failed");
                Ok(false)
            }
            Err(e) => Err(PlatformError::internal(format!("Password verification error: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PasswordService {
        PasswordService::new(Argon2Config::testing(), PasswordPolicy::default()).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let service = service();
        let hash = service.hash_password("hunter22").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(service.verify_password("hunter22", &hash).unwrap());
        assert!(!service.verify_password("hunter23", &hash).unwrap());
    }

    #[test]
    fn test_policy_rejects_short_password() {
        let err = service().hash_password("abc").unwrap_err();
        assert!(matches!(err, PlatformError::Validation { .. }));
    }

    #[test]
    fn test_garbage_hash_is_internal_error() {
        assert!(matches!(
            service().verify_password("x", "not-a-hash"),
            Err(PlatformError::Internal { .. })
        ));
    }
}
