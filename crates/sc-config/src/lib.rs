//! SecureCore Configuration System
//!
//! TOML-based configuration with environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub mongodb: MongoConfig,
    pub auth: AuthConfig,
    pub sms: SmsConfig,
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reject settings the server cannot run with.
    ///
    /// Missing DLT credentials are not rejected here: account and form
    /// endpoints keep working and every SMS dispatch fails on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.jwt_secret must be set (SECRET_KEY)".to_string(),
            ));
        }
        if self.sms.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "sms.batch_size must be greater than zero".to_string(),
            ));
        }
        if self.sms.templates.iter().all(|t| t.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "sms.templates must contain at least one message".to_string(),
            ));
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
    /// Upload limit for broadcast spreadsheets
    pub max_upload_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            host: "0.0.0.0".to_string(),
            cors_origins: Vec::new(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// MongoDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "securecore".to_string(),
        }
    }
}

/// Token and account settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub jwt_secret: String,
    pub issuer: String,
    pub token_expiry_secs: i64,
    pub min_password_length: usize,
    /// Admin account created at startup when absent
    pub bootstrap_admin_username: Option<String>,
    pub bootstrap_admin_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            issuer: "securecore".to_string(),
            token_expiry_secs: 3600,
            min_password_length: 6,
            bootstrap_admin_username: None,
            bootstrap_admin_password: None,
        }
    }
}

/// Fast2SMS gateway and broadcast settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub sender_id: Option<String>,
    pub template_id: Option<String>,
    pub entity_id: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Retry n waits `retry_delay_secs * n`
    pub retry_delay_secs: u64,
    pub report_timeout_secs: u64,
    pub batch_size: usize,
    pub batch_delay_secs: u64,
    /// DLT-registered message bodies, addressed by index
    pub templates: Vec<String>,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://www.fast2sms.com".to_string(),
            sender_id: None,
            template_id: None,
            entity_id: None,
            timeout_secs: 15,
            max_retries: 2,
            retry_delay_secs: 3,
            report_timeout_secs: 12,
            batch_size: 30,
            batch_delay_secs: 3,
            templates: default_templates(),
        }
    }
}

pub fn default_templates() -> Vec<String> {
    vec![
        "Thank You for submitting your feedback. Detailed google form link is down below: Regards SECURECORE SUPPLY".to_string(),
        "Thank You {#VAR#} for submitting your feedback. Detailed google form link is down below:\n\nRegards\nSECURECORE SUPPLY".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.http.port, 5000);
        assert_eq!(config.sms.batch_size, 30);
        assert_eq!(config.sms.max_retries, 2);
        assert_eq!(config.sms.timeout_secs, 15);
        assert_eq!(config.sms.templates.len(), 2);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = AppConfig::from_toml(
            r#"
            [http]
            port = 9000

            [sms]
            sender_id = "SCSPLY"
            batch_size = 10
            templates = ["Hello"]
            "#,
        )
        .unwrap();

        assert_eq!(config.http.port, 9000);
        assert_eq!(config.http.host, "0.0.0.0");
        assert_eq!(config.sms.sender_id.as_deref(), Some("SCSPLY"));
        assert_eq!(config.sms.batch_size, 10);
        assert_eq!(config.sms.templates, vec!["Hello".to_string()]);
        assert_eq!(config.mongodb.database, "securecore");
    }

    #[test]
    fn test_validate() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_err());

        config.auth.jwt_secret = "secret".to_string();
        assert!(config.validate().is_ok());

        config.sms.batch_size = 0;
        assert!(config.validate().is_err());

        config.sms.batch_size = 30;
        config.sms.templates = vec![" ".to_string()];
        assert!(config.validate().is_err());
    }
}
