//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "securecore.toml",
    "./config/config.toml",
    "/etc/securecore/config.toml",
];

pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        self.load_with_env(|key| env::var(key).ok())
    }

    /// Same as [`ConfigLoader::load`] with an explicit variable lookup.
    pub fn load_with_env<F>(&self, lookup: F) -> Result<AppConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match self.find_config_file(&lookup) {
            Some(path) => {
                info!(?path, "Loading configuration from file");
                AppConfig::from_file(&path)?
            }
            None => AppConfig::default(),
        };

        apply_env_overrides(&mut config, &lookup);
        Ok(config)
    }

    fn find_config_file<F>(&self, lookup: &F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        if let Some(path) = lookup("SECURECORE_CONFIG").map(PathBuf::from) {
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// First non-empty value among the given variable names.
fn first_set<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter()
        .filter_map(|key| lookup(key))
        .find(|value| !value.trim().is_empty())
}

fn apply_env_overrides<F>(config: &mut AppConfig, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    // HTTP
    if let Some(port) = first_set(lookup, &["SECURECORE_HTTP_PORT", "PORT"]).and_then(|v| v.parse().ok()) {
        config.http.port = port;
    }
    if let Some(val) = first_set(lookup, &["SECURECORE_HTTP_HOST"]) {
        config.http.host = val;
    }
    if let Some(val) = first_set(lookup, &["SECURECORE_CORS_ORIGINS"]) {
        config.http.cors_origins = val.split(',').map(|s| s.trim().to_string()).collect();
    }

    // MongoDB
    if let Some(val) = first_set(lookup, &["SECURECORE_MONGODB_URI", "MONGO_URI"]) {
        config.mongodb.uri = val;
    }
    if let Some(val) = first_set(lookup, &["SECURECORE_MONGODB_DATABASE"]) {
        config.mongodb.database = val;
    }

    // Auth
    if let Some(val) = first_set(lookup, &["SECURECORE_JWT_SECRET", "SECRET_KEY"]) {
        config.auth.jwt_secret = val;
    }
    if let Some(expiry) = first_set(lookup, &["SECURECORE_TOKEN_EXPIRY_SECS"]).and_then(|v| v.parse().ok()) {
        config.auth.token_expiry_secs = expiry;
    }
    if let Some(val) = first_set(lookup, &["SECURECORE_ADMIN_USERNAME"]) {
        config.auth.bootstrap_admin_username = Some(val);
    }
    if let Some(val) = first_set(lookup, &["SECURECORE_ADMIN_PASSWORD"]) {
        config.auth.bootstrap_admin_password = Some(val);
    }

    // SMS gateway
    if let Some(val) = first_set(lookup, &["SECURECORE_SMS_API_KEY", "FAST2SMS_API_KEY"]) {
        config.sms.api_key = Some(val);
    }
    if let Some(val) = first_set(lookup, &["SECURECORE_SMS_SENDER_ID", "FAST2SMS_SENDER_ID"]) {
        config.sms.sender_id = Some(val);
    }
    if let Some(val) = first_set(lookup, &["SECURECORE_SMS_TEMPLATE_ID", "FAST2SMS_TEMPLATE_ID"]) {
        config.sms.template_id = Some(val);
    }
    if let Some(val) = first_set(lookup, &["SECURECORE_SMS_ENTITY_ID", "FAST2SMS_ENTITY_ID"]) {
        config.sms.entity_id = Some(val);
    }
    if let Some(val) = first_set(lookup, &["SECURECORE_SMS_BASE_URL"]) {
        config.sms.base_url = val.trim_end_matches('/').to_string();
    }
    if let Some(size) = first_set(lookup, &["SECURECORE_SMS_BATCH_SIZE"]).and_then(|v| v.parse().ok()) {
        config.sms.batch_size = size;
    }
    if let Some(secs) = first_set(lookup, &["SECURECORE_SMS_BATCH_DELAY_SECS"]).and_then(|v| v.parse().ok()) {
        config.sms.batch_delay_secs = secs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_legacy_env_names_apply() {
        let loader = ConfigLoader::with_path("/nonexistent/securecore.toml");
        let config = loader
            .load_with_env(env_of(&[
                ("FAST2SMS_API_KEY", "key-123"),
                ("FAST2SMS_SENDER_ID", "SCSPLY"),
                ("FAST2SMS_TEMPLATE_ID", "1707"),
                ("FAST2SMS_ENTITY_ID", "1201"),
                ("SECRET_KEY", "jwt-secret"),
                ("PORT", "8081"),
            ]))
            .unwrap();

        assert_eq!(config.sms.api_key.as_deref(), Some("key-123"));
        assert_eq!(config.sms.sender_id.as_deref(), Some("SCSPLY"));
        assert_eq!(config.auth.jwt_secret, "jwt-secret");
        assert_eq!(config.http.port, 8081);
        assert_eq!(config.sms.entity_id.as_deref(), Some("1201"));
    }

    #[test]
    fn test_prefixed_env_wins_over_legacy() {
        let loader = ConfigLoader::with_path("/nonexistent/securecore.toml");
        let config = loader
            .load_with_env(env_of(&[
                ("SECURECORE_SMS_API_KEY", "primary"),
                ("FAST2SMS_API_KEY", "legacy"),
                ("SECURECORE_SMS_BASE_URL", "http://localhost:9999/"),
            ]))
            .unwrap();

        assert_eq!(config.sms.api_key.as_deref(), Some("primary"));
        assert_eq!(config.sms.base_url, "http://localhost:9999");
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let loader = ConfigLoader::with_path("/nonexistent/securecore.toml");
        let config = loader
            .load_with_env(env_of(&[("FAST2SMS_SENDER_ID", "  ")]))
            .unwrap();
        assert!(config.sms.sender_id.is_none());
    }

    #[test]
    fn test_file_then_env_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [mongodb]
            database = "feedback"

            [sms]
            batch_size = 50
            "#
        )
        .unwrap();

        let loader = ConfigLoader::with_path(file.path());
        let config = loader
            .load_with_env(env_of(&[("SECURECORE_SMS_BATCH_SIZE", "25")]))
            .unwrap();

        assert_eq!(config.mongodb.database, "feedback");
        assert_eq!(config.sms.batch_size, 25);
    }
}
