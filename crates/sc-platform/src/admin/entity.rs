//! Admin Entity

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operator account that manages users and sends broadcasts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: String,

    pub username: String,

    /// Argon2id PHC string
    pub password_hash: String,

    /// Free-text message the admin keeps for later use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_message: Option<String>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Admin {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.into(),
            password_hash: password_hash.into(),
            custom_message: None,
            created_at: Utc::now(),
        }
    }
}
