//! User Entity

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Field account that submits feedback forms
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,

    pub username: String,

    pub password_hash: String,

    /// Admin that created this user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_emoji: Option<String>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.into(),
            password_hash: password_hash.into(),
            admin_id: None,
            selected_emoji: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_admin(mut self, admin_id: impl Into<String>) -> Self {
        self.admin_id = Some(admin_id.into());
        self
    }
}

/// User as returned by the API, without the password hash
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_emoji: Option<String>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            admin_id: user.admin_id,
            selected_emoji: user.selected_emoji,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_drops_password_hash() {
        let user = User::new("asha", "$argon2id$secret").with_admin("admin-1");
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();

        assert_eq!(json["username"], "asha");
        assert_eq!(json["adminId"], "admin-1");
        assert!(json.get("passwordHash").is_none());
    }

    #[test]
    fn test_document_shape() {
        let user = User::new("asha", "hash");
        let doc = bson::to_document(&user).unwrap();

        assert_eq!(doc.get_str("_id").unwrap(), user.id);
        assert_eq!(doc.get_str("passwordHash").unwrap(), "hash");
        assert!(doc.get_datetime("createdAt").is_ok());
        assert!(!doc.contains_key("selectedEmoji"));
    }
}
