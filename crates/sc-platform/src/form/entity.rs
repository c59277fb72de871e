//! Feedback Form Entity

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One feedback submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    #[serde(rename = "_id")]
    pub id: String,

    /// Number as the submitter typed it
    pub contact_no: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_emoji: Option<String>,

    /// Submitting user
    pub user_id: String,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormResponse {
    pub id: String,
    pub contact_no: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_emoji: Option<String>,
    pub user_id: String,
    pub created_at: String,
}

impl From<Form> for FormResponse {
    fn from(form: Form) -> Self {
        Self {
            id: form.id,
            contact_no: form.contact_no,
            city: form.city,
            remarks: form.remarks,
            selected_emoji: form.selected_emoji,
            user_id: form.user_id,
            created_at: form.created_at.to_rfc3339(),
        }
    }
}
