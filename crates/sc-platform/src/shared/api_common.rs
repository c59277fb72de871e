//! Common API types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Form clients send numbers either as JSON numbers or as strings.
pub(crate) mod string_or_number {
    use serde::{de, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNum {
        Num(u64),
        Str(String),
    }

    pub fn deserialize_string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match StringOrNum::deserialize(deserializer)? {
            StringOrNum::Num(n) => Ok(n.to_string()),
            StringOrNum::Str(s) => Ok(s),
        }
    }

    pub fn deserialize_usize_opt<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<StringOrNum>::deserialize(deserializer)? {
            Some(StringOrNum::Num(n)) => usize::try_from(n).map(Some).map_err(de::Error::custom),
            Some(StringOrNum::Str(s)) => s.trim().parse().map(Some).map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}

/// Plain acknowledgement
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Result of a bulk delete
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub message: String,
    pub deleted_count: u64,
}

/// Username and password sign-in body, shared by admins and users
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

/// Issued session token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignInResponse {
    pub message: String,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Probe {
        #[serde(deserialize_with = "string_or_number::deserialize_string")]
        phone_number: String,
        #[serde(default, deserialize_with = "string_or_number::deserialize_usize_opt")]
        index: Option<usize>,
    }

    #[test]
    fn test_string_or_number_fields() {
        let probe: Probe = serde_json::from_str(r#"{"phoneNumber": 9125377622, "index": "1"}"#).unwrap();
        assert_eq!(probe.phone_number, "9125377622");
        assert_eq!(probe.index, Some(1));

        let probe: Probe = serde_json::from_str(r#"{"phoneNumber": "+91 9125377622"}"#).unwrap();
        assert_eq!(probe.phone_number, "+91 9125377622");
        assert_eq!(probe.index, None);

        assert!(serde_json::from_str::<Probe>(r#"{"phoneNumber": "1", "index": "x"}"#).is_err());
    }
}
