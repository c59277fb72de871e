//! SMS Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmsError {
    #[error("Invalid phone number format. Please use 10-digit Indian mobile number.")]
    InvalidFormat,

    #[error("Invalid Indian mobile number. Must start with 6, 7, 8, or 9 and be 10 digits long.")]
    InvalidIndianMobileNumber,

    #[error("Message template {index} not found")]
    TemplateNotFound { index: usize },

    #[error("DLT credentials not configured (missing: {}). Refusing to use the promotional route.", .missing.join(", "))]
    MissingDltCredentials { missing: Vec<&'static str> },

    #[error("SMS gateway error after {attempts} attempts: {message}")]
    GatewaySendFailed { attempts: u32, message: String },

    #[error("No valid phone numbers found")]
    NoValidRecipients,

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, SmsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_message_lists_names() {
        let err = SmsError::MissingDltCredentials {
            missing: vec!["template_id", "entity_id"],
        };
        assert!(err.to_string().contains("template_id, entity_id"));
    }
}
