//! Platform Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use sc_sms::SmsError;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    #[error("{entity_type} with {field} '{value}' already exists")]
    Duplicate { entity_type: String, field: String, value: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    #[error(transparent)]
    Sms(#[from] SmsError),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PlatformError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(entity_type: impl Into<String>, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type: entity_type.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            PlatformError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            PlatformError::Duplicate { .. } => (StatusCode::CONFLICT, "DUPLICATE"),
            PlatformError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            PlatformError::InvalidCredentials
            | PlatformError::TokenExpired
            | PlatformError::InvalidToken { .. } => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            PlatformError::Sms(err) => match err {
                SmsError::InvalidFormat
                | SmsError::InvalidIndianMobileNumber
                | SmsError::TemplateNotFound { .. }
                | SmsError::NoValidRecipients => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                SmsError::MissingDltCredentials { .. } => (StatusCode::SERVICE_UNAVAILABLE, "SMS_NOT_CONFIGURED"),
                SmsError::GatewaySendFailed { .. } => (StatusCode::BAD_GATEWAY, "SMS_GATEWAY_ERROR"),
                SmsError::Http(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Error response body
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
