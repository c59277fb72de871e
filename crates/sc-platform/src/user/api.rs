//! User API
//!
//! Sign-in, feedback submission and emoji selection for form users.

use axum::{extract::State, Json};
use chrono::Utc;
use sc_sms::{send_single, SmsGateway, TemplateCatalog};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use super::repository::UserRepository;
use crate::auth::{AuthService, PasswordService, Role};
use crate::form::{Form, FormRepository};
use crate::messaging::api::SendMessageResponse;
use crate::shared::api_common::{string_or_number, SignInRequest, SignInResponse};
use crate::shared::error::PlatformError;
use crate::shared::middleware::UserAuth;

/// Template sent to everyone who submits a form
const THANK_YOU_TEMPLATE: usize = 0;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFormRequest {
    #[serde(default, deserialize_with = "deserialize_contact")]
    #[schema(value_type = Option<String>)]
    pub contact_no: Option<String>,
    pub city: Option<String>,
    pub remarks: Option<String>,
    pub selected_emoji: Option<String>,
}

fn deserialize_contact<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "string_or_number::deserialize_string")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectEmojiRequest {
    pub selected_emoji: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectEmojiResponse {
    pub message: String,
    pub selected_emoji: String,
}

#[derive(Clone)]
pub struct UserState {
    pub user_repo: Arc<UserRepository>,
    pub form_repo: Arc<FormRepository>,
    pub auth_service: Arc<AuthService>,
    pub password_service: Arc<PasswordService>,
    pub gateway: Arc<dyn SmsGateway>,
    pub catalog: Arc<TemplateCatalog>,
}

/// Sign in as a form user
#[utoipa::path(
    post,
    path = "/sign-in",
    tag = "user",
    operation_id = "postApiUserSignIn",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = SignInResponse),
        (status = 401, description = "Invalid username or password")
    )
)]
pub async fn sign_in(
    State(state): State<UserState>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, PlatformError> {
    let user = state
        .user_repo
        .find_by_username(req.username.trim())
        .await?
        .ok_or(PlatformError::InvalidCredentials)?;

    if !state.password_service.verify_password(&req.password, &user.password_hash)? {
        return Err(PlatformError::InvalidCredentials);
    }

    let token = state.auth_service.generate_access_token(&user.id, Role::User)?;
    info!(user_id = %user.id, "User signed in");

    Ok(Json(SignInResponse {
        message: "Sign In successful".to_string(),
        token,
    }))
}

/// Save a feedback form and text the thank-you template to its contact number
#[utoipa::path(
    post,
    path = "/submit-form",
    tag = "user",
    operation_id = "postApiUserSubmitForm",
    request_body = SubmitFormRequest,
    responses(
        (status = 200, description = "Form saved and message sent", body = SendMessageResponse),
        (status = 400, description = "Missing or invalid contact number"),
        (status = 404, description = "User not found"),
        (status = 502, description = "Gateway failed after retries")
    ),
    security(("bearer_auth" = []))
)]
pub async fn submit_form(
    State(state): State<UserState>,
    auth: UserAuth,
    Json(req): Json<SubmitFormRequest>,
) -> Result<Json<SendMessageResponse>, PlatformError> {
    let contact_no = req
        .contact_no
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| PlatformError::validation("Contact number is required"))?;

    let user = state
        .user_repo
        .find_by_id(auth.user_id())
        .await?
        .ok_or_else(|| PlatformError::not_found("User", auth.user_id()))?;

    let form = Form {
        id: uuid::Uuid::new_v4().to_string(),
        contact_no: contact_no.clone(),
        city: req.city,
        remarks: req.remarks,
        selected_emoji: req.selected_emoji,
        user_id: user.id,
        created_at: Utc::now(),
    };
    state.form_repo.insert(&form).await?;
    info!(form_id = %form.id, user_id = %form.user_id, "Form submitted");

    let (number, receipt) = send_single(
        state.gateway.as_ref(),
        &state.catalog,
        &contact_no,
        THANK_YOU_TEMPLATE,
    )
    .await?;

    Ok(Json(SendMessageResponse::from_receipt(&number, receipt)))
}

/// Record the user's selected emoji
#[utoipa::path(
    post,
    path = "/select-emoji",
    tag = "user",
    operation_id = "postApiUserSelectEmoji",
    request_body = SelectEmojiRequest,
    responses(
        (status = 200, description = "Emoji saved", body = SelectEmojiResponse),
        (status = 400, description = "Emoji missing"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn select_emoji(
    State(state): State<UserState>,
    auth: UserAuth,
    Json(req): Json<SelectEmojiRequest>,
) -> Result<Json<SelectEmojiResponse>, PlatformError> {
    let emoji = req
        .selected_emoji
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| PlatformError::validation("Emoji type is required"))?;

    if !state.user_repo.set_selected_emoji(auth.user_id(), &emoji).await? {
        return Err(PlatformError::not_found("User", auth.user_id()));
    }

    Ok(Json(SelectEmojiResponse {
        message: "Emoji selected".to_string(),
        selected_emoji: emoji,
    }))
}

pub fn user_router(state: UserState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(sign_in))
        .routes(routes!(submit_form))
        .routes(routes!(select_emoji))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_number_accepts_numbers_and_strings() {
        let req: SubmitFormRequest =
            serde_json::from_str(r#"{"contactNo": 9125377622, "city": "Pune"}"#).unwrap();
        assert_eq!(req.contact_no.as_deref(), Some("9125377622"));

        let req: SubmitFormRequest = serde_json::from_str(r#"{"contactNo": "+91 91253 77622"}"#).unwrap();
        assert_eq!(req.contact_no.as_deref(), Some("+91 91253 77622"));

        let req: SubmitFormRequest = serde_json::from_str(r#"{"remarks": "great"}"#).unwrap();
        assert!(req.contact_no.is_none());
    }
}
