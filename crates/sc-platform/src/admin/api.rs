//! Admin API
//!
//! Sign-in, user management, form review and the admin's saved message.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use super::repository::AdminRepository;
use crate::auth::{AuthService, PasswordService, Role};
use crate::form::{FormRepository, FormResponse};
use crate::shared::api_common::{DeletedResponse, MessageResponse, SignInRequest, SignInResponse};
use crate::shared::error::PlatformError;
use crate::shared::middleware::AdminAuth;
use crate::user::{User, UserRepository, UserResponse};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateUserResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetMessageRequest {
    pub message: Option<String>,
}

/// Saved message, absent until one has been set
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomMessageResponse {
    pub message: Option<String>,
}

#[derive(Clone)]
pub struct AdminState {
    pub admin_repo: Arc<AdminRepository>,
    pub user_repo: Arc<UserRepository>,
    pub form_repo: Arc<FormRepository>,
    pub auth_service: Arc<AuthService>,
    pub password_service: Arc<PasswordService>,
}

/// Sign in as an admin
#[utoipa::path(
    post,
    path = "/sign-in",
    tag = "admin",
    operation_id = "postApiAdminSignIn",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = SignInResponse),
        (status = 401, description = "Invalid username or password")
    )
)]
pub async fn sign_in(
    State(state): State<AdminState>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, PlatformError> {
    let admin = state
        .admin_repo
        .find_by_username(req.username.trim())
        .await?
        .ok_or(PlatformError::InvalidCredentials)?;

    if !state.password_service.verify_password(&req.password, &admin.password_hash)? {
        return Err(PlatformError::InvalidCredentials);
    }

    let token = state.auth_service.generate_access_token(&admin.id, Role::Admin)?;
    info!(admin_id = %admin.id, "Admin signed in");

    Ok(Json(SignInResponse {
        message: "Sign In successful".to_string(),
        token,
    }))
}

/// Create a form user owned by the calling admin
#[utoipa::path(
    post,
    path = "/create-user",
    tag = "admin",
    operation_id = "postApiAdminCreateUser",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = CreateUserResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Username taken")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<AdminState>,
    auth: AdminAuth,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreateUserResponse>), PlatformError> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(PlatformError::validation("Username is required"));
    }

    if state.user_repo.find_by_username(username).await?.is_some() {
        return Err(PlatformError::duplicate("User", "username", username));
    }

    let password_hash = state.password_service.hash_password(&req.password)?;
    let user = User::new(username, password_hash).with_admin(auth.admin_id());
    state.user_repo.insert(&user).await?;

    info!(user_id = %user.id, admin_id = %auth.admin_id(), "User created");

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            message: "User created successfully".to_string(),
            user: user.into(),
        }),
    ))
}

/// All submitted feedback forms
#[utoipa::path(
    get,
    path = "/forms",
    tag = "admin",
    operation_id = "getApiAdminForms",
    responses(
        (status = 200, description = "Forms", body = Vec<FormResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_forms(
    State(state): State<AdminState>,
    _auth: AdminAuth,
) -> Result<Json<Vec<FormResponse>>, PlatformError> {
    let forms = state.form_repo.find_all().await?;
    Ok(Json(forms.into_iter().map(FormResponse::from).collect()))
}

/// All form users
#[utoipa::path(
    get,
    path = "/users",
    tag = "admin",
    operation_id = "getApiAdminUsers",
    responses(
        (status = 200, description = "Users", body = Vec<UserResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<AdminState>,
    _auth: AdminAuth,
) -> Result<Json<Vec<UserResponse>>, PlatformError> {
    let users = state.user_repo.find_all().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Delete every form
#[utoipa::path(
    delete,
    path = "/delete/forms",
    tag = "admin",
    operation_id = "deleteApiAdminForms",
    responses(
        (status = 200, description = "Forms deleted", body = DeletedResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_forms(
    State(state): State<AdminState>,
    auth: AdminAuth,
) -> Result<Json<DeletedResponse>, PlatformError> {
    let deleted_count = state.form_repo.delete_all().await?;
    info!(deleted_count, admin_id = %auth.admin_id(), "Forms deleted");

    Ok(Json(DeletedResponse {
        message: "All forms deleted".to_string(),
        deleted_count,
    }))
}

/// Delete every form user
#[utoipa::path(
    delete,
    path = "/delete/users",
    tag = "admin",
    operation_id = "deleteApiAdminUsers",
    responses(
        (status = 200, description = "Users deleted", body = DeletedResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_users(
    State(state): State<AdminState>,
    auth: AdminAuth,
) -> Result<Json<DeletedResponse>, PlatformError> {
    let deleted_count = state.user_repo.delete_all().await?;
    info!(deleted_count, admin_id = %auth.admin_id(), "Users deleted");

    Ok(Json(DeletedResponse {
        message: "All users deleted".to_string(),
        deleted_count,
    }))
}

/// Save the calling admin's custom message
#[utoipa::path(
    post,
    path = "/set-message",
    tag = "admin",
    operation_id = "postApiAdminSetMessage",
    request_body = SetMessageRequest,
    responses(
        (status = 200, description = "Message saved", body = MessageResponse),
        (status = 400, description = "Message missing"),
        (status = 404, description = "Admin not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_message(
    State(state): State<AdminState>,
    auth: AdminAuth,
    Json(req): Json<SetMessageRequest>,
) -> Result<Json<MessageResponse>, PlatformError> {
    let message = req
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| PlatformError::validation("Message is required"))?;

    if !state.admin_repo.set_custom_message(auth.admin_id(), message).await? {
        return Err(PlatformError::not_found("Admin", auth.admin_id()));
    }

    Ok(Json(MessageResponse::new("Message updated successfully")))
}

/// The calling admin's custom message
#[utoipa::path(
    get,
    path = "/get-message",
    tag = "admin",
    operation_id = "getApiAdminGetMessage",
    responses(
        (status = 200, description = "Saved message", body = CustomMessageResponse),
        (status = 404, description = "Admin not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_message(
    State(state): State<AdminState>,
    auth: AdminAuth,
) -> Result<Json<CustomMessageResponse>, PlatformError> {
    let admin = state
        .admin_repo
        .find_by_id(auth.admin_id())
        .await?
        .ok_or_else(|| PlatformError::not_found("Admin", auth.admin_id()))?;

    Ok(Json(CustomMessageResponse {
        message: admin.custom_message,
    }))
}

pub fn admin_router(state: AdminState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(sign_in))
        .routes(routes!(create_user))
        .routes(routes!(list_forms))
        .routes(routes!(list_users))
        .routes(routes!(delete_forms))
        .routes(routes!(delete_users))
        .routes(routes!(set_message))
        .routes(routes!(get_message))
        .with_state(state)
}
