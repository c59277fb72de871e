//! API Middleware
//!
//! Bearer-token authentication for Axum. `AuthLayer` puts the shared
//! [`AppState`] into request extensions; the [`AdminAuth`] and [`UserAuth`]
//! extractors read it back and validate the caller's token and role.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::auth::{extract_bearer_token, AccessTokenClaims, AuthService, Role};
use crate::shared::error::ErrorResponse;

/// Application state shared by every request
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
}

/// Error response for authentication failures
#[derive(Debug)]
pub struct AuthError {
    pub status: StatusCode,
    pub message: String,
}

impl AuthError {
    fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: "UNAUTHORIZED".to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

fn authenticate(parts: &Parts, role: Role) -> Result<AccessTokenClaims, AuthError> {
    let app_state = parts.extensions.get::<AppState>().ok_or_else(|| AuthError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: "Auth service not configured".to_string(),
    })?;

    let token = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or_else(|| AuthError::unauthorized("Missing authentication token"))?;

    let claims = app_state
        .auth_service
        .validate_token(token)
        .map_err(|e| AuthError::unauthorized(e.to_string()))?;

    if claims.role != role {
        return Err(AuthError::unauthorized("Token does not grant access to this resource"));
    }

    Ok(claims)
}

/// Authenticated admin
#[derive(Debug, Clone)]
pub struct AdminAuth(pub AccessTokenClaims);

impl AdminAuth {
    pub fn admin_id(&self) -> &str {
        &self.0.sub
    }
}

impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        authenticate(parts, Role::Admin).map(AdminAuth)
    }
}

/// Authenticated form user
#[derive(Debug, Clone)]
pub struct UserAuth(pub AccessTokenClaims);

impl UserAuth {
    pub fn user_id(&self) -> &str {
        &self.0.sub
    }
}

impl<S> FromRequestParts<S> for UserAuth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        authenticate(parts, Role::User).map(UserAuth)
    }
}

/// Middleware layer that injects AppState into request extensions
#[derive(Clone)]
pub struct AuthLayer {
    state: AppState,
}

impl AuthLayer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    state: AppState,
}

impl<S, B> Service<axum::http::Request<B>> for AuthMiddleware<S>
where
    S: Service<axum::http::Request<B>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        req.extensions_mut().insert(self.state.clone());
        Box::pin(self.inner.call(req))
    }
}
