//! API router assembly

use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::admin::{admin_router, AdminState};
use crate::messaging::{messaging_router, MessagingState};
use crate::user::{user_router, UserState};

/// `/api/admin` and `/api/user` routes plus their collected OpenAPI document.
pub fn api_router(admin: AdminState, user: UserState, messaging: MessagingState) -> (Router, OpenApi) {
    let (router, mut openapi) = OpenApiRouter::new()
        .nest("/api/admin", admin_router(admin).merge(messaging_router(messaging)))
        .nest("/api/user", user_router(user))
        .split_for_parts();

    openapi.info.title = "SecureCore API".to_string();
    openapi.info.version = env!("CARGO_PKG_VERSION").to_string();
    openapi.info.description = Some("Feedback forms, user management and DLT SMS broadcasts".to_string());

    let components = openapi.components.get_or_insert_with(Default::default);
    components.add_security_scheme(
        "bearer_auth",
        SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
    );

    (router, openapi)
}
