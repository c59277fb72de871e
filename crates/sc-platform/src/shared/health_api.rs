//! Health Check Endpoint

use axum::{routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always `UP` while the process serves requests
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}

pub fn health_router() -> Router {
    Router::new().route("/health", get(health))
}
