//! Messaging API
//!
//! Admin endpoints for bulk broadcasts, single sends, the DLT template list
//! and delivery reports.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use sc_sms::{
    send_single, BatchResult, BatchSummary, BroadcastOrchestrator, SmsGateway, TemplateCatalog,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use super::spreadsheet;
use crate::shared::api_common::string_or_number;
use crate::shared::error::PlatformError;
use crate::shared::middleware::AdminAuth;

/// Single-recipient send request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// Indian mobile number in any common format
    #[serde(deserialize_with = "string_or_number::deserialize_string")]
    #[schema(value_type = String)]
    pub phone_number: String,

    /// Template index, defaults to 0
    #[serde(default, deserialize_with = "string_or_number::deserialize_usize_opt")]
    #[schema(value_type = Option<u32>)]
    pub index: Option<usize>,
}

/// Outcome of a single send
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendMessageResponse {
    pub message: String,
    pub request_id: String,
    pub fast2sms_response: String,
    /// Normalized 10-digit recipient
    pub sent_to: String,
    pub api_version: String,
    pub route_used: String,
}

impl SendMessageResponse {
    pub(crate) fn from_receipt(sent_to: &sc_sms::PhoneNumber, receipt: sc_sms::DispatchReceipt) -> Self {
        Self {
            message: "Message sent successfully".to_string(),
            request_id: receipt.request_id,
            fast2sms_response: receipt.provider_message.unwrap_or_else(|| "Success".to_string()),
            sent_to: sent_to.to_string(),
            api_version: receipt.api_version,
            route_used: receipt.route,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BroadcastResponse {
    pub message: String,
    #[schema(value_type = Object)]
    pub summary: BatchSummary,
    #[schema(value_type = Vec<Object>)]
    pub batch_results: Vec<BatchResult>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TemplatesResponse {
    pub message: Vec<String>,
}

#[derive(Clone)]
pub struct MessagingState {
    pub gateway: Arc<dyn SmsGateway>,
    pub catalog: Arc<TemplateCatalog>,
    pub orchestrator: Arc<BroadcastOrchestrator>,
    pub max_upload_bytes: usize,
}

fn multipart_error(e: impl std::fmt::Display) -> PlatformError {
    PlatformError::validation(format!("Invalid upload: {}", e))
}

/// Broadcast a template to every number in an uploaded spreadsheet
#[utoipa::path(
    post,
    path = "/broadcast",
    tag = "messaging",
    operation_id = "postApiAdminBroadcast",
    request_body(
        content = String,
        content_type = "multipart/form-data",
        description = "`file`: xlsx/xls/ods/csv upload, `index`: template index"
    ),
    responses(
        (status = 200, description = "Broadcast finished", body = BroadcastResponse),
        (status = 400, description = "Missing file, bad template index or no valid numbers"),
        (status = 503, description = "DLT credentials not configured")
    ),
    security(("bearer_auth" = []))
)]
pub async fn broadcast(
    State(state): State<MessagingState>,
    _auth: AdminAuth,
    mut multipart: Multipart,
) -> Result<Json<BroadcastResponse>, PlatformError> {
    let mut file: Option<(Option<String>, Bytes)> = None;
    let mut index: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().map(String::from);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((file_name, bytes));
            }
            Some("index") => index = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    let (file_name, bytes) = file.ok_or_else(|| PlatformError::validation("No file uploaded"))?;
    let template_index = index
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| PlatformError::validation("Template index is required"))?
        .parse::<usize>()
        .map_err(|_| PlatformError::validation("Template index must be a non-negative integer"))?;

    let rows = spreadsheet::parse_upload(file_name.as_deref(), &bytes)?;
    info!(rows = rows.len(), template_index, "Broadcast upload received");

    let summary = state.orchestrator.broadcast(&rows, template_index).await?;

    Ok(Json(BroadcastResponse {
        message: "Broadcast completed".to_string(),
        batch_results: summary.batches.clone(),
        summary,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

/// Send a template to one number
#[utoipa::path(
    post,
    path = "/send-message",
    tag = "messaging",
    operation_id = "postApiAdminSendMessage",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Message accepted by the gateway", body = SendMessageResponse),
        (status = 400, description = "Invalid number or template index"),
        (status = 502, description = "Gateway failed after retries")
    ),
    security(("bearer_auth" = []))
)]
pub async fn send_message(
    State(state): State<MessagingState>,
    _auth: AdminAuth,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, PlatformError> {
    if req.phone_number.trim().is_empty() {
        return Err(PlatformError::validation("Phone number is required"));
    }

    let (number, receipt) = send_single(
        state.gateway.as_ref(),
        &state.catalog,
        &req.phone_number,
        req.index.unwrap_or(0),
    )
    .await?;

    Ok(Json(SendMessageResponse::from_receipt(&number, receipt)))
}

/// List the DLT-registered templates
#[utoipa::path(
    get,
    path = "/dlt-message",
    tag = "messaging",
    operation_id = "getApiAdminDltMessage",
    responses(
        (status = 200, description = "Templates in index order", body = TemplatesResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn dlt_messages(State(state): State<MessagingState>, _auth: AdminAuth) -> Json<TemplatesResponse> {
    Json(TemplatesResponse {
        message: state.catalog.all().to_vec(),
    })
}

/// Look up the provider's delivery report for a request
#[utoipa::path(
    get,
    path = "/delivery-status/{request_id}",
    tag = "messaging",
    operation_id = "getApiAdminDeliveryStatus",
    params(
        ("request_id" = String, Path, description = "Gateway request id")
    ),
    responses(
        (status = 200, description = "Provider report JSON, passed through as received"),
        (status = 404, description = "No report available")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delivery_status(
    State(state): State<MessagingState>,
    _auth: AdminAuth,
    Path(request_id): Path<String>,
) -> Result<Json<serde_json::Value>, PlatformError> {
    state
        .gateway
        .delivery_report(&request_id)
        .await
        .map(Json)
        .ok_or_else(|| PlatformError::not_found("Delivery report", request_id))
}

pub fn messaging_router(state: MessagingState) -> OpenApiRouter {
    let upload_limit = state.max_upload_bytes;
    OpenApiRouter::new()
        .routes(routes!(broadcast))
        .routes(routes!(send_message))
        .routes(routes!(dlt_messages))
        .routes(routes!(delivery_status))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
