//! Fast2SMS Gateway Client
//!
//! Sends DLT-compliant SMS through the Fast2SMS bulkV2 API:
//! - `dlt_manual` route only; missing credentials are a hard error
//! - 15s timeout per attempt
//! - Up to `max_retries` retries, retry n waiting `retry_base_delay * n`
//! - Success requires both a truthy `return` flag and a `request_id`
//!
//! Recipient numbers never reach the logs: the payload's `Debug` output
//! hides them.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{Result, SmsError};
use crate::phone::{join_numbers, PhoneNumber};
use crate::template::TemplateCatalog;

pub const DLT_ROUTE: &str = "dlt_manual";
pub const API_VERSION: &str = "v2";
const SEND_PATH: &str = "/dev/bulkV2";

/// Trait for SMS dispatch, implemented by the Fast2SMS client and by test fakes.
#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Send one request, retrying transient failures.
    async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchReceipt>;

    /// Delivery report for a previously accepted request, if the provider has one.
    async fn delivery_report(&self, request_id: &str) -> Option<Value>;
}

/// Gateway client configuration
#[derive(Debug, Clone)]
pub struct SmsGatewayConfig {
    /// Provider root, e.g. `https://www.fast2sms.com`
    pub base_url: String,
    pub api_key: Option<String>,
    pub sender_id: Option<String>,
    pub template_id: Option<String>,
    pub entity_id: Option<String>,
    /// Per-attempt request timeout
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub report_timeout: Duration,
}

impl Default for SmsGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.fast2sms.com".to_string(),
            api_key: None,
            sender_id: None,
            template_id: None,
            entity_id: None,
            timeout: Duration::from_secs(15),
            max_retries: 2,
            retry_base_delay: Duration::from_secs(3),
            report_timeout: Duration::from_secs(12),
        }
    }
}

impl From<&sc_config::SmsConfig> for SmsGatewayConfig {
    fn from(config: &sc_config::SmsConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            sender_id: config.sender_id.clone(),
            template_id: config.template_id.clone(),
            entity_id: config.entity_id.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            retry_base_delay: Duration::from_secs(config.retry_delay_secs),
            report_timeout: Duration::from_secs(config.report_timeout_secs),
        }
    }
}

impl SmsGatewayConfig {
    /// Names of the credentials that are missing or blank.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        [
            ("api_key", &self.api_key),
            ("sender_id", &self.sender_id),
            ("template_id", &self.template_id),
            ("entity_id", &self.entity_id),
        ]
        .into_iter()
        .filter(|(_, value)| non_blank(value).is_none())
        .map(|(name, _)| name)
        .collect()
    }

    fn credentials(&self) -> Result<Credentials<'_>> {
        match (
            non_blank(&self.api_key),
            non_blank(&self.sender_id),
            non_blank(&self.template_id),
            non_blank(&self.entity_id),
        ) {
            (Some(api_key), Some(sender_id), Some(template_id), Some(entity_id)) => Ok(Credentials {
                api_key,
                sender_id,
                template_id,
                entity_id,
            }),
            _ => Err(SmsError::MissingDltCredentials {
                missing: self.missing_credentials(),
            }),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

struct Credentials<'a> {
    api_key: &'a str,
    sender_id: &'a str,
    template_id: &'a str,
    entity_id: &'a str,
}

/// What to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Literal text
    Text(String),
    /// Index into the [`TemplateCatalog`]
    Template(usize),
}

/// One outbound send: recipients, body, and the attempt it is on.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    numbers: Vec<PhoneNumber>,
    body: MessageBody,
    template_id: Option<String>,
    attempt: u32,
}

impl DispatchRequest {
    /// Fails with [`SmsError::NoValidRecipients`] when `numbers` is empty.
    pub fn new(numbers: Vec<PhoneNumber>, body: MessageBody) -> Result<Self> {
        if numbers.is_empty() {
            return Err(SmsError::NoValidRecipients);
        }
        Ok(Self {
            numbers,
            body,
            template_id: None,
            attempt: 0,
        })
    }

    pub fn single(number: PhoneNumber, body: MessageBody) -> Self {
        Self {
            numbers: vec![number],
            body,
            template_id: None,
            attempt: 0,
        }
    }

    /// Override the configured DLT template id for this request.
    pub fn with_template_id(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    pub fn numbers(&self) -> &[PhoneNumber] {
        &self.numbers
    }

    pub fn body(&self) -> &MessageBody {
        &self.body
    }

    /// Zero-based attempt counter
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    fn next_attempt(self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self
        }
    }
}

/// Successful send as reported by the provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchReceipt {
    pub request_id: String,
    pub route: String,
    pub api_version: String,
    /// Provider's human-readable message, if any
    pub provider_message: Option<String>,
    /// Attempts used, including the successful one
    pub attempts: u32,
}

/// Outcome of one dispatch as recorded in summaries and API responses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: None,
            route_used: None,
            api_version: None,
            error: Some(error.into()),
        }
    }
}

impl From<&DispatchReceipt> for DispatchResult {
    fn from(receipt: &DispatchReceipt) -> Self {
        Self {
            success: true,
            request_id: Some(receipt.request_id.clone()),
            route_used: Some(receipt.route.clone()),
            api_version: Some(receipt.api_version.clone()),
            error: None,
        }
    }
}

/// Provider reply, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayResponse {
    Accepted {
        request_id: String,
        message: Option<String>,
    },
    Rejected {
        message: String,
    },
}

impl GatewayResponse {
    /// Classify a reply body. Anything short of `return: true` plus a
    /// non-empty `request_id` is a rejection.
    pub fn from_json(body: &Value) -> Self {
        let flag = match body.get("return") {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(flag)) => flag == "true",
            _ => false,
        };

        let request_id = match body.get("request_id") {
            Some(Value::String(id)) if !id.trim().is_empty() => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        };

        let message = body.get("message").and_then(message_text);

        match (flag, request_id) {
            (true, Some(request_id)) => Self::Accepted { request_id, message },
            (true, None) => Self::Rejected {
                message: "Gateway acknowledged the request without a request_id".to_string(),
            },
            (false, _) => Self::Rejected {
                message: message.unwrap_or_else(|| format!("SMS API returned failure: {}", body)),
            },
        }
    }
}

/// Fast2SMS sends `message` either as a string or as a list of strings.
fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    }
}

/// Wire payload for the `dlt_manual` route
#[derive(Serialize)]
struct DltPayload<'a> {
    message: &'a str,
    route: &'static str,
    numbers: String,
    sender_id: &'a str,
    template_id: &'a str,
    entity_id: &'a str,
}

impl fmt::Debug for DltPayload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DltPayload")
            .field("message", &self.message)
            .field("route", &self.route)
            .field("numbers", &"HIDDEN")
            .field("sender_id", &self.sender_id)
            .field("template_id", &self.template_id)
            .field("entity_id", &self.entity_id)
            .finish()
    }
}

/// Normalize one raw number and send it template `template_index`.
///
/// Number and template problems are reported before the gateway is called.
pub async fn send_single(
    gateway: &dyn SmsGateway,
    catalog: &TemplateCatalog,
    raw_number: &str,
    template_index: usize,
) -> Result<(PhoneNumber, DispatchReceipt)> {
    let number = crate::phone::normalize(raw_number)?;
    catalog.resolve(template_index)?;

    debug!(recipient = %number.masked(), template_index, "Sending single SMS");
    let receipt = gateway
        .dispatch(DispatchRequest::single(number.clone(), MessageBody::Template(template_index)))
        .await?;
    Ok((number, receipt))
}

/// HTTP client for the Fast2SMS API
pub struct Fast2SmsClient {
    client: Client,
    config: SmsGatewayConfig,
    catalog: Arc<TemplateCatalog>,
}

impl Fast2SmsClient {
    pub fn new(config: SmsGatewayConfig, catalog: Arc<TemplateCatalog>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()?;

        info!(
            base_url = %config.base_url,
            timeout_secs = config.timeout.as_secs(),
            max_retries = config.max_retries,
            "Fast2SMS client initialized"
        );

        Ok(Self {
            client,
            config,
            catalog,
        })
    }

    fn resolve_body(&self, body: &MessageBody) -> Result<String> {
        match body {
            MessageBody::Text(text) => Ok(text.clone()),
            MessageBody::Template(index) => Ok(self.catalog.resolve(*index)?.to_string()),
        }
    }

    /// One network call. `Err` carries the reason the attempt failed.
    async fn send_once(
        &self,
        request: &DispatchRequest,
        credentials: &Credentials<'_>,
        message: &str,
    ) -> std::result::Result<DispatchReceipt, String> {
        let payload = DltPayload {
            message,
            route: DLT_ROUTE,
            numbers: join_numbers(request.numbers()),
            sender_id: credentials.sender_id,
            template_id: request.template_id.as_deref().unwrap_or(credentials.template_id),
            entity_id: credentials.entity_id,
        };

        debug!(
            ?payload,
            recipients = request.numbers().len(),
            attempt = request.attempt() + 1,
            "Sending SMS payload"
        );

        let url = format!("{}{}", self.config.base_url, SEND_PATH);
        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, credentials.api_key)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    format!("Request timed out after {}s", self.config.timeout.as_secs())
                } else {
                    format!("Request failed: {}", e.without_url())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| format!("Failed to read gateway response (HTTP {}): {}", status, e.without_url()))?;
        let body: Option<Value> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let provider_message = body.as_ref().and_then(|b| b.get("message")).and_then(message_text);
            return Err(provider_message.unwrap_or_else(|| format!("HTTP {}: {}", status, text)));
        }

        let Some(body) = body else {
            return Err(format!("Unparseable gateway response: {}", text));
        };

        match GatewayResponse::from_json(&body) {
            GatewayResponse::Accepted { request_id, message } => {
                info!(
                    request_id = %request_id,
                    recipients = request.numbers().len(),
                    attempt = request.attempt() + 1,
                    "SMS accepted by gateway"
                );
                Ok(DispatchReceipt {
                    request_id,
                    route: DLT_ROUTE.to_string(),
                    api_version: API_VERSION.to_string(),
                    provider_message: message,
                    attempts: request.attempt() + 1,
                })
            }
            GatewayResponse::Rejected { message } => Err(message),
        }
    }
}

#[async_trait]
impl SmsGateway for Fast2SmsClient {
    async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchReceipt> {
        let credentials = self.config.credentials()?;
        let message = self.resolve_body(request.body())?;

        let mut request = request;
        loop {
            let error = match self.send_once(&request, &credentials, &message).await {
                Ok(receipt) => return Ok(receipt),
                Err(error) => error,
            };

            let attempts = request.attempt() + 1;
            warn!(attempt = attempts, error = %error, "SMS dispatch attempt failed");

            if request.attempt() >= self.config.max_retries {
                return Err(SmsError::GatewaySendFailed {
                    attempts,
                    message: error,
                });
            }

            let delay = self.config.retry_base_delay * attempts;
            info!(
                retry = attempts,
                max_retries = self.config.max_retries,
                delay_ms = delay.as_millis() as u64,
                "Retrying SMS dispatch"
            );
            tokio::time::sleep(delay).await;
            request = request.next_attempt();
        }
    }

    async fn delivery_report(&self, request_id: &str) -> Option<Value> {
        let Some(api_key) = non_blank(&self.config.api_key) else {
            warn!("Delivery report requested without an API key configured");
            return None;
        };

        let endpoints: [(Vec<&str>, Vec<(&str, &str)>); 4] = [
            (vec!["dev", "v3", "report", request_id], vec![("authorization", api_key)]),
            (
                vec!["dev", "v3", "reports"],
                vec![("authorization", api_key), ("request_id", request_id)],
            ),
            (vec!["dev", "report", request_id], vec![("authorization", api_key)]),
            (vec!["dev", "reports", request_id], vec![("authorization", api_key)]),
        ];

        for (index, (segments, query)) in endpoints.iter().enumerate() {
            let endpoint = index + 1;
            let Some(url) = endpoint_url(&self.config.base_url, segments) else {
                warn!("Gateway base URL cannot carry a report path");
                return None;
            };
            let result = self
                .client
                .get(url)
                .query(query)
                .header(ACCEPT, "application/json")
                .timeout(self.config.report_timeout)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => match response.json::<Value>().await {
                    Ok(report) => {
                        debug!(endpoint, request_id, "Delivery report retrieved");
                        return Some(report);
                    }
                    Err(e) => debug!(endpoint, error = %e.without_url(), "Delivery report was not JSON"),
                },
                Ok(response) => debug!(endpoint, status = %response.status(), "Delivery report endpoint failed"),
                Err(e) => debug!(endpoint, error = %e.without_url(), "Delivery report endpoint failed"),
            }
        }

        warn!(request_id, "All delivery report endpoints failed");
        None
    }
}

/// `base` with `segments` appended, each percent-encoded as a single path segment.
fn endpoint_url(base: &str, segments: &[&str]) -> Option<Url> {
    let mut url = Url::parse(base).ok()?;
    url.path_segments_mut().ok()?.pop_if_empty().extend(segments);
    Some(url)
}
