//! BroadcastOrchestrator Tests
//!
//! Uses a recording gateway and a paused clock so batch pacing can be
//! checked without waiting.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use sc_sms::{
    BroadcastConfig, BroadcastOrchestrator, DispatchReceipt, DispatchRequest, MessageBody, SheetRow, SmsError,
    SmsGateway, TemplateCatalog,
};

#[derive(Debug, Clone)]
struct Call {
    numbers: Vec<String>,
    body: MessageBody,
    at: Instant,
}

#[derive(Default)]
struct RecordingGateway {
    calls: Mutex<Vec<Call>>,
    /// 1-based call numbers that fail after retries
    failing_calls: HashSet<usize>,
    missing_credentials: bool,
}

impl RecordingGateway {
    fn failing_on(calls: &[usize]) -> Self {
        Self {
            failing_calls: calls.iter().copied().collect(),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SmsGateway for RecordingGateway {
    async fn dispatch(&self, request: DispatchRequest) -> sc_sms::Result<DispatchReceipt> {
        if self.missing_credentials {
            return Err(SmsError::MissingDltCredentials {
                missing: vec!["entity_id"],
            });
        }

        let call_number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call {
                numbers: request.numbers().iter().map(|n| n.to_string()).collect(),
                body: request.body().clone(),
                at: Instant::now(),
            });
            calls.len()
        };

        if self.failing_calls.contains(&call_number) {
            return Err(SmsError::GatewaySendFailed {
                attempts: 3,
                message: "Spamming detected".to_string(),
            });
        }

        Ok(DispatchReceipt {
            request_id: format!("req-{call_number}"),
            route: "dlt_manual".to_string(),
            api_version: "v2".to_string(),
            provider_message: None,
            attempts: 1,
        })
    }

    async fn delivery_report(&self, _request_id: &str) -> Option<serde_json::Value> {
        None
    }
}

fn catalog() -> Arc<TemplateCatalog> {
    Arc::new(TemplateCatalog::new(vec![
        "Template zero".to_string(),
        "Template one".to_string(),
    ]))
}

fn orchestrator(gateway: Arc<RecordingGateway>) -> BroadcastOrchestrator {
    BroadcastOrchestrator::new(gateway, catalog(), BroadcastConfig::default())
}

fn phone_rows(count: usize) -> Vec<SheetRow> {
    (0..count)
        .map(|i| {
            let mut row = SheetRow::new();
            row.insert("name".to_string(), format!("Customer {i}"));
            row.insert("phone".to_string(), format!("9{:09}", i));
            row
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_65_recipients_make_three_batches() {
    let gateway = Arc::new(RecordingGateway::default());
    let summary = orchestrator(gateway.clone())
        .broadcast(&phone_rows(65), 0)
        .await
        .unwrap();

    let sizes: Vec<usize> = gateway.calls().iter().map(|c| c.numbers.len()).collect();
    assert_eq!(sizes, vec![30, 30, 5]);

    assert_eq!(summary.total_numbers, 65);
    assert_eq!(summary.successful_sends, 65);
    assert_eq!(summary.failed_sends, 0);
    assert_eq!(summary.success_rate, "100.0%");
    assert_eq!(summary.batches.len(), 3);
    assert_eq!(summary.batches[2].batch, 3);
    assert_eq!(summary.batches[2].result.request_id.as_deref(), Some("req-3"));

    assert!(gateway
        .calls()
        .iter()
        .all(|c| c.body == MessageBody::Template(0)));
}

#[tokio::test(start_paused = true)]
async fn test_failed_batch_does_not_stop_later_batches() {
    let gateway = Arc::new(RecordingGateway::failing_on(&[2]));
    let summary = orchestrator(gateway.clone())
        .broadcast(&phone_rows(65), 1)
        .await
        .unwrap();

    assert_eq!(gateway.calls().len(), 3);
    assert_eq!(summary.successful_sends, 35);
    assert_eq!(summary.failed_sends, 30);
    assert_eq!(summary.success_rate, "53.8%");

    assert!(summary.batches[0].result.success);
    assert!(!summary.batches[1].result.success);
    assert!(summary.batches[1]
        .result
        .error
        .as_deref()
        .unwrap()
        .contains("Spamming detected"));
    assert!(summary.batches[2].result.success);
}

#[tokio::test(start_paused = true)]
async fn test_batches_are_spaced_by_delay() {
    let gateway = Arc::new(RecordingGateway::default());
    let start = Instant::now();

    orchestrator(gateway.clone())
        .broadcast(&phone_rows(61), 0)
        .await
        .unwrap();

    let calls = gateway.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].at - start, Duration::ZERO);
    assert_eq!(calls[1].at - calls[0].at, Duration::from_secs(3));
    assert_eq!(calls[2].at - calls[1].at, Duration::from_secs(3));
    // No pause after the last batch
    assert_eq!(Instant::now() - calls[2].at, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_all_invalid_rows_make_no_calls() {
    let gateway = Arc::new(RecordingGateway::default());
    let mut rows = Vec::new();
    for raw in ["12345", "5125377622", "not a number"] {
        let mut row = SheetRow::new();
        row.insert("contactNo".to_string(), raw.to_string());
        rows.push(row);
    }

    let err = orchestrator(gateway.clone())
        .broadcast(&rows, 0)
        .await
        .unwrap_err();

    assert!(matches!(err, SmsError::NoValidRecipients));
    assert!(gateway.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_invalid_rows_are_excluded_and_counted() {
    let gateway = Arc::new(RecordingGateway::default());
    let mut rows = phone_rows(3);
    let mut bad = SheetRow::new();
    bad.insert("phone".to_string(), "0000".to_string());
    rows.insert(1, bad);

    let summary = orchestrator(gateway.clone())
        .broadcast(&rows, 0)
        .await
        .unwrap();

    assert_eq!(summary.total_numbers, 3);
    assert_eq!(summary.invalid_rows, 1);
    assert_eq!(gateway.calls()[0].numbers.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_first_column_fallback() {
    let gateway = Arc::new(RecordingGateway::default());
    let mut row = SheetRow::new();
    row.insert("Customer Mobile".to_string(), "+91 81234 56789".to_string());
    row.insert("city".to_string(), "Pune".to_string());

    orchestrator(gateway.clone())
        .broadcast(&[row], 0)
        .await
        .unwrap();

    assert_eq!(gateway.calls()[0].numbers, vec!["8123456789".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_template_fails_before_dispatch() {
    let gateway = Arc::new(RecordingGateway::default());

    let err = orchestrator(gateway.clone())
        .broadcast(&phone_rows(5), 7)
        .await
        .unwrap_err();

    assert!(matches!(err, SmsError::TemplateNotFound { index: 7 }));
    assert!(gateway.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_configuration_error_aborts_run() {
    let gateway = Arc::new(RecordingGateway {
        missing_credentials: true,
        ..Default::default()
    });

    let err = orchestrator(gateway.clone())
        .broadcast(&phone_rows(65), 0)
        .await
        .unwrap_err();

    assert!(matches!(err, SmsError::MissingDltCredentials { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_custom_batch_size() {
    let gateway = Arc::new(RecordingGateway::default());
    let orchestrator = BroadcastOrchestrator::new(
        gateway.clone(),
        catalog(),
        BroadcastConfig {
            batch_size: 2,
            batch_delay: Duration::from_millis(100),
        },
    );

    let summary = orchestrator.broadcast(&phone_rows(5), 0).await.unwrap();

    assert_eq!(summary.batches.len(), 3);
    let sizes: Vec<usize> = gateway.calls().iter().map(|c| c.numbers.len()).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
}
