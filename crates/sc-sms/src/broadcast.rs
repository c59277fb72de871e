//! Bulk broadcast orchestration
//!
//! Turns spreadsheet rows into validated recipients, splits them into
//! fixed-size batches and dispatches the batches one after another with a
//! pause in between. One failing batch never stops the run.

use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{Result, SmsError};
use crate::gateway::{DispatchRequest, DispatchResult, MessageBody, SmsGateway};
use crate::phone::{normalize, PhoneNumber};
use crate::template::TemplateCatalog;

/// One spreadsheet row, header name to cell text, in column order.
pub type SheetRow = IndexMap<String, String>;

/// Column names checked, in order, for the recipient's number.
pub const PHONE_FIELDS: [&str; 4] = ["contactNo", "phone", "mobile", "number"];

#[derive(Debug, Clone)]
pub struct BroadcastConfig {
    pub batch_size: usize,
    pub batch_delay: Duration,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            batch_size: 30,
            batch_delay: Duration::from_secs(3),
        }
    }
}

impl From<&sc_config::SmsConfig> for BroadcastConfig {
    fn from(config: &sc_config::SmsConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            batch_delay: Duration::from_secs(config.batch_delay_secs),
        }
    }
}

/// Outcome of one batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    /// 1-based batch number
    pub batch: usize,
    pub numbers: Vec<PhoneNumber>,
    #[serde(flatten)]
    pub result: DispatchResult,
}

/// Aggregate outcome of a broadcast run
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total_numbers: usize,
    pub successful_sends: usize,
    pub failed_sends: usize,
    /// Rows dropped because no valid number could be read from them
    pub invalid_rows: usize,
    pub success_rate: String,
    #[serde(skip)]
    pub batches: Vec<BatchResult>,
}

impl BatchSummary {
    fn new(total_numbers: usize, invalid_rows: usize) -> Self {
        Self {
            total_numbers,
            successful_sends: 0,
            failed_sends: 0,
            invalid_rows,
            success_rate: String::new(),
            batches: Vec::new(),
        }
    }

    fn record(&mut self, batch: BatchResult) {
        if batch.result.success {
            self.successful_sends += batch.numbers.len();
        } else {
            self.failed_sends += batch.numbers.len();
        }
        self.batches.push(batch);
    }

    fn finish(mut self) -> Self {
        let rate = if self.total_numbers == 0 {
            0.0
        } else {
            self.successful_sends as f64 / self.total_numbers as f64 * 100.0
        };
        self.success_rate = format!("{:.1}%", rate);
        self
    }
}

/// Pick the recipient cell of a row: the first non-empty known phone
/// column, else the first column.
pub fn phone_field(row: &SheetRow) -> Option<&str> {
    PHONE_FIELDS
        .iter()
        .filter_map(|field| row.get(*field))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .or_else(|| row.values().next().map(|value| value.trim()))
}

/// Validated recipients plus the count of rows that were dropped.
pub fn collect_recipients(rows: &[SheetRow]) -> (Vec<PhoneNumber>, usize) {
    let mut numbers = Vec::with_capacity(rows.len());
    let mut invalid = 0;

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;
        match phone_field(row) {
            Some(raw) => match normalize(raw) {
                Ok(number) => numbers.push(number),
                Err(e) => {
                    warn!(row = row_number, reason = %e, "Skipping row with invalid phone number");
                    invalid += 1;
                }
            },
            None => {
                warn!(row = row_number, "Skipping row without a phone number");
                invalid += 1;
            }
        }
    }

    (numbers, invalid)
}

/// Sequential batched broadcaster
pub struct BroadcastOrchestrator {
    gateway: Arc<dyn SmsGateway>,
    catalog: Arc<TemplateCatalog>,
    config: BroadcastConfig,
}

impl BroadcastOrchestrator {
    pub fn new(gateway: Arc<dyn SmsGateway>, catalog: Arc<TemplateCatalog>, config: BroadcastConfig) -> Self {
        Self {
            gateway,
            catalog,
            config,
        }
    }

    /// Send template `template_index` to every valid row.
    ///
    /// Fails before any network call on an unknown template or when no row
    /// holds a valid number. Gateway failures of a single batch are recorded
    /// in the summary; configuration errors abort the run.
    pub async fn broadcast(&self, rows: &[SheetRow], template_index: usize) -> Result<BatchSummary> {
        self.catalog.resolve(template_index)?;

        let (numbers, invalid_rows) = collect_recipients(rows);
        if numbers.is_empty() {
            return Err(SmsError::NoValidRecipients);
        }

        let batch_size = self.config.batch_size.max(1);
        let batch_count = numbers.len().div_ceil(batch_size);

        info!(
            rows = rows.len(),
            valid = numbers.len(),
            invalid = invalid_rows,
            batches = batch_count,
            template_index,
            "Starting broadcast"
        );

        let mut summary = BatchSummary::new(numbers.len(), invalid_rows);

        for (index, chunk) in numbers.chunks(batch_size).enumerate() {
            let batch = index + 1;
            let request = DispatchRequest::new(chunk.to_vec(), MessageBody::Template(template_index))?;

            debug!(batch, recipients = chunk.len(), "Dispatching batch");

            let result = match self.gateway.dispatch(request).await {
                Ok(receipt) => {
                    info!(batch, request_id = %receipt.request_id, "Batch sent");
                    DispatchResult::from(&receipt)
                }
                Err(e @ SmsError::GatewaySendFailed { .. }) => {
                    warn!(batch, error = %e, "Batch failed");
                    DispatchResult::failed(e.to_string())
                }
                Err(e) => {
                    warn!(batch, error = %e, "Aborting broadcast");
                    return Err(e);
                }
            };

            summary.record(BatchResult {
                batch,
                numbers: chunk.to_vec(),
                result,
            });

            if batch < batch_count {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }

        let summary = summary.finish();
        info!(
            total = summary.total_numbers,
            successful = summary.successful_sends,
            failed = summary.failed_sends,
            success_rate = %summary.success_rate,
            "Broadcast complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, &str)]) -> SheetRow {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_phone_field_priority() {
        let r = row(&[("name", "Asha"), ("mobile", "9000000001"), ("phone", "8000000001")]);
        assert_eq!(phone_field(&r), Some("8000000001"));

        let blank_contact = row(&[("contactNo", "  "), ("number", "7000000001")]);
        assert_eq!(phone_field(&blank_contact), Some("7000000001"));
    }

    #[test]
    fn test_phone_field_falls_back_to_first_column() {
        let r = row(&[("Customer Mobile", "9125377622"), ("city", "Pune")]);
        assert_eq!(phone_field(&r), Some("9125377622"));
        assert_eq!(phone_field(&SheetRow::new()), None);
    }

    #[test]
    fn test_collect_recipients_counts_invalid_rows() {
        let rows = vec![
            row(&[("phone", "+91 9125377622")]),
            row(&[("phone", "12345")]),
            row(&[("phone", "5125377622")]),
            SheetRow::new(),
            row(&[("phone", "08000000001")]),
        ];
        let (numbers, invalid) = collect_recipients(&rows);
        assert_eq!(
            numbers.iter().map(PhoneNumber::as_str).collect::<Vec<_>>(),
            vec!["9125377622", "8000000001"]
        );
        assert_eq!(invalid, 3);
    }

    #[test]
    fn test_summary_rate_and_counts() {
        let mut summary = BatchSummary::new(3, 0);
        summary.record(BatchResult {
            batch: 1,
            numbers: vec![normalize("9000000001").unwrap(), normalize("9000000002").unwrap()],
            result: DispatchResult::failed("x"),
        });
        summary.record(BatchResult {
            batch: 2,
            numbers: vec![normalize("9000000003").unwrap()],
            result: DispatchResult {
                success: true,
                request_id: Some("r".into()),
                route_used: None,
                api_version: None,
                error: None,
            },
        });
        let summary = summary.finish();
        assert_eq!(summary.successful_sends, 1);
        assert_eq!(summary.failed_sends, 2);
        assert_eq!(summary.success_rate, "33.3%");
    }
}
