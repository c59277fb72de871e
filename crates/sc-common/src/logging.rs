//! Structured Logging Configuration
//!
//! - JSON output for log aggregation (`LOG_FORMAT=json`)
//! - Human-readable output for local runs (default)
//! - Level filtering through `RUST_LOG` (default: `info`)
//!
//! ```rust,ignore
//! sc_common::logging::init_logging("sc-server");
//! tracing::info!(batch = 2, size = 30, "Sending broadcast batch");
//! ```
//!
//! Recipient phone numbers are personal data. Log them masked
//! (`PhoneNumber::masked`) or not at all.

use tracing::info;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Output format selected from `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    pub fn from_env_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging for the given service.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging(service_name: &str) {
    let format = LogFormat::from_env_value(&std::env::var("LOG_FORMAT").unwrap_or_default());

    let installed = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(default_filter())
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_target(true)
                    .flatten_event(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(default_filter())
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .try_init(),
    };

    if installed.is_ok() {
        info!(service = service_name, format = ?format, "Logging initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::from_env_value("json"), LogFormat::Json);
        assert_eq!(LogFormat::from_env_value(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::from_env_value(""), LogFormat::Text);
        assert_eq!(LogFormat::from_env_value("pretty"), LogFormat::Text);
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_logging("test");
        init_logging("test");
    }
}
