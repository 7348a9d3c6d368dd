//! Structured logging for plancoach
//!
//! `RUST_LOG` always wins. Without it the filter is `plancoach=info`, or
//! `plancoach=debug` when verbose. Error text passes through redaction
//! before it reaches a log line.

use std::time::Duration;
use tracing::{Level, error, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Initialize the global tracing subscriber.
///
/// # Arguments
/// * `verbose` - debug level for plancoach crates, with span close events
/// * `json` - emit one JSON object per line instead of compact text
pub fn init_tracing(verbose: bool, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("plancoach=debug,tower_http=debug,info")
            } else {
                EnvFilter::try_new("plancoach=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let span_events = if verbose {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_events(span_events),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(verbose)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(span_events)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Span for one API request.
pub fn request_span(endpoint: &str, planning_id: Option<i64>) -> tracing::Span {
    match planning_id {
        Some(id) => span!(Level::INFO, "request", endpoint = %endpoint, planning_id = id),
        None => span!(Level::INFO, "request", endpoint = %endpoint),
    }
}

pub fn log_request_complete(endpoint: &str, elapsed: Duration) {
    info!(
        endpoint = %endpoint,
        duration_ms = elapsed.as_millis() as u64,
        "Request completed"
    );
}

/// Log a failed request. The error text is redacted first.
pub fn log_request_error(endpoint: &str, status: u16, error: &str, elapsed: Duration) {
    let sanitized = plancoach_error_redaction::redact_error_message_for_logging(error);
    error!(
        endpoint = %endpoint,
        status = status,
        duration_ms = elapsed.as_millis() as u64,
        error = %sanitized,
        "Request failed"
    );
}
