//! Structured JSON logging using **tracing**.
//!
//! The library only emits events; installing a subscriber is the caller's
//! choice. [`init_structured_logging`] is the ready-made one: JSON lines on
//! stderr, filtered by `RUST_LOG`.

use tracing::{error, info, warn};

use crate::transform::FileOutcome;

/// Initializes the global tracing subscriber.
///
/// Call once, early. Output goes to stderr so stdout stays free for
/// rewritten sources or reports.
///
/// # Environment Variables
/// - `RUST_LOG`: Controls log filtering (e.g., `RUST_LOG=cppfix_core=debug`)
pub fn init_structured_logging() {
    tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_current_span(true)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

pub fn log_warn(message: &str) {
    warn!(detail = %message);
}

pub fn log_info(message: &str) {
    info!(detail = %message);
}

pub fn log_error(message: &str) {
    error!(detail = %message);
}

/// Logs an event under a name; `ERROR` and `WARN` pick the level.
pub fn log_event(event: &str, detail: &str) {
    match event.to_uppercase().as_str() {
        "ERROR" => error!(event = %event, detail = %detail),
        "WARN" | "WARNING" => warn!(event = %event, detail = %detail),
        _ => info!(event = %event, detail = %detail),
    }
}

/// Logs one event per transformed file: error when it was left untouched,
/// warning per skipped switch, info when it was rewritten.
pub fn log_file_outcome(name: &str, outcome: &FileOutcome) {
    if outcome.failed {
        let reason = outcome
            .diagnostics
            .iter()
            .rev()
            .find(|d| d.is_error())
            .map(|d| d.to_string())
            .unwrap_or_default();
        log_error(&format!("{}: left unchanged: {}", name, reason));
        return;
    }
    for d in outcome.diagnostics.iter().filter(|d| !d.is_error()) {
        log_warn(&format!("{}:{}", name, d));
    }
    if outcome.changed() {
        log_info(&format!("{}: {} edits", name, outcome.edits.len()));
    }
}
