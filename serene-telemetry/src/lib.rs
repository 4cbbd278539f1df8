//! Logging for the Serene workspace.
//!
//! [`init_telemetry`] installs a global `tracing` subscriber writing
//! human-readable lines to stderr, [`init_json_telemetry`] writes one JSON
//! object per event instead. Both honour `RUST_LOG` and fall back to the
//! filter passed by the caller. [`memory`] captures events for tests.

pub mod memory;

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use memory::{CapturedEvent, InMemoryEventLayer, SharedEventStorage};

/// Filter used when neither `RUST_LOG` nor the caller supplies one.
pub const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("A global subscriber is already installed: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

/// Output format of the global subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Build the filter from `RUST_LOG`, else from `default_filter`.
pub fn env_filter(default_filter: &str) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(default_filter)?),
    }
}

/// Install the global subscriber.
///
/// Calling it a second time returns [`TelemetryError::AlreadyInitialized`]
/// and leaves the first subscriber in place.
pub fn init(format: LogFormat, default_filter: &str) -> Result<(), TelemetryError> {
    let filter = env_filter(default_filter)?;
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()?,
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr).with_current_span(false))
            .try_init()?,
    }
    Ok(())
}

/// Install a human-readable subscriber writing to stderr.
pub fn init_telemetry(default_filter: &str) -> Result<(), TelemetryError> {
    init(LogFormat::Pretty, default_filter)
}

/// Install a JSON subscriber writing to stderr.
pub fn init_json_telemetry(default_filter: &str) -> Result<(), TelemetryError> {
    init(LogFormat::Json, default_filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_fallback_filter_is_rejected() {
        // RUST_LOG takes precedence over the fallback.
        if std::env::var("RUST_LOG").is_err() {
            assert!(matches!(env_filter("serene=notalevel"), Err(TelemetryError::Filter(_))));
        }
    }

    #[test]
    fn second_init_is_an_error_not_a_panic() {
        let _ = init_telemetry("warn");
        assert!(matches!(init_json_telemetry("warn"), Err(TelemetryError::AlreadyInitialized(_))));
    }
}
