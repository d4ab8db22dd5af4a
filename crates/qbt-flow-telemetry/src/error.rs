//! Errors raised while installing logging or maintaining the metrics registry.

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Telemetry failures. None of them should abort a run on their own.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// `QFU_LOG_LEVEL` or `RUST_LOG` did not parse as a filter directive.
    #[error("invalid log filter directive")]
    Filter {
        /// Directive text that was rejected.
        directive: String,
        /// Parser failure.
        source: ParseError,
    },
    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber")]
    SubscriberInstall {
        /// Underlying install failure.
        source: TryInitError,
    },
    /// A counter could not be built or registered.
    #[error("failed to register metric")]
    Metric {
        /// Metric name.
        name: &'static str,
        /// Prometheus failure.
        source: prometheus::Error,
    },
    /// The registry could not be rendered as text exposition.
    #[error("failed to render metrics")]
    Render {
        /// Prometheus failure.
        source: prometheus::Error,
    },
}
