//! Tracing subscriber installation for one qbt-flow run.
//!
//! # Design
//! - Level and line format come from [`RunSettings`] (`QFU_LOG_LEVEL`, `QFU_LOG_FORMAT`).
//! - A non-empty `RUST_LOG` replaces the level with full filter directives.
//! - A bad directive is reported before anything is installed.

use qbt_flow_config::{LogFormat, RunSettings};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Result, TelemetryError};

/// Build identifier stamped on run spans; set `QBT_FLOW_BUILD_SHA` at compile time.
#[must_use]
pub const fn build_sha() -> &'static str {
    match option_env!("QBT_FLOW_BUILD_SHA") {
        Some(sha) => sha,
        None => "dev",
    }
}

/// Install the global subscriber described by `settings`.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the level does not parse and
/// [`TelemetryError::SubscriberInstall`] when a subscriber is already set.
pub fn init_logging(settings: &RunSettings) -> Result<()> {
    let filter = log_filter(settings, std::env::var("RUST_LOG").ok())?;
    let registry = tracing_subscriber::registry().with(filter);
    let installed = match settings.log_format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().compact().with_target(false))
            .try_init(),
    };
    installed.map_err(|source| TelemetryError::SubscriberInstall { source })
}

fn log_filter(settings: &RunSettings, rust_log: Option<String>) -> Result<EnvFilter> {
    let directive = rust_log
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| settings.log_level.clone());
    EnvFilter::try_new(&directive).map_err(|source| TelemetryError::Filter { directive, source })
}
