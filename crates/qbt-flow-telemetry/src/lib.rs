//! Telemetry primitives shared across the qbt-flow workspace.
//!
//! Logging installation, run spans and the Prometheus registry used by the CLI.
#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

pub mod context;
pub mod error;
pub mod init;
pub mod metrics;

pub use context::{client_span, run_span};
pub use error::{Result, TelemetryError};
pub use init::{build_sha, init_logging};
pub use metrics::{Metrics, MetricsSnapshot, SkipReason, TagOperation};
