//! Run-level span helpers.
//!
//! # Design
//! - Every command runs inside one `run` span carrying the command name, run id and build SHA.
//! - Per-client work nests a `client` span so log lines stay attributable.

use tracing::Span;

use crate::init::build_sha;

/// Span covering one command invocation.
#[must_use]
pub fn run_span(command: &str, run_id: &str) -> Span {
    tracing::info_span!("run", command = %command, run_id = %run_id, build_sha = %build_sha())
}

/// Span covering the work done for one client.
#[must_use]
pub fn client_span(client: &str) -> Span {
    tracing::info_span!("client", client = %client)
}
