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

//! Client-agnostic torrent snapshots, payload validation, and collaborator traits.
//!
//! Layout: `model/` (validated snapshot DTOs), `validate.rs` (raw API payload
//! coercion), `service/` (traits implemented by filesystem and client adapters).

pub mod error;
pub mod model;
pub mod service;
pub mod validate;

pub use error::{ProbeError, ProbeResult, SnapshotError, SnapshotResult};
pub use model::{TorrentSnapshot, TorrentState, TrackerEntry, TrackerStatus};
pub use service::{HardLinkProbe, TorrentInspector};
pub use validate::validate_snapshot;
