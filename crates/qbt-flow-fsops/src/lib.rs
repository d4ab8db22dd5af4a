//! Filesystem collaborators: hard-link probing and disk pressure detection.
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

pub mod disk;
pub mod error;
pub mod probe;

pub use disk::{
    DiskPressure, DiskUsage, assess_disk, keep_free_pressure, local_disk_usage,
    max_percent_pressure,
};
pub use error::{FsOpsError, FsOpsResult};
pub use probe::FsHardLinkProbe;
