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

//! Torrent classification and tag diffing.
//!
//! Layout: `tracker.rs` (keyword matching), `checks/` (risk checkers),
//! `score.rs` (retention score), `classifier.rs` (per-torrent and batch
//! classification), `tag_plan.rs` (minimal tag additions and removals),
//! `record.rs` (classification output types).

pub mod checks;
pub mod classifier;
pub mod error;
pub mod record;
pub mod score;
pub mod tag_plan;
pub mod tracker;

pub use classifier::{BatchStats, Classification, ClassificationBatch, Classifier};
pub use error::{ClassifyError, ClassifyResult};
pub use record::{ClassificationRecord, CrossSeedStatus, TrackerTag, TriState};
pub use score::score;
pub use tag_plan::{TagPlan, compute_tag_plan};
pub use tracker::match_tracker;
