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

//! Operator policy for torrent classification, validated once and then immutable.
//!
//! Layout: `model.rs` (on-disk documents), `policy.rs` (validated `Policy` and
//! its rules), `validate.rs` (invariant checks and parsing helpers), `loader.rs`
//! (config directory loading), `settings.rs` (`QFU_*` environment settings).

mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod policy;
pub mod settings;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::load_policy_dir;
pub use policy::{
    AutoManageAction, AutoManageConditions, AutoManageRule, CheckSwitches, ClientEndpoint,
    ClientPolicy, DiskControl, HitAndRunRule, Policy, PolicyParts, ScoringPolicy, TagPolicy,
    TagRule, TrackerRule,
};
pub use settings::{LogFormat, RunSettings};
pub use validate::parse_duration;
