//! Command handlers grouped by concern.

mod config;
mod disk;
mod plan;

pub(crate) use config::{PolicySummary, handle_check_config};
pub(crate) use disk::{DiskReport, handle_disk};
pub(crate) use plan::{PlanReport, handle_plan};

/// Widen a collection length for counters.
fn count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}
