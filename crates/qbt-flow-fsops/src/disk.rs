//! Disk pressure detection for a client's disk control method.
//!
//! # Design
//! - `MaxPercent` measures the local filesystem holding `path_to_check`.
//! - `KeepFree` trusts the free space reported by the client daemon.
//! - Detection only: callers decide what, if anything, to free.

use std::path::Path;

use nix::sys::statvfs::{Statvfs, statvfs};
use qbt_flow_config::DiskControl;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{FsOpsError, FsOpsResult};

const GIB: u64 = 1024 * 1024 * 1024;

/// Capacity and usage of one filesystem, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiskUsage {
    /// Filesystem size.
    pub total_bytes: u64,
    /// Bytes in use.
    pub used_bytes: u64,
    /// Bytes available to unprivileged users.
    pub free_bytes: u64,
}

impl DiskUsage {
    /// Used share of the filesystem in percent, rounded to two decimals.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "percentages only need two decimals of precision"
    )]
    pub fn used_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        let percent = self.used_bytes as f64 / self.total_bytes as f64 * 100.0;
        (percent * 100.0).round() / 100.0
    }
}

/// A disk control limit that has been reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskPressure {
    /// Free bytes at the time of the check.
    pub free_bytes: u64,
    /// Filesystem usage, when measured locally.
    pub usage: Option<DiskUsage>,
    /// Used percentage, when measured locally.
    pub used_percent: Option<f64>,
    /// Bytes to free to get back within the limit.
    pub to_free_bytes: u64,
}

/// Measure the filesystem holding `path`.
///
/// # Errors
///
/// Returns [`FsOpsError::Nix`] when `statvfs` fails.
pub fn local_disk_usage(path: &Path) -> FsOpsResult<DiskUsage> {
    let stat = statvfs(path).map_err(|source| FsOpsError::nix("fsops.disk.statvfs", path, source))?;
    Ok(usage_from(&stat))
}

#[allow(
    clippy::useless_conversion,
    reason = "statvfs field widths differ between platforms"
)]
fn usage_from(stat: &Statvfs) -> DiskUsage {
    let fragment = u64::from(stat.fragment_size());
    let total_bytes = u64::from(stat.blocks()).saturating_mul(fragment);
    let unused = u64::from(stat.blocks_free()).saturating_mul(fragment);
    DiskUsage {
        total_bytes,
        used_bytes: total_bytes.saturating_sub(unused),
        free_bytes: u64::from(stat.blocks_available()).saturating_mul(fragment),
    }
}

/// Pressure when usage has reached `max_percent`; `None` while below it.
#[must_use]
pub fn max_percent_pressure(usage: DiskUsage, max_percent: u8) -> Option<DiskPressure> {
    let percent = usage.used_percent();
    if percent < f64::from(max_percent) {
        return None;
    }
    let ceiling = u128::from(usage.total_bytes) * u128::from(max_percent) / 100;
    let ceiling = u64::try_from(ceiling).unwrap_or(u64::MAX);
    Some(DiskPressure {
        free_bytes: usage.free_bytes,
        usage: Some(usage),
        used_percent: Some(percent),
        to_free_bytes: usage.used_bytes.saturating_sub(ceiling),
    })
}

/// Pressure when `free_bytes` is at or below `keep_free_gib`; `None` otherwise.
#[must_use]
pub const fn keep_free_pressure(free_bytes: u64, keep_free_gib: u64) -> Option<DiskPressure> {
    let floor = keep_free_gib.saturating_mul(GIB);
    if free_bytes > floor {
        return None;
    }
    Some(DiskPressure {
        free_bytes,
        usage: None,
        used_percent: None,
        to_free_bytes: floor - free_bytes,
    })
}

/// Evaluate a client's disk control method.
///
/// `reported_free` is the free space reported by the client daemon and is
/// required for [`DiskControl::KeepFree`].
///
/// # Errors
///
/// Returns [`FsOpsError::Nix`] when the local filesystem cannot be measured and
/// [`FsOpsError::InvalidInput`] when `KeepFree` is configured but no free space
/// was reported.
pub fn assess_disk(
    control: &DiskControl,
    reported_free: Option<u64>,
) -> FsOpsResult<Option<DiskPressure>> {
    let pressure = match control {
        DiskControl::MaxPercent {
            max_percent,
            path_to_check,
        } => {
            let usage = local_disk_usage(path_to_check)?;
            debug!(
                path = %path_to_check.display(),
                used_percent = usage.used_percent(),
                max_percent,
                "local disk measured"
            );
            max_percent_pressure(usage, *max_percent)
        }
        DiskControl::KeepFree { keep_free_gib } => {
            let free = reported_free.ok_or(FsOpsError::InvalidInput {
                field: "free_space_on_disk",
                reason: "client did not report free space",
                value: None,
            })?;
            keep_free_pressure(free, *keep_free_gib)
        }
    };

    if let Some(pressure) = &pressure {
        info!(
            to_free_bytes = pressure.to_free_bytes,
            free_bytes = pressure.free_bytes,
            "disk control limit reached"
        );
    }
    Ok(pressure)
}
