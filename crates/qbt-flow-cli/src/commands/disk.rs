use qbt_flow_config::DiskControl;
use qbt_flow_fsops::{DiskPressure, assess_disk};
use qbt_flow_torrent_core::TorrentInspector;
use serde::Serialize;

use crate::cli::DiskArgs;
use crate::context::{AppContext, CliError, CliResult};
use crate::inspector::JsonDumpInspector;
use crate::output::render_disk;

/// Disk control outcome for one client.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct DiskReport {
    pub(crate) client: String,
    pub(crate) disk_control: DiskControl,
    pub(crate) reported_free_bytes: Option<u64>,
    pub(crate) pressure: Option<DiskPressure>,
}

pub(crate) async fn handle_disk(ctx: &AppContext, args: DiskArgs) -> CliResult<()> {
    let policy = ctx.load_policy()?;
    let client = policy.client(&args.client).ok_or_else(|| {
        CliError::validation(format!("client '{}' is not configured", args.client))
    })?;

    let reported_free = match (&args.dump, args.free_bytes) {
        (Some(dump), _) => JsonDumpInspector::new(dump)
            .free_space_on_disk(&args.client)
            .await
            .map_err(CliError::failure)?,
        (None, free) => free,
    };

    let report = build_disk_report(&args.client, &client.disk_control, reported_free)?;
    render_disk(&report, ctx.output)
}

pub(crate) fn build_disk_report(
    client: &str,
    control: &DiskControl,
    reported_free: Option<u64>,
) -> CliResult<DiskReport> {
    let pressure = assess_disk(control, reported_free).map_err(CliError::failure)?;
    Ok(DiskReport {
        client: client.to_string(),
        disk_control: control.clone(),
        reported_free_bytes: reported_free,
        pressure,
    })
}
