//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use qbt_flow_classify::TriState;
use qbt_flow_config::DiskControl;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::commands::{DiskReport, PlanReport, PolicySummary};
use crate::context::{CliError, CliResult};

fn print_json(value: &impl Serialize) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn render_policy_summary(summary: &PolicySummary, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(summary)?,
        OutputFormat::Table => {
            println!("config folder: {}", summary.config_folder.display());
            println!("download folder: {}", summary.download_folder.display());
            println!(
                "checks: hard links {} / cross-seed {}",
                on_off(summary.checks.hard_links),
                on_off(summary.checks.cross_seed)
            );
            println!("{:<20} {:>6} {:<5} KEYWORDS", "TRACKER", "EXTRA", "H&R");
            for tracker in &summary.trackers {
                println!(
                    "{:<20} {:>6} {:<5} {}",
                    tracker.tag,
                    tracker.extra_score,
                    on_off(tracker.hit_and_run),
                    tracker.keywords.join(", ")
                );
            }
            println!("{:<12} {:<28} DISK CONTROL", "CLIENT", "DOWNLOADS");
            for client in &summary.clients {
                println!(
                    "{:<12} {:<28} {}",
                    client.name,
                    client.downloads_path.display(),
                    describe_disk_control(&client.disk_control)
                );
            }
            for tag in &summary.tags {
                let mode = if tag.auto_apply { "auto" } else { "manual" };
                println!("tag {}: {} ({mode})", tag.field, tag.name);
            }
        }
    }
    Ok(())
}

pub(crate) fn render_plan(report: &PlanReport, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(report)?,
        OutputFormat::Table => {
            let stats = &report.stats;
            println!(
                "client {}: {} received, {} classified, {} invalid, {} not seeding",
                report.client, stats.received, stats.included, stats.invalid, stats.excluded
            );
            println!(
                "{:<16} {:<16} {:>9} {:<5} {:<5} NAME",
                "HASH", "TRACKER", "SCORE", "H&R", "HL"
            );
            for row in &report.torrents {
                println!(
                    "{:<16} {:<16} {:>9.2} {:<5} {:<5} {}",
                    short_hash(&row.hash),
                    row.tracker,
                    row.score,
                    tristate_to_str(row.hit_and_run),
                    tristate_to_str(row.hard_link),
                    row.name
                );
            }
            if report.plan.is_empty() {
                println!("tags already up to date");
            }
            for (verb, side) in [("add", &report.plan.add), ("remove", &report.plan.remove)] {
                for (tag, hashes) in side.iter().flatten() {
                    println!("{verb} {tag}: {}", hashes.join(" "));
                }
            }
            for entry in &report.remediation {
                println!(
                    "cross-seed needs remediation: {} ({})",
                    entry.hash,
                    entry.content_path.display()
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_disk(report: &DiskReport, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(report)?,
        OutputFormat::Table => {
            println!(
                "client {}: {}",
                report.client,
                describe_disk_control(&report.disk_control)
            );
            match &report.pressure {
                None => println!("within limit"),
                Some(pressure) => {
                    if let Some(percent) = pressure.used_percent {
                        println!("used: {percent:.2}%");
                    }
                    println!("free: {}", format_bytes(pressure.free_bytes));
                    println!("to free: {}", format_bytes(pressure.to_free_bytes));
                }
            }
        }
    }
    Ok(())
}

fn describe_disk_control(control: &DiskControl) -> String {
    match control {
        DiskControl::MaxPercent {
            max_percent,
            path_to_check,
        } => format!("max {max_percent}% of {}", path_to_check.display()),
        DiskControl::KeepFree { keep_free_gib } => format!("keep {keep_free_gib} GiB free"),
    }
}

const fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

const fn tristate_to_str(value: TriState) -> &'static str {
    match value {
        TriState::True => "yes",
        TriState::False => "no",
        TriState::NotEvaluated => "-",
    }
}

fn short_hash(hash: &str) -> &str {
    hash.get(..16).unwrap_or(hash)
}

#[must_use]
pub(crate) fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;
    let value = bytes_to_f64(bytes);
    if value >= GIB {
        format!("{:.2} GiB", value / GIB)
    } else if value >= MIB {
        format!("{:.2} MiB", value / MIB)
    } else if value >= KIB {
        format!("{:.2} KiB", value / KIB)
    } else {
        format!("{bytes} B")
    }
}

fn bytes_to_f64(value: u64) -> f64 {
    let high = u32::try_from(value >> 32).unwrap_or(u32::MAX);
    let low = u32::try_from(value & 0xFFFF_FFFF).unwrap_or(u32::MAX);
    f64::from(high) * 4_294_967_296.0 + f64::from(low)
}
