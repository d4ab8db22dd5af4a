use std::path::PathBuf;
use std::sync::Arc;

use qbt_flow_classify::{
    BatchStats, ClassificationRecord, Classifier, ClassifyError, CrossSeedStatus, TagPlan,
    TriState, compute_tag_plan,
};
use qbt_flow_config::Policy;
use qbt_flow_fsops::FsHardLinkProbe;
use qbt_flow_telemetry::{Metrics, SkipReason, TagOperation, client_span};
use qbt_flow_torrent_core::{HardLinkProbe, TorrentInspector};
use serde::Serialize;
use serde_json::Value;
use tracing::{Instrument, info, warn};

use super::count;
use crate::cli::PlanArgs;
use crate::context::{AppContext, CliError, CliResult};
use crate::inspector::JsonDumpInspector;
use crate::output::render_plan;

/// Everything one `plan` run decided for a client.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct PlanReport {
    pub(crate) client: String,
    pub(crate) stats: BatchStats,
    pub(crate) plan: TagPlan,
    pub(crate) remediation: Vec<RemediationEntry>,
    pub(crate) torrents: Vec<TorrentRow>,
}

/// Cross-seeded torrent whose payload was never downloaded by this client.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct RemediationEntry {
    pub(crate) hash: String,
    pub(crate) content_path: PathBuf,
}

/// Classification summary for one torrent, ordered by ascending score.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TorrentRow {
    pub(crate) hash: String,
    pub(crate) name: String,
    pub(crate) tracker: String,
    pub(crate) score: f64,
    pub(crate) hit_and_run: TriState,
    pub(crate) hard_link: TriState,
}

pub(crate) async fn handle_plan(ctx: &AppContext, args: PlanArgs) -> CliResult<()> {
    let policy = ctx.load_policy()?;
    if policy.client(&args.client).is_none() {
        warn!(
            client = %args.client,
            "client is not configured; hard-link check will be skipped"
        );
    }

    let inspector = JsonDumpInspector::new(&args.dump);
    info!(dump = %inspector.path().display(), client = %args.client, "classifying torrent dump");
    let report = build_plan_report(
        ctx,
        Arc::new(policy),
        Arc::new(FsHardLinkProbe::new()),
        &inspector,
        &args.client,
        args.parallel,
    )
    .await?;
    render_plan(&report, ctx.output)
}

/// Fetch the client's torrents and classify them off the async runtime.
///
/// Classification walks the download folder for hard links, so it runs on the
/// blocking pool inside the client span.
pub(crate) async fn build_plan_report(
    ctx: &AppContext,
    policy: Arc<Policy>,
    probe: Arc<dyn HardLinkProbe>,
    inspector: &dyn TorrentInspector,
    client: &str,
    parallel: bool,
) -> CliResult<PlanReport> {
    let span = client_span(client);
    let raws = inspector
        .list_raw(client)
        .instrument(span.clone())
        .await
        .map_err(CliError::failure)?;

    let metrics = ctx.metrics.clone();
    let client = client.to_string();
    tokio::task::spawn_blocking(move || {
        span.in_scope(|| {
            classify_and_plan(&policy, probe.as_ref(), &metrics, &raws, &client, parallel)
        })
    })
    .await
    .map_err(CliError::failure)?
}

fn classify_and_plan(
    policy: &Policy,
    probe: &dyn HardLinkProbe,
    metrics: &Metrics,
    raws: &[Value],
    client: &str,
    parallel: bool,
) -> CliResult<PlanReport> {
    metrics.add_seen(count(raws.len()));

    let classifier = Classifier::new(policy, probe);
    let outcome = if parallel {
        classifier.classify_batch_parallel(raws, client)
    } else {
        classifier.classify_batch(raws, client)
    };
    let batch = match outcome {
        Ok(batch) => batch,
        Err(err) => {
            let ClassifyError::NoQualifyingTorrents {
                invalid, excluded, ..
            } = err;
            metrics.inc_batch_failure();
            metrics.add_skipped(SkipReason::Invalid, count(invalid));
            metrics.add_skipped(SkipReason::Excluded, count(excluded));
            return Err(err.into());
        }
    };

    let stats = batch.stats;
    metrics.add_classified(client, count(stats.included));
    metrics.add_skipped(SkipReason::Invalid, count(stats.invalid));
    metrics.add_skipped(SkipReason::Excluded, count(stats.excluded));

    let plan = compute_tag_plan(&batch.records, policy);
    metrics.add_tag_operations(TagOperation::Add, count(plan.additions()));
    metrics.add_tag_operations(TagOperation::Remove, count(plan.removals()));
    info!(
        included = stats.included,
        additions = plan.additions(),
        removals = plan.removals(),
        "tag plan computed"
    );

    Ok(PlanReport {
        client: client.to_string(),
        stats,
        remediation: remediation(&batch.records),
        torrents: rows(&batch.records),
        plan,
    })
}

fn remediation(records: &[ClassificationRecord]) -> Vec<RemediationEntry> {
    records
        .iter()
        .filter_map(|record| match &record.cross_seed {
            Some(CrossSeedStatus::NeedsRemediation { content_path, hash }) => {
                Some(RemediationEntry {
                    hash: hash.clone(),
                    content_path: content_path.clone(),
                })
            }
            _ => None,
        })
        .collect()
}

fn rows(records: &[ClassificationRecord]) -> Vec<TorrentRow> {
    let mut rows: Vec<TorrentRow> = records
        .iter()
        .map(|record| TorrentRow {
            hash: record.hash().to_string(),
            name: record.snapshot.name.clone(),
            tracker: record.tracker_tag.as_str().to_string(),
            score: record.score,
            hit_and_run: record.hit_and_run,
            hard_link: record.hard_link,
        })
        .collect();
    rows.sort_by(|a, b| a.score.total_cmp(&b.score).then_with(|| a.hash.cmp(&b.hash)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use qbt_flow_config::RunSettings;
    use qbt_flow_test_support::fixtures::{RawTorrent, write_config_dir, write_json};
    use serde_json::json;
    use std::sync::Mutex;
    use std::thread::{self, ThreadId};
    use tempfile::TempDir;

    fn fs_probe() -> Arc<dyn HardLinkProbe> {
        Arc::new(FsHardLinkProbe::new())
    }

    fn context(config: &std::path::Path) -> anyhow::Result<AppContext> {
        context_with(config, &["qbt-flow", "--no-hard-links", "check-config"])
    }

    fn context_with(config: &std::path::Path, args: &[&str]) -> anyhow::Result<AppContext> {
        let cli = Cli::try_parse_from(args)?;
        let settings = RunSettings {
            config_folder: config.to_path_buf(),
            ..RunSettings::default()
        };
        AppContext::with_settings(&cli, settings)
            .map_err(|err| anyhow::anyhow!(err.display_message()))
    }

    #[tokio::test]
    async fn plan_report_tags_and_orders_torrents() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        write_config_dir(temp.path())?;
        let ctx = context(temp.path())?;
        let policy = Arc::new(
            ctx.load_policy()
                .map_err(|err| anyhow::anyhow!(err.display_message()))?,
        );

        let dump = temp.path().join("dump.json");
        write_json(
            &dump,
            &json!([
                RawTorrent::seeding("aaa")
                    .tracker("https://tracker.example.com/announce")
                    .ratio(4.0)
                    .build(),
                RawTorrent::seeding("bbb")
                    .tags(&["Other"])
                    .tracker("https://alpha.example.org/announce")
                    .seeding_time(60)
                    .build(),
                RawTorrent::seeding("ccc")
                    .downloaded(0)
                    .tags(&["cross-seed"])
                    .build(),
                RawTorrent::seeding("ddd").state("downloading").build(),
            ]),
        )?;
        let inspector = JsonDumpInspector::new(&dump);

        let report = build_plan_report(&ctx, policy, fs_probe(), &inspector, "local", false)
            .await
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;
        assert_eq!(report.stats.received, 4);
        assert_eq!(report.stats.included, 3);
        assert_eq!(report.stats.excluded, 1);
        assert_eq!(report.remediation.len(), 1);
        assert_eq!(report.remediation[0].hash, "ccc");
        assert!(
            report
                .torrents
                .windows(2)
                .all(|pair| pair[0].score <= pair[1].score)
        );
        assert!(
            report
                .torrents
                .iter()
                .all(|row| row.hard_link == TriState::NotEvaluated)
        );

        let add = report.plan.add.clone().unwrap_or_default();
        assert_eq!(add.get("Alpha"), Some(&vec!["bbb".to_string()]));
        assert_eq!(add.get("H&R"), Some(&vec!["bbb".to_string()]));

        let snapshot = ctx.metrics.snapshot();
        assert_eq!(snapshot.torrents_seen_total, 4);
        assert_eq!(snapshot.torrents_classified_total, 3);
        assert_eq!(snapshot.torrents_excluded_total, 1);
        assert_eq!(
            snapshot.tag_additions_total,
            u64::try_from(report.plan.additions())?
        );
        Ok(())
    }

    #[tokio::test]
    async fn downloading_only_dump_maps_to_exit_code_four() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        write_config_dir(temp.path())?;
        let ctx = context(temp.path())?;
        let policy = Arc::new(
            ctx.load_policy()
                .map_err(|err| anyhow::anyhow!(err.display_message()))?,
        );

        let dump = temp.path().join("dump.json");
        write_json(
            &dump,
            &json!([
                RawTorrent::seeding("d1").state("downloading").build(),
                RawTorrent::seeding("d2").state("stalledDL").build(),
            ]),
        )?;
        let inspector = JsonDumpInspector::new(&dump);

        let Err(err) = build_plan_report(&ctx, policy, fs_probe(), &inspector, "local", true).await
        else {
            anyhow::bail!("expected a no-qualifying-torrents error");
        };
        assert_eq!(err.exit_code(), 4);
        let snapshot = ctx.metrics.snapshot();
        assert_eq!(snapshot.classify_batch_failures_total, 1);
        assert_eq!(snapshot.torrents_excluded_total, 2);
        Ok(())
    }

    /// Records the thread each probe call runs on.
    #[derive(Default)]
    struct ThreadRecordingProbe {
        threads: Mutex<Vec<ThreadId>>,
    }

    impl HardLinkProbe for ThreadRecordingProbe {
        fn count_hard_links_under(
            &self,
            _path: &std::path::Path,
            _stop_after: Option<u64>,
        ) -> qbt_flow_torrent_core::ProbeResult<u64> {
            if let Ok(mut threads) = self.threads.lock() {
                threads.push(thread::current().id());
            }
            Ok(1)
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn hard_link_walk_stays_off_the_runtime_thread() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        write_config_dir(temp.path())?;
        let ctx = context_with(temp.path(), &["qbt-flow", "check-config"])?;
        assert!(ctx.settings.checks.hard_links);
        let policy = Arc::new(
            ctx.load_policy()
                .map_err(|err| anyhow::anyhow!(err.display_message()))?,
        );

        let dump = temp.path().join("dump.json");
        write_json(
            &dump,
            &json!([
                RawTorrent::seeding("aaa").build(),
                RawTorrent::seeding("bbb").build(),
            ]),
        )?;
        let inspector = JsonDumpInspector::new(&dump);
        let probe = Arc::new(ThreadRecordingProbe::default());

        let report = build_plan_report(&ctx, policy, probe.clone(), &inspector, "local", false)
            .await
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;
        assert!(
            report
                .torrents
                .iter()
                .all(|row| row.hard_link == TriState::True)
        );

        let runtime_thread = thread::current().id();
        let threads = probe
            .threads
            .lock()
            .map_err(|_| anyhow::anyhow!("probe lock poisoned"))?;
        assert_eq!(threads.len(), 2);
        assert!(threads.iter().all(|id| *id != runtime_thread));
        Ok(())
    }
}
