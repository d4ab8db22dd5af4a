use std::path::PathBuf;

use qbt_flow_config::{CheckSwitches, DiskControl, Policy};
use serde::Serialize;

use crate::context::{AppContext, CliResult};
use crate::output::render_policy_summary;

/// Operator-facing view of a loaded policy.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct PolicySummary {
    pub(crate) config_folder: PathBuf,
    pub(crate) download_folder: PathBuf,
    pub(crate) checks: CheckSwitches,
    pub(crate) trackers: Vec<TrackerSummary>,
    pub(crate) clients: Vec<ClientSummary>,
    pub(crate) tags: Vec<TagSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct TrackerSummary {
    pub(crate) tag: String,
    pub(crate) keywords: Vec<String>,
    pub(crate) extra_score: i64,
    pub(crate) hit_and_run: bool,
    pub(crate) auto_manage: bool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ClientSummary {
    pub(crate) name: String,
    pub(crate) downloads_path: PathBuf,
    pub(crate) disk_control: DiskControl,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct TagSummary {
    pub(crate) field: &'static str,
    pub(crate) name: String,
    pub(crate) auto_apply: bool,
}

pub(crate) fn handle_check_config(ctx: &AppContext) -> CliResult<()> {
    let policy = ctx.load_policy()?;
    let summary = summarize(ctx, &policy);
    render_policy_summary(&summary, ctx.output)
}

fn summarize(ctx: &AppContext, policy: &Policy) -> PolicySummary {
    let trackers = policy
        .trackers()
        .iter()
        .map(|tracker| TrackerSummary {
            tag: tracker.tag.clone(),
            keywords: tracker.keywords.clone(),
            extra_score: tracker.extra_score,
            hit_and_run: !tracker.hit_and_run.ignore,
            auto_manage: tracker.auto_manage.is_some(),
        })
        .collect();
    let clients = policy
        .clients()
        .iter()
        .map(|(name, client)| ClientSummary {
            name: name.clone(),
            downloads_path: client.downloads_path.clone(),
            disk_control: client.disk_control.clone(),
        })
        .collect();

    let tag_policy = policy.tags();
    let mut tags: Vec<TagSummary> = [
        ("no_hard_link_tag", &tag_policy.no_hard_link),
        ("hit_and_run_tag", &tag_policy.hit_and_run),
        ("upload_limit_tag", &tag_policy.upload_limit),
        ("download_limit_tag", &tag_policy.download_limit),
        ("public_tag", &tag_policy.public),
        ("tracker_issue_tag", &tag_policy.tracker_issue),
    ]
    .into_iter()
    .map(|(field, rule)| TagSummary {
        field,
        name: rule.name.clone(),
        auto_apply: rule.auto_apply,
    })
    .collect();
    tags.push(TagSummary {
        field: "unknown_tracker_tag",
        name: tag_policy.unknown_tracker.clone(),
        auto_apply: tag_policy.auto_tag_trackers,
    });
    tags.push(TagSummary {
        field: "cross_seed_tag",
        name: tag_policy.cross_seed.clone(),
        auto_apply: false,
    });

    PolicySummary {
        config_folder: ctx.settings.config_folder.clone(),
        download_folder: policy.download_folder().to_path_buf(),
        checks: policy.checks(),
        trackers,
        clients,
        tags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use qbt_flow_config::RunSettings;
    use qbt_flow_test_support::fixtures::write_config_dir;
    use tempfile::TempDir;

    #[test]
    fn summary_lists_trackers_in_file_order() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        write_config_dir(temp.path())?;
        let cli = Cli::try_parse_from(["qbt-flow", "check-config"])?;
        let settings = RunSettings {
            config_folder: temp.path().to_path_buf(),
            ..RunSettings::default()
        };
        let ctx = AppContext::with_settings(&cli, settings)
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;

        let policy = ctx
            .load_policy()
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;
        let summary = summarize(&ctx, &policy);
        let tags: Vec<&str> = summary.trackers.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(tags, ["Alpha", "ExampleTracker"]);
        assert!(summary.trackers[0].hit_and_run);
        assert_eq!(summary.clients[0].name, "local");
        let public = summary
            .tags
            .iter()
            .find(|tag| tag.field == "public_tag")
            .ok_or_else(|| anyhow::anyhow!("public tag missing"))?;
        assert!(public.auto_apply);
        Ok(())
    }

    #[test]
    fn missing_directory_is_reported() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let cli = Cli::try_parse_from(["qbt-flow", "check-config"])?;
        let settings = RunSettings {
            config_folder: temp.path().join("absent"),
            ..RunSettings::default()
        };
        let ctx = AppContext::with_settings(&cli, settings)
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;
        assert!(handle_check_config(&ctx).is_err());
        Ok(())
    }
}
