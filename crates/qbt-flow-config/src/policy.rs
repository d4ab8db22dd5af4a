//! Validated, immutable policy consumed by the classification engine.
//!
//! # Design
//! - Rule types are plain data so bootstrap code and tests can assemble them.
//! - `Policy` is only obtainable through [`Policy::new`], which runs every
//!   invariant check once; downstream code never re-validates.
//! - The tracker table keeps configured order; it decides first-match precedence.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::defaults;
use crate::error::ConfigResult;
use crate::validate::validate_parts;

/// Hit-and-run thresholds for a tracker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HitAndRunRule {
    /// Skip hit-and-run evaluation for this tracker.
    pub ignore: bool,
    /// Seeding time at or below which the torrent is still at risk.
    pub min_seed_time: Option<Duration>,
    /// Ratio threshold evaluated after the seed-time threshold.
    pub min_ratio: Option<f64>,
}

impl HitAndRunRule {
    /// Rule that never flags a torrent.
    #[must_use]
    pub const fn ignored() -> Self {
        Self {
            ignore: true,
            min_seed_time: None,
            min_ratio: None,
        }
    }
}

impl Default for HitAndRunRule {
    fn default() -> Self {
        Self::ignored()
    }
}

/// Conditions that would make a torrent eligible for an auto-manage action.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AutoManageConditions {
    /// Seeding time after which the action applies.
    pub max_seed_time: Option<Duration>,
    /// Ratio after which the action applies.
    pub max_ratio: Option<f64>,
    /// Minimum number of active seeders required before acting.
    pub min_active_seeder: Option<u32>,
    /// Never act on torrents still at hit-and-run risk.
    pub protect_hit_and_run: bool,
}

/// Action an auto-manage rule would take.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AutoManageAction {
    /// Upload cap to apply, in bytes per second.
    pub limit_upload_speed: Option<u64>,
    /// Pause the torrent.
    pub pause_torrent: Option<bool>,
    /// Stop the torrent.
    pub stop_torrent: Option<bool>,
    /// Move payload to local storage.
    pub move_to_local: Option<bool>,
    /// Sync payload to remote storage.
    pub sync_to_remote: Option<bool>,
    /// Remove the torrent.
    pub remove_torrent: Option<bool>,
}

impl AutoManageAction {
    pub(crate) fn enabled_flags(&self) -> usize {
        [
            self.pause_torrent,
            self.stop_torrent,
            self.move_to_local,
            self.sync_to_remote,
            self.remove_torrent,
        ]
        .into_iter()
        .filter(|flag| *flag == Some(true))
        .count()
    }
}

/// Per-tracker auto-manage rule; carried and validated, not executed here.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AutoManageRule {
    /// Eligibility conditions.
    pub conditions: Option<AutoManageConditions>,
    /// Action to take when the conditions hold.
    pub action: Option<AutoManageAction>,
}

/// One entry of the ordered tracker table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerRule {
    /// Tag applied to torrents from this tracker.
    pub tag: String,
    /// Substrings matched against the torrent's tracker URL.
    pub keywords: Vec<String>,
    /// Hit-and-run thresholds.
    pub hit_and_run: HitAndRunRule,
    /// Flat score bonus for torrents from this tracker.
    pub extra_score: i64,
    /// Optional auto-manage rule.
    pub auto_manage: Option<AutoManageRule>,
}

/// Symbolic tag name plus its auto-apply switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRule {
    /// Tag name as it appears on the client.
    pub name: String,
    /// Whether the engine may add and remove this tag.
    pub auto_apply: bool,
}

impl TagRule {
    /// Tag rule with auto-apply disabled.
    #[must_use]
    pub fn manual(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            auto_apply: false,
        }
    }

    /// Tag rule with auto-apply enabled.
    #[must_use]
    pub fn auto(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            auto_apply: true,
        }
    }
}

/// Tag table: one entry per derived condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagPolicy {
    /// Applied when a torrent's payload has no hard links.
    pub no_hard_link: TagRule,
    /// Applied when a torrent is still at hit-and-run risk.
    pub hit_and_run: TagRule,
    /// Applied when an upload cap is in effect.
    pub upload_limit: TagRule,
    /// Applied when a download cap is in effect.
    pub download_limit: TagRule,
    /// Applied to public-tracker torrents.
    pub public: TagRule,
    /// Applied when a tracker reports it is not working.
    pub tracker_issue: TagRule,
    /// Whether tracker tags are added automatically.
    pub auto_tag_trackers: bool,
    /// Tag used when no tracker keyword matches.
    pub unknown_tracker: String,
    /// Tag set by an external cross-seed tool; read, never written.
    pub cross_seed: String,
}

impl TagPolicy {
    /// Every configured tag name paired with the field it came from.
    #[must_use]
    pub fn named(&self) -> [(&'static str, &str); 8] {
        [
            ("no_hard_link_tag", self.no_hard_link.name.as_str()),
            ("hit_and_run_tag", self.hit_and_run.name.as_str()),
            ("upload_limit_tag", self.upload_limit.name.as_str()),
            ("download_limit_tag", self.download_limit.name.as_str()),
            ("public_tag", self.public.name.as_str()),
            ("tracker_issue_tag", self.tracker_issue.name.as_str()),
            ("unknown_tracker_tag", self.unknown_tracker.as_str()),
            ("cross_seed_tag", self.cross_seed.as_str()),
        ]
    }
}

impl Default for TagPolicy {
    fn default() -> Self {
        Self {
            no_hard_link: TagRule::manual(defaults::NO_HARD_LINK_TAG),
            hit_and_run: TagRule::manual(defaults::HIT_AND_RUN_TAG),
            upload_limit: TagRule::manual(defaults::UPLOAD_LIMIT_TAG),
            download_limit: TagRule::manual(defaults::DOWNLOAD_LIMIT_TAG),
            public: TagRule::manual(defaults::PUBLIC_TAG),
            tracker_issue: TagRule::manual(defaults::TRACKER_ISSUE_TAG),
            auto_tag_trackers: false,
            unknown_tracker: defaults::UNKNOWN_TRACKER_TAG.to_string(),
            cross_seed: defaults::CROSS_SEED_TAG.to_string(),
        }
    }
}

/// Scoring coefficients and tag bonuses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringPolicy {
    /// Weight per day of seeding.
    pub coef_day_seed_time: f64,
    /// Weight per unit of ratio.
    pub coef_seed_ratio: f64,
    /// Weight per seeder in the swarm.
    pub coef_nums_seeder: f64,
    /// Bonus per tag name; overrides tracker `extra_score` on collision.
    pub extra_tags_score: BTreeMap<String, i64>,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            coef_day_seed_time: defaults::COEF_DAY_SEED_TIME,
            coef_seed_ratio: defaults::COEF_SEED_RATIO,
            coef_nums_seeder: defaults::COEF_NUMS_SEEDER,
            extra_tags_score: BTreeMap::new(),
        }
    }
}

/// Disk-space control method for a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum DiskControl {
    /// Keep local usage of `path_to_check` below `max_percent`.
    MaxPercent {
        /// Usage ceiling, exclusive range 5..95.
        max_percent: u8,
        /// Local path whose filesystem is measured.
        path_to_check: PathBuf,
    },
    /// Keep at least `keep_free_gib` GiB free as reported by the client.
    KeepFree {
        /// Free-space floor in GiB.
        keep_free_gib: u64,
    },
}

/// Connection details for a client; credentials are not retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientEndpoint {
    /// Host (optionally with port) of the client web UI.
    pub host: String,
    /// Explicit port.
    pub port: Option<u16>,
    /// Login user name.
    pub username: String,
}

/// Per-client paths and disk policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientPolicy {
    /// Download root as seen by the client.
    pub downloads_path: PathBuf,
    /// Recycle bin used by removal tooling.
    pub recycle_bin: PathBuf,
    /// Category name to absolute save path.
    pub categories: BTreeMap<String, PathBuf>,
    /// Disk-space control method.
    pub disk_control: DiskControl,
    /// Web UI endpoint, when configured.
    pub endpoint: Option<ClientEndpoint>,
}

/// Run-level switches for checks that have no tag of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckSwitches {
    /// Probe the filesystem for hard links.
    pub hard_links: bool,
    /// Detect cross-seeded torrents needing remediation.
    pub cross_seed: bool,
}

impl Default for CheckSwitches {
    fn default() -> Self {
        Self {
            hard_links: true,
            cross_seed: true,
        }
    }
}

/// Unvalidated building blocks for a [`Policy`].
#[derive(Debug, Clone)]
pub struct PolicyParts {
    /// Ordered tracker table.
    pub trackers: Vec<TrackerRule>,
    /// Tag table.
    pub tags: TagPolicy,
    /// Scoring coefficients.
    pub scoring: ScoringPolicy,
    /// Client definitions by name.
    pub clients: BTreeMap<String, ClientPolicy>,
    /// Run-level check switches.
    pub checks: CheckSwitches,
    /// Canonical local download folder used to resolve client content paths.
    pub download_folder: PathBuf,
}

/// Validated, immutable policy for a run.
#[derive(Debug, Clone, Serialize)]
pub struct Policy {
    trackers: Vec<TrackerRule>,
    tags: TagPolicy,
    scoring: ScoringPolicy,
    clients: BTreeMap<String, ClientPolicy>,
    checks: CheckSwitches,
    download_folder: PathBuf,
    #[serde(skip)]
    extra_scores: HashMap<String, f64>,
}

impl Policy {
    /// Validate `parts` and freeze them into a policy.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::ConfigError`] describing the first invariant that does not hold.
    pub fn new(parts: PolicyParts) -> ConfigResult<Self> {
        validate_parts(&parts)?;

        let mut extra_scores: HashMap<String, f64> = parts
            .trackers
            .iter()
            .map(|tracker| (tracker.tag.clone(), score_value(tracker.extra_score)))
            .collect();
        for (tag, bonus) in &parts.scoring.extra_tags_score {
            extra_scores.insert(tag.clone(), score_value(*bonus));
        }

        Ok(Self {
            trackers: parts.trackers,
            tags: parts.tags,
            scoring: parts.scoring,
            clients: parts.clients,
            checks: parts.checks,
            download_folder: parts.download_folder,
            extra_scores,
        })
    }

    /// Tracker table in configured order.
    #[must_use]
    pub fn trackers(&self) -> &[TrackerRule] {
        &self.trackers
    }

    /// Tracker rule for `tag`.
    #[must_use]
    pub fn tracker(&self, tag: &str) -> Option<&TrackerRule> {
        self.trackers.iter().find(|tracker| tracker.tag == tag)
    }

    /// Tag table.
    #[must_use]
    pub const fn tags(&self) -> &TagPolicy {
        &self.tags
    }

    /// Scoring coefficients.
    #[must_use]
    pub const fn scoring(&self) -> &ScoringPolicy {
        &self.scoring
    }

    /// Client definition by name.
    #[must_use]
    pub fn client(&self, name: &str) -> Option<&ClientPolicy> {
        self.clients.get(name)
    }

    /// All client definitions.
    #[must_use]
    pub const fn clients(&self) -> &BTreeMap<String, ClientPolicy> {
        &self.clients
    }

    /// Run-level check switches.
    #[must_use]
    pub const fn checks(&self) -> CheckSwitches {
        self.checks
    }

    /// Canonical local download folder.
    #[must_use]
    pub fn download_folder(&self) -> &Path {
        &self.download_folder
    }

    /// Flat bonus for `tag`: tracker `extra_score` merged with scoring overrides.
    #[must_use]
    pub fn extra_score(&self, tag: &str) -> f64 {
        self.extra_scores.get(tag).copied().unwrap_or(0.0)
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "score bonuses are small operator-provided integers"
)]
const fn score_value(value: i64) -> f64 {
    value as f64
}
