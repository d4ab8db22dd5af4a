//! On-disk configuration documents and their conversion into policy rules.
//!
//! # Design
//! - Documents mirror the files operators write; unknown fields are rejected.
//! - Conversions only reshape data and parse durations. Invariants are checked
//!   afterwards by [`crate::Policy::new`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};
use crate::policy::{
    AutoManageAction, AutoManageConditions, AutoManageRule, ClientEndpoint, ClientPolicy,
    DiskControl, HitAndRunRule, ScoringPolicy, TagPolicy, TagRule, TrackerRule,
};
use crate::validate::parse_duration;

/// Duration given either as whole seconds or as text such as `"2d8h"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    /// Whole seconds.
    Seconds(u64),
    /// Unit-suffixed text.
    Text(String),
}

impl DurationValue {
    fn resolve(&self, section: &str, field: &str) -> ConfigResult<Duration> {
        match self {
            Self::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            Self::Text(text) => parse_duration(section, field, text),
        }
    }
}

/// Hit-and-run block of a tracker document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HitAndRunDocument {
    /// Skip hit-and-run evaluation.
    #[serde(default = "default_true")]
    pub ignore_hit_and_run: bool,
    /// Minimum seeding time.
    #[serde(default)]
    pub min_seed_time: Option<DurationValue>,
    /// Minimum ratio.
    #[serde(default)]
    pub min_ratio: Option<f64>,
}

/// Auto-manage conditions block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutoManageConditionsDocument {
    /// Maximum seeding time.
    #[serde(default)]
    pub max_seed_time: Option<DurationValue>,
    /// Maximum ratio.
    #[serde(default)]
    pub max_ratio: Option<f64>,
    /// Minimum active seeders.
    #[serde(default)]
    pub min_active_seeder: Option<u32>,
    /// Never act on torrents at hit-and-run risk.
    #[serde(default)]
    pub protect_hit_and_run: bool,
}

/// Auto-manage action block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutoManageActionDocument {
    /// Upload cap in bytes per second.
    #[serde(default)]
    pub limit_upload_speed: Option<u64>,
    /// Pause the torrent.
    #[serde(default)]
    pub pause_torrent: Option<bool>,
    /// Stop the torrent.
    #[serde(default)]
    pub stop_torrent: Option<bool>,
    /// Move payload to local storage.
    #[serde(default)]
    pub move_to_local: Option<bool>,
    /// Sync payload to remote storage.
    #[serde(default)]
    pub sync_to_remote: Option<bool>,
    /// Remove the torrent.
    #[serde(default)]
    pub remove_torrent: Option<bool>,
}

/// Auto-manage block of a tracker document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutoManageDocument {
    /// Eligibility conditions.
    #[serde(default)]
    pub conditions: Option<AutoManageConditionsDocument>,
    /// Action to take.
    #[serde(default)]
    pub action: Option<AutoManageActionDocument>,
}

/// One tracker file under `trackers/`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerDocument {
    /// Tag applied to torrents from this tracker.
    pub tracker_tag: String,
    /// Substrings matched against tracker URLs.
    pub tracker_keywords: Vec<String>,
    /// Flat score bonus.
    #[serde(default)]
    pub extra_score: i64,
    /// Hit-and-run thresholds.
    pub hit_and_run: HitAndRunDocument,
    /// Optional auto-manage rule.
    #[serde(default)]
    pub auto_manage: Option<AutoManageDocument>,
}

impl TrackerDocument {
    /// Convert into a tracker rule, parsing duration fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when a duration cannot be parsed.
    pub fn into_rule(self) -> ConfigResult<TrackerRule> {
        let section = format!("trackers.{}", self.tracker_tag);
        let min_seed_time = self
            .hit_and_run
            .min_seed_time
            .as_ref()
            .map(|value| value.resolve(&section, "hit_and_run.min_seed_time"))
            .transpose()?;
        let auto_manage = self
            .auto_manage
            .map(|doc| convert_auto_manage(&section, doc))
            .transpose()?;

        Ok(TrackerRule {
            tag: self.tracker_tag,
            keywords: self.tracker_keywords,
            hit_and_run: HitAndRunRule {
                ignore: self.hit_and_run.ignore_hit_and_run,
                min_seed_time,
                min_ratio: self.hit_and_run.min_ratio,
            },
            extra_score: self.extra_score,
            auto_manage,
        })
    }
}

fn convert_auto_manage(section: &str, doc: AutoManageDocument) -> ConfigResult<AutoManageRule> {
    let conditions = doc
        .conditions
        .map(|conditions| -> ConfigResult<AutoManageConditions> {
            Ok(AutoManageConditions {
                max_seed_time: conditions
                    .max_seed_time
                    .as_ref()
                    .map(|value| value.resolve(section, "auto_manage.conditions.max_seed_time"))
                    .transpose()?,
                max_ratio: conditions.max_ratio,
                min_active_seeder: conditions.min_active_seeder,
                protect_hit_and_run: conditions.protect_hit_and_run,
            })
        })
        .transpose()?;
    let action = doc.action.map(|action| AutoManageAction {
        limit_upload_speed: action.limit_upload_speed,
        pause_torrent: action.pause_torrent,
        stop_torrent: action.stop_torrent,
        move_to_local: action.move_to_local,
        sync_to_remote: action.sync_to_remote,
        remove_torrent: action.remove_torrent,
    });
    Ok(AutoManageRule { conditions, action })
}

/// `tags` document: tag names and their auto-apply switches.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "mirrors the flat auto_tags_* switches operators write"
)]
pub struct TagsDocument {
    /// Auto-apply the no-hard-link tag.
    pub auto_tags_no_hard_link: bool,
    /// No-hard-link tag name.
    pub no_hard_link_tag: String,
    /// Auto-apply the hit-and-run tag.
    pub auto_tags_hit_and_run: bool,
    /// Hit-and-run tag name.
    pub hit_and_run_tag: String,
    /// Auto-apply the upload-limit tag.
    pub auto_tags_upload_limit: bool,
    /// Upload-limit tag name.
    pub upload_limit_tag: String,
    /// Auto-apply the download-limit tag.
    pub auto_tags_download_limit: bool,
    /// Download-limit tag name.
    pub download_limit_tag: String,
    /// Auto-apply the public tag.
    pub auto_tags_public: bool,
    /// Public tag name.
    pub public_tag: String,
    /// Auto-apply the tracker-issue tag.
    pub auto_tags_tracker_issue: bool,
    /// Tracker-issue tag name.
    pub tracker_issue_tag: String,
    /// Auto-apply tracker tags.
    pub auto_tags_trackers: bool,
    /// Tag used when no tracker matches.
    pub unknown_tracker_tag: String,
    /// Tag written by the external cross-seed tool.
    pub cross_seed_tag: String,
}

impl Default for TagsDocument {
    fn default() -> Self {
        Self {
            auto_tags_no_hard_link: false,
            no_hard_link_tag: defaults::NO_HARD_LINK_TAG.to_string(),
            auto_tags_hit_and_run: false,
            hit_and_run_tag: defaults::HIT_AND_RUN_TAG.to_string(),
            auto_tags_upload_limit: false,
            upload_limit_tag: defaults::UPLOAD_LIMIT_TAG.to_string(),
            auto_tags_download_limit: false,
            download_limit_tag: defaults::DOWNLOAD_LIMIT_TAG.to_string(),
            auto_tags_public: false,
            public_tag: defaults::PUBLIC_TAG.to_string(),
            auto_tags_tracker_issue: false,
            tracker_issue_tag: defaults::TRACKER_ISSUE_TAG.to_string(),
            auto_tags_trackers: false,
            unknown_tracker_tag: defaults::UNKNOWN_TRACKER_TAG.to_string(),
            cross_seed_tag: defaults::CROSS_SEED_TAG.to_string(),
        }
    }
}

const fn rule(name: String, auto_apply: bool) -> TagRule {
    TagRule { name, auto_apply }
}

impl From<TagsDocument> for TagPolicy {
    fn from(doc: TagsDocument) -> Self {
        Self {
            no_hard_link: rule(doc.no_hard_link_tag, doc.auto_tags_no_hard_link),
            hit_and_run: rule(doc.hit_and_run_tag, doc.auto_tags_hit_and_run),
            upload_limit: rule(doc.upload_limit_tag, doc.auto_tags_upload_limit),
            download_limit: rule(doc.download_limit_tag, doc.auto_tags_download_limit),
            public: rule(doc.public_tag, doc.auto_tags_public),
            tracker_issue: rule(doc.tracker_issue_tag, doc.auto_tags_tracker_issue),
            auto_tag_trackers: doc.auto_tags_trackers,
            unknown_tracker: doc.unknown_tracker_tag,
            cross_seed: doc.cross_seed_tag,
        }
    }
}

/// Coefficients block of the `scoring` document.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreCalculationDocument {
    /// Weight per day of seeding.
    pub coef_day_seed_time: f64,
    /// Weight per unit of ratio.
    pub coef_seed_ratio: f64,
    /// Weight per seeder.
    pub coef_nums_seeder: f64,
}

impl Default for ScoreCalculationDocument {
    fn default() -> Self {
        Self {
            coef_day_seed_time: defaults::COEF_DAY_SEED_TIME,
            coef_seed_ratio: defaults::COEF_SEED_RATIO,
            coef_nums_seeder: defaults::COEF_NUMS_SEEDER,
        }
    }
}

/// `scoring` document at the config root.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringDocument {
    /// Bonus per tag name.
    pub extra_tags_score: BTreeMap<String, i64>,
    /// Coefficients.
    pub score_calculation: ScoreCalculationDocument,
}

impl From<ScoringDocument> for ScoringPolicy {
    fn from(doc: ScoringDocument) -> Self {
        Self {
            coef_day_seed_time: doc.score_calculation.coef_day_seed_time,
            coef_seed_ratio: doc.score_calculation.coef_seed_ratio,
            coef_nums_seeder: doc.score_calculation.coef_nums_seeder,
            extra_tags_score: doc.extra_tags_score,
        }
    }
}

/// Login block of a client document. The password is accepted but never retained.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginDocument {
    /// Web UI host.
    pub host: String,
    /// Web UI port.
    #[serde(default)]
    pub port: Option<u16>,
    /// User name.
    pub username: String,
    /// Password.
    #[serde(default)]
    pub password: Option<String>,
}

/// Disk control block of a client document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiskControlDocument {
    /// Usage ceiling in percent.
    #[serde(default)]
    pub max_percents: Option<u8>,
    /// Local path measured for `max_percents`.
    #[serde(default)]
    pub path_to_check: Option<PathBuf>,
    /// Free-space floor in GiB.
    #[serde(default)]
    pub keep_free_gib: Option<u64>,
}

/// Path block of a client document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientPathDocument {
    /// Download root as seen by the client.
    pub downloads_path: PathBuf,
    /// Recycle bin.
    pub recycle_bin: PathBuf,
}

/// One client file under `clients/`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientDocument {
    /// Web UI login.
    pub login: LoginDocument,
    /// Disk control method.
    pub disk_control_method: DiskControlDocument,
    /// Category name to save path.
    #[serde(default)]
    pub category: BTreeMap<String, PathBuf>,
    /// Client paths.
    pub path: ClientPathDocument,
}

impl ClientDocument {
    /// Convert into a client policy for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] unless exactly one disk control
    /// method is configured, or when `max_percents` lacks `path_to_check`.
    pub fn into_policy(self, name: &str) -> ConfigResult<ClientPolicy> {
        let section = format!("clients.{name}");
        let disk = self.disk_control_method;
        let disk_control = match (disk.max_percents, disk.keep_free_gib) {
            (Some(max_percent), None) => {
                let path_to_check = disk.path_to_check.ok_or_else(|| {
                    ConfigError::invalid(
                        section.as_str(),
                        "disk_control_method.path_to_check",
                        None,
                        "required when max_percents is set",
                    )
                })?;
                DiskControl::MaxPercent {
                    max_percent,
                    path_to_check,
                }
            }
            (None, Some(keep_free_gib)) => DiskControl::KeepFree { keep_free_gib },
            (Some(_), Some(_)) => {
                return Err(ConfigError::invalid(
                    section,
                    "disk_control_method",
                    None,
                    "set either max_percents or keep_free_gib, not both",
                ));
            }
            (None, None) => {
                return Err(ConfigError::invalid(
                    section,
                    "disk_control_method",
                    None,
                    "either max_percents or keep_free_gib must be provided",
                ));
            }
        };

        Ok(ClientPolicy {
            downloads_path: self.path.downloads_path,
            recycle_bin: self.path.recycle_bin,
            categories: self.category,
            disk_control,
            endpoint: Some(ClientEndpoint {
                host: self.login.host,
                port: self.login.port,
                username: self.login.username,
            }),
        })
    }
}

const fn default_true() -> bool {
    true
}
