//! Invariant checks and parsing helpers for policy documents.
//!
//! # Design
//! - Every check reports the section and field it guards so operators can find the file.
//! - Checks run once, from [`crate::Policy::new`]; nothing downstream repeats them.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::defaults::LOCAL_CLIENT;
use crate::error::{ConfigError, ConfigResult};
use crate::policy::{
    AutoManageRule, ClientPolicy, DiskControl, HitAndRunRule, PolicyParts, ScoringPolicy,
    TagPolicy, TrackerRule,
};

const DURATION_PATTERN: &str = r"^\s*(?:(?P<weeks>\d+(?:\.\d+)?)\s*w)?\s*(?:(?P<days>\d+(?:\.\d+)?)\s*d)?\s*(?:(?P<hours>\d+(?:\.\d+)?)\s*h)?\s*(?:(?P<minutes>\d+(?:\.\d+)?)\s*m)?\s*(?:(?P<seconds>\d+(?:\.\d+)?)\s*s?)?\s*$";

static DURATION_RE: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(DURATION_PATTERN));

const UNIT_SECONDS: [(&str, f64); 5] = [
    ("weeks", 604_800.0),
    ("days", 86_400.0),
    ("hours", 3_600.0),
    ("minutes", 60.0),
    ("seconds", 1.0),
];

/// Parse a duration such as `"2d8h5m20s"`, `"2h 13m"` or `"40"` (seconds).
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the text contains no recognised
/// unit or is malformed.
pub fn parse_duration(section: &str, field: &str, text: &str) -> ConfigResult<Duration> {
    let pattern = DURATION_RE
        .as_ref()
        .map_err(|source| ConfigError::Pattern {
            pattern: DURATION_PATTERN,
            source: source.clone(),
        })?;
    let invalid = || {
        ConfigError::invalid(
            section,
            field,
            Some(text.to_string()),
            "expected a duration such as '8h', '2d8h5m20s' or '2m4s'",
        )
    };

    let captures = pattern.captures(text).ok_or_else(invalid)?;
    let mut total = 0.0_f64;
    let mut matched = false;
    for (unit, seconds) in UNIT_SECONDS {
        if let Some(value) = captures.name(unit) {
            let amount: f64 = value.as_str().parse().map_err(|_| invalid())?;
            total += amount * seconds;
            matched = true;
        }
    }
    if !matched {
        return Err(invalid());
    }
    Duration::try_from_secs_f64(total).map_err(|_| invalid())
}

pub(crate) fn validate_parts(parts: &PolicyParts) -> ConfigResult<()> {
    let mut tracker_tags = HashSet::new();
    for tracker in &parts.trackers {
        validate_tracker(tracker)?;
        if !tracker_tags.insert(tracker.tag.as_str()) {
            return Err(ConfigError::Duplicate {
                section: "trackers".to_string(),
                field: "tracker_tag".to_string(),
                value: tracker.tag.clone(),
            });
        }
    }

    validate_tags(&parts.tags, &tracker_tags)?;
    validate_scoring(&parts.scoring, &parts.tags, &tracker_tags)?;

    if !parts.clients.contains_key(LOCAL_CLIENT) {
        return Err(ConfigError::MissingClient {
            name: LOCAL_CLIENT.to_string(),
        });
    }
    for (name, client) in &parts.clients {
        validate_client(name, client)?;
    }

    ensure_absolute("settings", "download_folder", &parts.download_folder)
}

fn validate_tracker(tracker: &TrackerRule) -> ConfigResult<()> {
    let section = format!("trackers.{}", tracker.tag);
    let tag_ok = tracker.tag.chars().count() >= 2
        && tracker
            .tag
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
    if !tag_ok {
        return Err(ConfigError::invalid(
            "trackers",
            "tracker_tag",
            Some(tracker.tag.clone()),
            "must be at least two characters of [A-Za-z0-9_-]",
        ));
    }
    if tracker.keywords.is_empty() {
        return Err(ConfigError::invalid(
            section,
            "tracker_keywords",
            None,
            "must list at least one keyword",
        ));
    }
    if tracker.keywords.iter().any(|keyword| keyword.is_empty()) {
        return Err(ConfigError::invalid(
            section,
            "tracker_keywords",
            None,
            "keywords must not be empty",
        ));
    }
    if tracker.extra_score < 0 {
        return Err(ConfigError::invalid(
            section,
            "extra_score",
            Some(tracker.extra_score.to_string()),
            "must be zero or positive",
        ));
    }
    validate_hit_and_run(&section, &tracker.hit_and_run)?;
    if let Some(rule) = &tracker.auto_manage {
        validate_auto_manage(&section, rule)?;
    }
    Ok(())
}

fn validate_hit_and_run(section: &str, rule: &HitAndRunRule) -> ConfigResult<()> {
    if !rule.ignore && rule.min_seed_time.is_none() && rule.min_ratio.is_none() {
        return Err(ConfigError::invalid(
            section,
            "hit_and_run",
            None,
            "min_seed_time or min_ratio is required when ignore_hit_and_run is false",
        ));
    }
    if let Some(ratio) = rule.min_ratio {
        ensure_non_negative(section, "hit_and_run.min_ratio", ratio)?;
    }
    Ok(())
}

fn validate_auto_manage(section: &str, rule: &AutoManageRule) -> ConfigResult<()> {
    let protect = rule
        .conditions
        .as_ref()
        .is_some_and(|conditions| conditions.protect_hit_and_run);
    if let Some(ratio) = rule.conditions.as_ref().and_then(|c| c.max_ratio) {
        ensure_non_negative(section, "auto_manage.conditions.max_ratio", ratio)?;
    }
    let Some(action) = &rule.action else {
        return Ok(());
    };
    if action.enabled_flags() > 1 {
        return Err(ConfigError::invalid(
            section,
            "auto_manage.action",
            None,
            "only one action can be set to true",
        ));
    }
    if protect && (action.pause_torrent.is_some() || action.remove_torrent.is_some()) {
        return Err(ConfigError::invalid(
            section,
            "auto_manage.action",
            None,
            "pause_torrent and remove_torrent must be unset when protect_hit_and_run is true",
        ));
    }
    Ok(())
}

fn validate_tags(tags: &TagPolicy, tracker_tags: &HashSet<&str>) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for (field, name) in tags.named() {
        if name.trim().is_empty() {
            return Err(ConfigError::invalid(
                "tags",
                field,
                None,
                "cannot be empty",
            ));
        }
        if !seen.insert(name) || tracker_tags.contains(name) {
            return Err(ConfigError::Duplicate {
                section: "tags".to_string(),
                field: field.to_string(),
                value: name.to_string(),
            });
        }
    }
    Ok(())
}

fn validate_scoring(
    scoring: &ScoringPolicy,
    tags: &TagPolicy,
    tracker_tags: &HashSet<&str>,
) -> ConfigResult<()> {
    ensure_non_negative("scoring", "coef_day_seed_time", scoring.coef_day_seed_time)?;
    ensure_non_negative("scoring", "coef_seed_ratio", scoring.coef_seed_ratio)?;
    ensure_non_negative("scoring", "coef_nums_seeder", scoring.coef_nums_seeder)?;

    for tag in scoring.extra_tags_score.keys() {
        let known = tracker_tags.contains(tag.as_str())
            || tags.named().iter().any(|(_, name)| *name == tag);
        if !known {
            return Err(ConfigError::UnknownReference {
                section: "scoring".to_string(),
                field: "extra_tags_score".to_string(),
                value: tag.clone(),
            });
        }
    }
    Ok(())
}

fn validate_client(name: &str, client: &ClientPolicy) -> ConfigResult<()> {
    let section = format!("clients.{name}");
    ensure_absolute(&section, "path.downloads_path", &client.downloads_path)?;
    ensure_absolute(&section, "path.recycle_bin", &client.recycle_bin)?;
    for (category, path) in &client.categories {
        ensure_absolute(&section, &format!("category.{category}"), path)?;
    }

    match &client.disk_control {
        DiskControl::MaxPercent {
            max_percent,
            path_to_check,
        } => {
            if !(6..=94).contains(max_percent) {
                return Err(ConfigError::invalid(
                    section,
                    "disk_control_method.max_percents",
                    Some(max_percent.to_string()),
                    "must be between 5 and 95",
                ));
            }
            ensure_absolute(&section, "disk_control_method.path_to_check", path_to_check)?;
        }
        DiskControl::KeepFree { keep_free_gib } => {
            if *keep_free_gib < 6 {
                return Err(ConfigError::invalid(
                    section,
                    "disk_control_method.keep_free_gib",
                    Some(keep_free_gib.to_string()),
                    "must be greater than 5",
                ));
            }
        }
    }

    if let Some(endpoint) = &client.endpoint {
        if endpoint.host.trim().is_empty() {
            return Err(ConfigError::invalid(
                section,
                "login.host",
                None,
                "cannot be empty",
            ));
        }
        if endpoint.port == Some(0) {
            return Err(ConfigError::invalid(
                section,
                "login.port",
                Some("0".to_string()),
                "must be between 1 and 65535",
            ));
        }
    }
    Ok(())
}

fn ensure_absolute(section: &str, field: &str, path: &Path) -> ConfigResult<()> {
    if path.is_absolute() {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            section,
            field,
            Some(path.display().to_string()),
            "must be an absolute path",
        ))
    }
}

fn ensure_non_negative(section: &str, field: &str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            section,
            field,
            Some(value.to_string()),
            "must be a finite non-negative number",
        ))
    }
}
