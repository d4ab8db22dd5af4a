//! Sample policies, raw torrent payloads, and on-disk config directories.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use qbt_flow_config::{
    CheckSwitches, ClientEndpoint, ClientPolicy, DiskControl, HitAndRunRule, Policy, PolicyParts,
    ScoringPolicy, TagPolicy, TagRule, TrackerRule,
};
use qbt_flow_torrent_core::{TorrentSnapshot, validate_snapshot};
use serde_json::{Map, Value, json};

/// Policy parts with two trackers and every tag switched on.
///
/// - `Alpha` (`alpha.example.org`): hit-and-run until one hour of seeding.
/// - `ExampleTracker` (`tracker.example.com`): hit-and-run ignored, `extra_score` 5.
/// - `local` client rooted at `/qBittorrent`, download folder `/downloads`.
#[must_use]
pub fn sample_policy_parts() -> PolicyParts {
    let auto = |rule: TagRule| TagRule::auto(rule.name);
    let defaults = TagPolicy::default();
    PolicyParts {
        trackers: vec![
            TrackerRule {
                tag: "Alpha".to_string(),
                keywords: vec!["alpha.example.org".to_string()],
                hit_and_run: HitAndRunRule {
                    ignore: false,
                    min_seed_time: Some(Duration::from_secs(3_600)),
                    min_ratio: None,
                },
                extra_score: 0,
                auto_manage: None,
            },
            TrackerRule {
                tag: "ExampleTracker".to_string(),
                keywords: vec!["tracker.example.com".to_string()],
                hit_and_run: HitAndRunRule::ignored(),
                extra_score: 5,
                auto_manage: None,
            },
        ],
        tags: TagPolicy {
            no_hard_link: auto(defaults.no_hard_link),
            hit_and_run: auto(defaults.hit_and_run),
            upload_limit: auto(defaults.upload_limit),
            download_limit: auto(defaults.download_limit),
            public: auto(defaults.public),
            tracker_issue: auto(defaults.tracker_issue),
            auto_tag_trackers: true,
            unknown_tracker: defaults.unknown_tracker,
            cross_seed: defaults.cross_seed,
        },
        scoring: ScoringPolicy::default(),
        clients: BTreeMap::from([("local".to_string(), local_client())]),
        checks: CheckSwitches::default(),
        download_folder: PathBuf::from("/downloads"),
    }
}

/// Validated form of [`sample_policy_parts`].
///
/// # Errors
///
/// Fails only if the sample parts stop satisfying policy validation.
pub fn sample_policy() -> Result<Policy> {
    Ok(Policy::new(sample_policy_parts())?)
}

fn local_client() -> ClientPolicy {
    ClientPolicy {
        downloads_path: PathBuf::from("/qBittorrent"),
        recycle_bin: PathBuf::from("/qBittorrent/.RecycleBin"),
        categories: BTreeMap::new(),
        disk_control: DiskControl::MaxPercent {
            max_percent: 85,
            path_to_check: PathBuf::from("/downloads"),
        },
        endpoint: Some(ClientEndpoint {
            host: "qbittorrent".to_string(),
            port: Some(8080),
            username: "admin".to_string(),
        }),
    }
}

/// Builder for raw `/torrents/info` payloads.
#[derive(Debug, Clone)]
pub struct RawTorrent {
    fields: Map<String, Value>,
    trackers: Vec<Value>,
}

impl RawTorrent {
    /// A completed, uploading torrent on an unconfigured tracker with no tags.
    #[must_use]
    pub fn seeding(hash: impl Into<String>) -> Self {
        let hash = hash.into();
        let name = format!("torrent-{hash}");
        let content_path = format!("/qBittorrent/{hash}");
        let value = json!({
            "hash": hash,
            "name": name,
            "state": "uploading",
            "content_path": content_path,
            "save_path": "/qBittorrent",
            "uploaded": 4_096,
            "downloaded": 2_048,
            "ratio": 2.0,
            "seeding_time": 86_400,
            "num_complete": 10,
            "num_incomplete": 1,
            "tracker": "udp://open.unknown.net:1337/announce",
            "trackers_count": 1,
            "tags": "",
            "up_limit": -1,
            "dl_limit": -1,
            "category": "",
            "size": 2_048,
            "added_on": 1_700_000_000,
            "completion_on": 1_700_003_600,
        });
        let fields = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            fields,
            trackers: Vec::new(),
        }
    }

    fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Client state string.
    #[must_use]
    pub fn state(self, state: &str) -> Self {
        self.set("state", state)
    }

    /// Tracker URL.
    #[must_use]
    pub fn tracker(self, url: &str) -> Self {
        self.set("tracker", url)
    }

    /// Tag list, joined the way the client reports it.
    #[must_use]
    pub fn tags(self, tags: &[&str]) -> Self {
        self.set("tags", tags.join(", "))
    }

    /// Share ratio.
    #[must_use]
    pub fn ratio(self, ratio: f64) -> Self {
        self.set("ratio", ratio)
    }

    /// Seeding time in seconds.
    #[must_use]
    pub fn seeding_time(self, secs: u64) -> Self {
        self.set("seeding_time", secs)
    }

    /// Seeders in the swarm.
    #[must_use]
    pub fn seeders(self, count: u64) -> Self {
        self.set("num_complete", count)
    }

    /// Bytes downloaded.
    #[must_use]
    pub fn downloaded(self, bytes: u64) -> Self {
        self.set("downloaded", bytes)
    }

    /// Number of trackers, pseudo-trackers included.
    #[must_use]
    pub fn trackers_count(self, count: u32) -> Self {
        self.set("trackers_count", count)
    }

    /// Upload limit in bytes per second; `-1` means unlimited.
    #[must_use]
    pub fn up_limit(self, limit: i64) -> Self {
        self.set("up_limit", limit)
    }

    /// Download limit in bytes per second; `-1` means unlimited.
    #[must_use]
    pub fn dl_limit(self, limit: i64) -> Self {
        self.set("dl_limit", limit)
    }

    /// Content path as seen by the client.
    #[must_use]
    pub fn content_path(self, path: impl Into<String>) -> Self {
        self.set("content_path", path.into())
    }

    /// Append a tracker listing row with a numeric status code.
    #[must_use]
    pub fn tracker_status(mut self, url: &str, status: i64) -> Self {
        self.trackers.push(json!({ "url": url, "status": status }));
        self
    }

    /// Raw payload.
    #[must_use]
    pub fn build(self) -> Value {
        let mut fields = self.fields;
        if !self.trackers.is_empty() {
            fields.insert("trackers".to_string(), Value::Array(self.trackers));
        }
        Value::Object(fields)
    }

    /// Validated snapshot attributed to `client`.
    ///
    /// # Errors
    ///
    /// Returns the validation failure for payloads built out of range.
    pub fn snapshot(self, client: &str) -> Result<TorrentSnapshot> {
        Ok(validate_snapshot(&self.build(), client)?)
    }
}

/// Write a complete configuration directory under `root` matching [`sample_policy_parts`].
///
/// # Errors
///
/// Returns IO or serialisation failures.
pub fn write_config_dir(root: &Path) -> Result<()> {
    write_json(
        &root.join("trackers/10_alpha.json"),
        &json!({
            "tracker_tag": "Alpha",
            "tracker_keywords": ["alpha.example.org"],
            "hit_and_run": { "ignore_hit_and_run": false, "min_seed_time": "1h" }
        }),
    )?;
    write_json(
        &root.join("trackers/20_example.json"),
        &json!({
            "tracker_tag": "ExampleTracker",
            "tracker_keywords": ["tracker.example.com"],
            "extra_score": 5,
            "hit_and_run": { "ignore_hit_and_run": true }
        }),
    )?;
    write_json(
        &root.join("clients/local_client_config.json"),
        &json!({
            "login": { "host": "qbittorrent", "port": 8080, "username": "admin", "password": "adminadmin" },
            "disk_control_method": { "max_percents": 85, "path_to_check": "/downloads" },
            "path": { "downloads_path": "/qBittorrent", "recycle_bin": "/qBittorrent/.RecycleBin" }
        }),
    )?;
    write_json(&root.join("scoring.json"), &json!({}))?;
    write_json(
        &root.join("tags.json"),
        &json!({
            "auto_tags_no_hard_link": true,
            "auto_tags_hit_and_run": true,
            "auto_tags_upload_limit": true,
            "auto_tags_download_limit": true,
            "auto_tags_public": true,
            "auto_tags_tracker_issue": true,
            "auto_tags_trackers": true
        }),
    )?;
    Ok(())
}

/// Serialise `value` to `path`, creating parent directories.
///
/// # Errors
///
/// Returns IO or serialisation failures.
pub fn write_json(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_vec_pretty(value)?)?;
    Ok(())
}
