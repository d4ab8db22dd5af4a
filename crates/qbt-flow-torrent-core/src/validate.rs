//! Coercion of raw client payloads into validated [`TorrentSnapshot`] values.
//!
//! # Design
//! - Decode the client's `/torrents/info` JSON shape directly from a borrowed `Value`.
//! - Reject out-of-range values rather than clamping them; callers skip the torrent.
//! - Normalise client conventions (`-1` = unlimited, comma-joined tags, epoch `0`).

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{SnapshotError, SnapshotResult};
use crate::model::{TorrentSnapshot, TorrentState, TrackerEntry, TrackerStatus};

#[derive(Debug, Deserialize)]
struct ApiTorrent {
    hash: String,
    name: String,
    state: String,
    content_path: String,
    #[serde(default)]
    uploaded: i64,
    #[serde(default)]
    downloaded: i64,
    #[serde(default)]
    ratio: f64,
    #[serde(default)]
    seeding_time: i64,
    #[serde(default)]
    num_complete: i64,
    #[serde(default)]
    num_incomplete: i64,
    #[serde(default)]
    tracker: String,
    #[serde(default)]
    trackers_count: i64,
    #[serde(default)]
    trackers: Vec<ApiTracker>,
    #[serde(default)]
    tags: ApiTags,
    #[serde(default)]
    up_limit: i64,
    #[serde(default)]
    dl_limit: i64,
    #[serde(default)]
    save_path: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    size: i64,
    #[serde(default)]
    added_on: i64,
    #[serde(default)]
    completion_on: i64,
}

#[derive(Debug, Deserialize)]
struct ApiTracker {
    url: String,
    #[serde(default)]
    status: i64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiTags {
    Joined(String),
    List(Vec<String>),
}

impl Default for ApiTags {
    fn default() -> Self {
        Self::Joined(String::new())
    }
}

impl ApiTags {
    fn into_set(self) -> BTreeSet<String> {
        let parts: Vec<String> = match self {
            Self::Joined(text) => text.split(',').map(str::to_string).collect(),
            Self::List(items) => items,
        };
        parts
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

/// Validate a raw client payload and convert it into a [`TorrentSnapshot`].
///
/// # Errors
///
/// Returns [`SnapshotError::Decode`] when the payload does not have the expected
/// shape and [`SnapshotError::InvalidField`] when a decoded value is out of range.
pub fn validate_snapshot(raw: &Value, client: &str) -> SnapshotResult<TorrentSnapshot> {
    let api = ApiTorrent::deserialize(raw).map_err(|source| SnapshotError::Decode {
        hash: raw.get("hash").and_then(Value::as_str).map(str::to_string),
        source,
    })?;
    let hash = api.hash.trim().to_string();
    if hash.is_empty() {
        return Err(SnapshotError::InvalidField {
            hash: None,
            field: "hash",
            reason: "must not be empty",
            value: None,
        });
    }
    let id = Some(hash.as_str());

    if !api.ratio.is_finite() || api.ratio < 0.0 {
        return Err(SnapshotError::invalid(
            id,
            "ratio",
            "must be a finite non-negative number",
            api.ratio,
        ));
    }

    let seeding_secs = non_negative(id, "seeding_time", api.seeding_time)?;
    let trackers_count = u32::try_from(api.trackers_count).map_err(|_| {
        SnapshotError::invalid(
            id,
            "trackers_count",
            "must be a non-negative 32-bit integer",
            api.trackers_count,
        )
    })?;

    Ok(TorrentSnapshot {
        uploaded: non_negative(id, "uploaded", api.uploaded)?,
        downloaded: non_negative(id, "downloaded", api.downloaded)?,
        ratio: api.ratio,
        seeding_time: Duration::from_secs(seeding_secs),
        num_seeders: non_negative(id, "num_complete", api.num_complete)?,
        num_leechers: non_negative(id, "num_incomplete", api.num_incomplete)?,
        state: TorrentState::parse_lossy(&api.state),
        tracker: api.tracker,
        trackers_count,
        trackers: api
            .trackers
            .into_iter()
            .map(|entry| TrackerEntry {
                url: entry.url,
                status: TrackerStatus::from_code(entry.status),
            })
            .collect(),
        tags: api.tags.into_set(),
        up_limit: speed_limit(api.up_limit),
        dl_limit: speed_limit(api.dl_limit),
        content_path: PathBuf::from(api.content_path),
        save_path: PathBuf::from(api.save_path),
        category: api.category,
        size: non_negative(id, "size", api.size)?,
        added_on: timestamp(api.added_on),
        completion_on: timestamp(api.completion_on),
        client: client.to_string(),
        name: api.name,
        hash,
    })
}

fn non_negative(hash: Option<&str>, field: &'static str, value: i64) -> SnapshotResult<u64> {
    u64::try_from(value)
        .map_err(|_| SnapshotError::invalid(hash, field, "must be non-negative", value))
}

fn speed_limit(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    if secs <= 0 {
        return None;
    }
    DateTime::from_timestamp(secs, 0)
}
