//! Validated torrent snapshot types shared across the workspace.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read-only view of a single torrent as reported by a client daemon.
///
/// Instances are produced by [`crate::validate_snapshot`]; every numeric field
/// has already been range-checked and the tag set carries no duplicates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TorrentSnapshot {
    /// Info-hash, stable across a run.
    pub hash: String,
    /// Display name.
    pub name: String,
    /// Total bytes uploaded.
    pub uploaded: u64,
    /// Total bytes downloaded.
    pub downloaded: u64,
    /// Share ratio reported by the client.
    pub ratio: f64,
    /// Time spent seeding while complete.
    pub seeding_time: Duration,
    /// Seeds in the swarm.
    pub num_seeders: u64,
    /// Leechers in the swarm.
    pub num_leechers: u64,
    /// Client lifecycle state.
    pub state: TorrentState,
    /// URL of the first working tracker; empty when none is working.
    pub tracker: String,
    /// Number of trackers the client reports for the torrent.
    pub trackers_count: u32,
    /// Per-tracker status entries when the client supplied them.
    #[serde(default)]
    pub trackers: Vec<TrackerEntry>,
    /// Labels currently attached to the torrent.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Upload cap in bytes per second, `0` when unlimited.
    pub up_limit: u64,
    /// Download cap in bytes per second, `0` when unlimited.
    pub dl_limit: u64,
    /// Absolute content path (root directory or single file) on the client host.
    pub content_path: PathBuf,
    /// Save path on the client host.
    pub save_path: PathBuf,
    /// Client category, empty when unset.
    #[serde(default)]
    pub category: String,
    /// Total selected size in bytes.
    pub size: u64,
    /// When the torrent was added to the client.
    pub added_on: Option<DateTime<Utc>>,
    /// When the torrent completed, if it has.
    pub completion_on: Option<DateTime<Utc>>,
    /// Name of the client the snapshot was read from.
    pub client: String,
}

impl TorrentSnapshot {
    /// Whether the torrent currently carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Seeding time expressed in fractional days.
    #[must_use]
    pub fn seeding_days(&self) -> f64 {
        self.seeding_time.as_secs_f64() / SECONDS_PER_DAY
    }
}

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Tracker row as reported by the client's tracker listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackerEntry {
    /// Announce URL, or a pseudo-tracker label such as `** [DHT] **`.
    pub url: String,
    /// Announce status.
    pub status: TrackerStatus,
}

/// Announce status codes used by the client's tracker listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrackerStatus {
    /// Tracker is disabled (used for DHT, PEX, LSD pseudo-trackers).
    Disabled,
    /// Tracker has not been contacted yet.
    NotContacted,
    /// Tracker has been contacted and is working.
    Working,
    /// Tracker is updating.
    Updating,
    /// Tracker has been contacted but is not working.
    NotWorking,
    /// Status code outside the documented range.
    Unknown,
}

impl TrackerStatus {
    /// Map a numeric status code from the client API.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Disabled,
            1 => Self::NotContacted,
            2 => Self::Working,
            3 => Self::Updating,
            4 => Self::NotWorking,
            _ => Self::Unknown,
        }
    }
}

/// Client lifecycle states, named after the client API's state strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TorrentState {
    /// Some error occurred.
    #[serde(rename = "error")]
    Error,
    /// Payload files are missing.
    #[serde(rename = "missingFiles")]
    MissingFiles,
    /// Seeding with data being transferred.
    #[serde(rename = "uploading")]
    Uploading,
    /// Complete and paused.
    #[serde(rename = "pausedUP")]
    PausedUp,
    /// Complete and stopped (newer client name for `pausedUP`).
    #[serde(rename = "stoppedUP")]
    StoppedUp,
    /// Complete and queued for upload.
    #[serde(rename = "queuedUP")]
    QueuedUp,
    /// Seeding with no connected peers.
    #[serde(rename = "stalledUP")]
    StalledUp,
    /// Complete and being rechecked.
    #[serde(rename = "checkingUP")]
    CheckingUp,
    /// Forced to upload regardless of queue limits.
    #[serde(rename = "forcedUP")]
    ForcedUp,
    /// Allocating disk space.
    #[serde(rename = "allocating")]
    Allocating,
    /// Downloading payload data.
    #[serde(rename = "downloading")]
    Downloading,
    /// Fetching metadata.
    #[serde(rename = "metaDL")]
    MetaDl,
    /// Forced metadata fetch.
    #[serde(rename = "forcedMetaDL")]
    ForcedMetaDl,
    /// Incomplete and paused.
    #[serde(rename = "pausedDL")]
    PausedDl,
    /// Incomplete and stopped.
    #[serde(rename = "stoppedDL")]
    StoppedDl,
    /// Incomplete and queued.
    #[serde(rename = "queuedDL")]
    QueuedDl,
    /// Downloading with no connected peers.
    #[serde(rename = "stalledDL")]
    StalledDl,
    /// Incomplete and being rechecked.
    #[serde(rename = "checkingDL")]
    CheckingDl,
    /// Forced to download regardless of queue limits.
    #[serde(rename = "forcedDL")]
    ForcedDl,
    /// Checking resume data on startup.
    #[serde(rename = "checkingResumeData")]
    CheckingResumeData,
    /// Moving to another location.
    #[serde(rename = "moving")]
    Moving,
    /// Unrecognised state string.
    #[serde(rename = "unknown")]
    Unknown,
}

impl TorrentState {
    const ALL: [Self; 22] = [
        Self::Error,
        Self::MissingFiles,
        Self::Uploading,
        Self::PausedUp,
        Self::StoppedUp,
        Self::QueuedUp,
        Self::StalledUp,
        Self::CheckingUp,
        Self::ForcedUp,
        Self::Allocating,
        Self::Downloading,
        Self::MetaDl,
        Self::ForcedMetaDl,
        Self::PausedDl,
        Self::StoppedDl,
        Self::QueuedDl,
        Self::StalledDl,
        Self::CheckingDl,
        Self::ForcedDl,
        Self::CheckingResumeData,
        Self::Moving,
        Self::Unknown,
    ];

    /// Render the state as the client API spells it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::MissingFiles => "missingFiles",
            Self::Uploading => "uploading",
            Self::PausedUp => "pausedUP",
            Self::StoppedUp => "stoppedUP",
            Self::QueuedUp => "queuedUP",
            Self::StalledUp => "stalledUP",
            Self::CheckingUp => "checkingUP",
            Self::ForcedUp => "forcedUP",
            Self::Allocating => "allocating",
            Self::Downloading => "downloading",
            Self::MetaDl => "metaDL",
            Self::ForcedMetaDl => "forcedMetaDL",
            Self::PausedDl => "pausedDL",
            Self::StoppedDl => "stoppedDL",
            Self::QueuedDl => "queuedDL",
            Self::StalledDl => "stalledDL",
            Self::CheckingDl => "checkingDL",
            Self::ForcedDl => "forcedDL",
            Self::CheckingResumeData => "checkingResumeData",
            Self::Moving => "moving",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a client state string, mapping anything unrecognised to [`Self::Unknown`].
    #[must_use]
    pub fn parse_lossy(value: &str) -> Self {
        Self::from_str(value).unwrap_or(Self::Unknown)
    }

    /// Whether the torrent is complete and in one of the seeding-phase states
    /// that take part in classification.
    #[must_use]
    pub const fn is_seeding_phase(self) -> bool {
        matches!(
            self,
            Self::Uploading
                | Self::QueuedUp
                | Self::PausedUp
                | Self::StoppedUp
                | Self::StalledUp
                | Self::ForcedUp
        )
    }
}

impl FromStr for TorrentState {
    type Err = UnknownState;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == value)
            .ok_or_else(|| UnknownState(value.to_string()))
    }
}

impl fmt::Display for TorrentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State string not recognised by [`TorrentState::from_str`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownState(pub String);

impl fmt::Display for UnknownState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown torrent state '{}'", self.0)
    }
}

impl std::error::Error for UnknownState {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_strings_round_trip_through_parser() {
        for state in TorrentState::ALL {
            assert_eq!(TorrentState::parse_lossy(state.as_str()), state);
        }
        assert_eq!(TorrentState::parse_lossy("nonsense"), TorrentState::Unknown);
        assert!(TorrentState::from_str("nonsense").is_err());
    }

    #[test]
    fn seeding_phase_covers_complete_states_only() {
        let seeding: Vec<_> = TorrentState::ALL
            .into_iter()
            .filter(|state| state.is_seeding_phase())
            .collect();
        assert_eq!(
            seeding,
            vec![
                TorrentState::Uploading,
                TorrentState::PausedUp,
                TorrentState::StoppedUp,
                TorrentState::QueuedUp,
                TorrentState::StalledUp,
                TorrentState::ForcedUp,
            ]
        );
        assert!(!TorrentState::StalledDl.is_seeding_phase());
        assert!(!TorrentState::CheckingUp.is_seeding_phase());
    }

    #[test]
    fn tracker_status_maps_codes() {
        assert_eq!(TrackerStatus::from_code(0), TrackerStatus::Disabled);
        assert_eq!(TrackerStatus::from_code(2), TrackerStatus::Working);
        assert_eq!(TrackerStatus::from_code(4), TrackerStatus::NotWorking);
        assert_eq!(TrackerStatus::from_code(9), TrackerStatus::Unknown);
    }

    #[test]
    fn state_serializes_with_client_spelling() -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(&TorrentState::StalledUp)?;
        assert_eq!(json, "\"stalledUP\"");
        let parsed: TorrentState = serde_json::from_str("\"forcedMetaDL\"")?;
        assert_eq!(parsed, TorrentState::ForcedMetaDl);
        Ok(())
    }
}
