//! Classification output types.

use std::fmt;
use std::path::PathBuf;

use qbt_flow_torrent_core::TorrentSnapshot;
use serde::Serialize;

/// Outcome of a check that may be switched off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    /// The check was disabled or could not run.
    #[default]
    NotEvaluated,
    /// The condition holds.
    True,
    /// The condition does not hold.
    False,
}

impl TriState {
    /// Logical negation; `NotEvaluated` stays `NotEvaluated`.
    #[must_use]
    pub const fn negate(self) -> Self {
        match self {
            Self::NotEvaluated => Self::NotEvaluated,
            Self::True => Self::False,
            Self::False => Self::True,
        }
    }

    /// Evaluated value, if any.
    #[must_use]
    pub const fn as_bool(self) -> Option<bool> {
        match self {
            Self::NotEvaluated => None,
            Self::True => Some(true),
            Self::False => Some(false),
        }
    }

    /// Evaluate `check` when `enabled`, otherwise leave the field unevaluated.
    pub fn evaluate_if(enabled: bool, check: impl FnOnce() -> bool) -> Self {
        if enabled { check().into() } else { Self::NotEvaluated }
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

/// Cross-seed verdict for a torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CrossSeedStatus {
    /// Not a cross-seed, or already downloaded data of its own.
    Safe,
    /// Cross-seed tagged with nothing downloaded; an external tool should remediate it.
    NeedsRemediation {
        /// Content path reported by the client.
        content_path: PathBuf,
        /// Torrent hash.
        hash: String,
    },
}

/// Tag resolved from a torrent's tracker URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "tag", rename_all = "snake_case")]
pub enum TrackerTag {
    /// Tag of a configured tracker.
    Configured(String),
    /// Sentinel used when no keyword matched.
    Unknown(String),
}

impl TrackerTag {
    /// Tag name as applied on the client.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Configured(tag) | Self::Unknown(tag) => tag,
        }
    }

    /// Whether the tag names a configured tracker.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        matches!(self, Self::Configured(_))
    }
}

impl fmt::Display for TrackerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-torrent classification result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationRecord {
    /// Snapshot the record was derived from.
    pub snapshot: TorrentSnapshot,
    /// Resolved tracker tag.
    pub tracker_tag: TrackerTag,
    /// Retention score.
    pub score: f64,
    /// Still at hit-and-run risk.
    pub hit_and_run: TriState,
    /// Payload shares data with another path.
    pub hard_link: TriState,
    /// Served by a public tracker.
    pub public: TriState,
    /// An upload cap is in effect.
    pub upload_limit: TriState,
    /// A download cap is in effect.
    pub download_limit: TriState,
    /// A tracker reports it is not working.
    pub tracker_issue: TriState,
    /// Cross-seed verdict; `None` when the check did not run.
    pub cross_seed: Option<CrossSeedStatus>,
}

impl ClassificationRecord {
    /// Hash of the underlying torrent.
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.snapshot.hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negation_preserves_not_evaluated() {
        assert_eq!(TriState::True.negate(), TriState::False);
        assert_eq!(TriState::False.negate(), TriState::True);
        assert_eq!(TriState::NotEvaluated.negate(), TriState::NotEvaluated);
    }

    #[test]
    fn evaluate_if_skips_disabled_checks() {
        let mut called = false;
        let state = TriState::evaluate_if(false, || {
            called = true;
            true
        });
        assert_eq!(state, TriState::NotEvaluated);
        assert!(!called);
        assert_eq!(TriState::evaluate_if(true, || false), TriState::False);
    }

    #[test]
    fn tracker_tag_exposes_name() {
        assert_eq!(TrackerTag::Configured("Alpha".into()).as_str(), "Alpha");
        assert_eq!(TrackerTag::Unknown("Other".into()).to_string(), "Other");
        assert!(!TrackerTag::Unknown("Other".into()).is_configured());
    }
}
