//! Tracker URL to tag resolution.

use qbt_flow_config::Policy;
use tracing::debug;

use crate::record::TrackerTag;

/// Resolve the tag for `url`.
///
/// Walks the tracker table in configured order and returns the first entry
/// with a keyword contained in `url`. Falls back to the unknown-tracker tag.
#[must_use]
pub fn match_tracker(url: &str, policy: &Policy) -> TrackerTag {
    let matched = policy.trackers().iter().find(|tracker| {
        tracker
            .keywords
            .iter()
            .any(|keyword| url.contains(keyword.as_str()))
    });

    let tag = matched.map_or_else(
        || TrackerTag::Unknown(policy.tags().unknown_tracker.clone()),
        |tracker| TrackerTag::Configured(tracker.tag.clone()),
    );
    debug!(url, tag = %tag, "tracker resolved");
    tag
}
