use qbt_flow_config::Policy;
use qbt_flow_torrent_core::TorrentSnapshot;

use crate::record::TrackerTag;

/// Whether the torrent is still at hit-and-run risk on its tracker.
///
/// The seed-time threshold is checked before the ratio threshold; either one
/// triggering is enough. Unknown trackers carry no rule and never trigger.
#[must_use]
pub fn hit_and_run(snapshot: &TorrentSnapshot, tag: &TrackerTag, policy: &Policy) -> bool {
    let TrackerTag::Configured(name) = tag else {
        return false;
    };
    let Some(rule) = policy.tracker(name).map(|tracker| &tracker.hit_and_run) else {
        return false;
    };
    if rule.ignore {
        return false;
    }

    if rule
        .min_seed_time
        .is_some_and(|min| snapshot.seeding_time <= min)
    {
        return true;
    }
    rule.min_ratio.is_some_and(|min| snapshot.ratio >= min)
}
