use qbt_flow_config::Policy;
use qbt_flow_torrent_core::TorrentSnapshot;

use crate::record::CrossSeedStatus;

/// Flag cross-seed tagged torrents that have not downloaded anything yet.
#[must_use]
pub fn cross_seed(snapshot: &TorrentSnapshot, policy: &Policy) -> CrossSeedStatus {
    if snapshot.downloaded == 0 && snapshot.has_tag(&policy.tags().cross_seed) {
        CrossSeedStatus::NeedsRemediation {
            content_path: snapshot.content_path.clone(),
            hash: snapshot.hash.clone(),
        }
    } else {
        CrossSeedStatus::Safe
    }
}
