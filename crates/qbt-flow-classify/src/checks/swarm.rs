use qbt_flow_torrent_core::{TorrentSnapshot, TrackerStatus};

/// Public trackers come back alongside DHT/PEX/LSD pseudo-trackers; private ones alone.
#[must_use]
pub const fn public_tracker(snapshot: &TorrentSnapshot) -> bool {
    snapshot.trackers_count > 1
}

/// An upload cap is in effect.
#[must_use]
pub const fn upload_limit(snapshot: &TorrentSnapshot) -> bool {
    snapshot.up_limit != 0
}

/// A download cap is in effect.
#[must_use]
pub const fn download_limit(snapshot: &TorrentSnapshot) -> bool {
    snapshot.dl_limit != 0
}

/// Any tracker reports that it is not working.
#[must_use]
pub fn tracker_issue(snapshot: &TorrentSnapshot) -> bool {
    snapshot
        .trackers
        .iter()
        .any(|entry| entry.status == TrackerStatus::NotWorking)
}
