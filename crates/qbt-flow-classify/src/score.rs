//! Retention score.

use qbt_flow_config::Policy;
use qbt_flow_torrent_core::TorrentSnapshot;

use crate::record::TrackerTag;

const BASE_SCORE: f64 = 10.0;

/// Retention score for a torrent, rounded to two decimals (ties to even).
///
/// `10 + ratio * coef_seed_ratio + seeders * coef_nums_seeder
///  + days_seeded * coef_day_seed_time + extra_score(tag)`
#[must_use]
pub fn score(snapshot: &TorrentSnapshot, tag: &TrackerTag, policy: &Policy) -> f64 {
    let scoring = policy.scoring();
    let raw = BASE_SCORE
        + snapshot.ratio * scoring.coef_seed_ratio
        + seeders(snapshot) * scoring.coef_nums_seeder
        + snapshot.seeding_days() * scoring.coef_day_seed_time
        + policy.extra_score(tag.as_str());
    round_cents(raw)
}

#[expect(
    clippy::cast_precision_loss,
    reason = "swarm sizes are far below f64 integer precision"
)]
const fn seeders(snapshot: &TorrentSnapshot) -> f64 {
    snapshot.num_seeders as f64
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
