//! Per-torrent and batch classification.
//!
//! # Design
//! - The state filter runs before any checker so torrents outside the seeding
//!   phase never reach the filesystem probe.
//! - Per-torrent failures (invalid payloads, probe errors) are logged and
//!   contained; only an empty qualifying set fails the batch.
//! - The classifier borrows the policy and probe; it holds no mutable state, so
//!   a single instance can be shared by rayon workers.

use qbt_flow_config::Policy;
use qbt_flow_torrent_core::{
    HardLinkProbe, SnapshotError, TorrentSnapshot, TorrentState, validate_snapshot,
};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::checks;
use crate::error::{ClassifyError, ClassifyResult};
use crate::record::{ClassificationRecord, TriState};
use crate::score::score;
use crate::tracker::match_tracker;

/// Outcome of classifying one raw payload.
#[derive(Debug)]
pub enum Classification {
    /// Torrent qualified and was classified.
    Included(Box<ClassificationRecord>),
    /// Torrent is valid but outside the seeding phase.
    Excluded {
        /// Torrent hash.
        hash: String,
        /// Reported state.
        state: TorrentState,
    },
    /// Payload failed validation.
    Invalid {
        /// Validation failure.
        error: SnapshotError,
    },
}

/// Counters describing how a batch was partitioned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    /// Payloads handed to the batch.
    pub received: usize,
    /// Torrents classified.
    pub included: usize,
    /// Payloads rejected by validation.
    pub invalid: usize,
    /// Valid torrents outside the seeding phase.
    pub excluded: usize,
}

/// Records produced by a batch plus its partition counters.
#[derive(Debug, Clone, Default)]
pub struct ClassificationBatch {
    /// Classified torrents.
    pub records: Vec<ClassificationRecord>,
    /// Partition counters.
    pub stats: BatchStats,
}

/// Classifies raw torrent payloads against a policy.
#[derive(Clone, Copy)]
pub struct Classifier<'a> {
    policy: &'a Policy,
    probe: &'a dyn HardLinkProbe,
}

impl<'a> Classifier<'a> {
    /// Create a classifier over `policy`, probing hard links through `probe`.
    #[must_use]
    pub const fn new(policy: &'a Policy, probe: &'a dyn HardLinkProbe) -> Self {
        Self { policy, probe }
    }

    /// Classify one raw payload reported by `client`.
    #[must_use]
    pub fn classify(&self, raw: &Value, client: &str) -> Classification {
        let snapshot = match validate_snapshot(raw, client) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(
                    client,
                    hash = error.hash().unwrap_or("-"),
                    error = %error,
                    "skipping torrent with invalid payload"
                );
                return Classification::Invalid { error };
            }
        };

        if !snapshot.state.is_seeding_phase() {
            debug!(
                client,
                hash = %snapshot.hash,
                state = %snapshot.state,
                "torrent outside seeding phase"
            );
            return Classification::Excluded {
                hash: snapshot.hash,
                state: snapshot.state,
            };
        }

        Classification::Included(Box::new(self.evaluate(snapshot, client)))
    }

    /// Classify a batch sequentially, preserving input order.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::NoQualifyingTorrents`] when `raws` is non-empty
    /// but no torrent qualified.
    pub fn classify_batch(&self, raws: &[Value], client: &str) -> ClassifyResult<ClassificationBatch> {
        let outcomes = raws.iter().map(|raw| self.classify(raw, client));
        collect_batch(raws.len(), outcomes, client)
    }

    /// Classify a batch across the rayon pool. Record order is unspecified.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::classify_batch`].
    pub fn classify_batch_parallel(
        &self,
        raws: &[Value],
        client: &str,
    ) -> ClassifyResult<ClassificationBatch> {
        let outcomes: Vec<Classification> = raws
            .par_iter()
            .map(|raw| self.classify(raw, client))
            .collect();
        collect_batch(raws.len(), outcomes.into_iter(), client)
    }

    fn evaluate(&self, snapshot: TorrentSnapshot, client: &str) -> ClassificationRecord {
        let policy = self.policy;
        let tags = policy.tags();
        let tracker_tag = match_tracker(&snapshot.tracker, policy);
        let score = score(&snapshot, &tracker_tag, policy);

        let hit_and_run = TriState::evaluate_if(tags.hit_and_run.auto_apply, || {
            checks::hit_and_run(&snapshot, &tracker_tag, policy)
        });
        let public = TriState::evaluate_if(tags.public.auto_apply, || {
            checks::public_tracker(&snapshot)
        });
        let upload_limit = TriState::evaluate_if(tags.upload_limit.auto_apply, || {
            checks::upload_limit(&snapshot)
        });
        let download_limit = TriState::evaluate_if(tags.download_limit.auto_apply, || {
            checks::download_limit(&snapshot)
        });
        let tracker_issue = TriState::evaluate_if(tags.tracker_issue.auto_apply, || {
            checks::tracker_issue(&snapshot)
        });
        let cross_seed = policy
            .checks()
            .cross_seed
            .then(|| checks::cross_seed(&snapshot, policy));
        let hard_link = self.probe_hard_links(&snapshot, client);

        debug!(
            client,
            hash = %snapshot.hash,
            tracker = %tracker_tag,
            score,
            "torrent classified"
        );

        ClassificationRecord {
            snapshot,
            tracker_tag,
            score,
            hit_and_run,
            hard_link,
            public,
            upload_limit,
            download_limit,
            tracker_issue,
            cross_seed,
        }
    }

    fn probe_hard_links(&self, snapshot: &TorrentSnapshot, client: &str) -> TriState {
        if !self.policy.checks().hard_links {
            return TriState::NotEvaluated;
        }
        let Some(client_policy) = self.policy.client(client) else {
            debug!(client, "client not configured; hard-link check skipped");
            return TriState::NotEvaluated;
        };

        match checks::hard_link(
            snapshot,
            client_policy,
            self.policy.download_folder(),
            self.probe,
        ) {
            Ok(linked) => linked.into(),
            Err(error) => {
                warn!(
                    client,
                    hash = %snapshot.hash,
                    path = %error.path.display(),
                    error = %error,
                    "hard-link probe failed; leaving field unevaluated"
                );
                TriState::NotEvaluated
            }
        }
    }
}

fn collect_batch(
    received: usize,
    outcomes: impl Iterator<Item = Classification>,
    client: &str,
) -> ClassifyResult<ClassificationBatch> {
    let mut batch = ClassificationBatch {
        records: Vec::with_capacity(received),
        stats: BatchStats {
            received,
            ..BatchStats::default()
        },
    };

    for outcome in outcomes {
        match outcome {
            Classification::Included(record) => {
                batch.stats.included += 1;
                batch.records.push(*record);
            }
            Classification::Excluded { .. } => batch.stats.excluded += 1,
            Classification::Invalid { .. } => batch.stats.invalid += 1,
        }
    }

    let stats = batch.stats;
    info!(
        client,
        received = stats.received,
        included = stats.included,
        excluded = stats.excluded,
        invalid = stats.invalid,
        "classification batch complete"
    );

    if stats.received > 0 && stats.included == 0 {
        return Err(ClassifyError::NoQualifyingTorrents {
            received: stats.received,
            invalid: stats.invalid,
            excluded: stats.excluded,
        });
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CrossSeedStatus, TrackerTag};
    use qbt_flow_test_support::fixtures::{RawTorrent, sample_policy, sample_policy_parts};
    use qbt_flow_test_support::mocks::{FailingProbe, StubProbe};
    use serde_json::json;

    #[test]
    fn seeding_torrent_is_fully_classified() -> anyhow::Result<()> {
        let policy = sample_policy()?;
        let probe = StubProbe::linked(["/downloads/tv/Show"]);
        let classifier = Classifier::new(&policy, &probe);

        let raw = RawTorrent::seeding("aa")
            .tracker("https://alpha.example.org/announce")
            .seeding_time(1_800)
            .content_path("/qBittorrent/tv/Show")
            .trackers_count(1)
            .up_limit(100)
            .build();
        let Classification::Included(record) = classifier.classify(&raw, "local") else {
            anyhow::bail!("expected included torrent");
        };

        assert_eq!(record.tracker_tag, TrackerTag::Configured("Alpha".into()));
        assert_eq!(record.hit_and_run, TriState::True);
        assert_eq!(record.hard_link, TriState::True);
        assert_eq!(record.public, TriState::False);
        assert_eq!(record.upload_limit, TriState::True);
        assert_eq!(record.download_limit, TriState::False);
        assert_eq!(record.tracker_issue, TriState::False);
        assert_eq!(record.cross_seed, Some(CrossSeedStatus::Safe));
        Ok(())
    }

    #[test]
    fn disabled_switches_leave_fields_unevaluated() -> anyhow::Result<()> {
        let mut parts = sample_policy_parts();
        parts.tags.hit_and_run.auto_apply = false;
        parts.tags.public.auto_apply = false;
        parts.checks.hard_links = false;
        parts.checks.cross_seed = false;
        let policy = Policy::new(parts)?;
        let probe = StubProbe::linked(Vec::<&str>::new());
        let classifier = Classifier::new(&policy, &probe);

        let Classification::Included(record) =
            classifier.classify(&RawTorrent::seeding("bb").build(), "local")
        else {
            anyhow::bail!("expected included torrent");
        };
        assert_eq!(record.hit_and_run, TriState::NotEvaluated);
        assert_eq!(record.public, TriState::NotEvaluated);
        assert_eq!(record.hard_link, TriState::NotEvaluated);
        assert_eq!(record.cross_seed, None);
        assert_eq!(probe.calls(), 0);
        Ok(())
    }

    #[test]
    fn unknown_client_skips_hard_link_probe() -> anyhow::Result<()> {
        let policy = sample_policy()?;
        let probe = StubProbe::linked(["/downloads/x"]);
        let classifier = Classifier::new(&policy, &probe);

        let Classification::Included(record) =
            classifier.classify(&RawTorrent::seeding("cc").build(), "seedbox")
        else {
            anyhow::bail!("expected included torrent");
        };
        assert_eq!(record.hard_link, TriState::NotEvaluated);
        assert_eq!(record.snapshot.client, "seedbox");
        assert_eq!(probe.calls(), 0);
        Ok(())
    }

    #[test]
    fn probe_failure_is_contained() -> anyhow::Result<()> {
        let policy = sample_policy()?;
        let probe = FailingProbe;
        let classifier = Classifier::new(&policy, &probe);

        let batch = classifier.classify_batch(
            &[RawTorrent::seeding("dd").build(), RawTorrent::seeding("ee").build()],
            "local",
        )?;
        assert_eq!(batch.records.len(), 2);
        assert!(
            batch
                .records
                .iter()
                .all(|record| record.hard_link == TriState::NotEvaluated)
        );
        Ok(())
    }

    #[test]
    fn excluded_torrents_never_reach_the_probe() -> anyhow::Result<()> {
        let policy = sample_policy()?;
        let probe = StubProbe::linked(["/downloads/x"]);
        let classifier = Classifier::new(&policy, &probe);

        let outcome = classifier.classify(
            &RawTorrent::seeding("ff").state("downloading").build(),
            "local",
        );
        assert!(matches!(
            outcome,
            Classification::Excluded { state: TorrentState::Downloading, .. }
        ));
        assert_eq!(probe.calls(), 0);
        Ok(())
    }

    #[test]
    fn batch_partitions_and_counts() -> anyhow::Result<()> {
        let policy = sample_policy()?;
        let probe = StubProbe::linked(Vec::<&str>::new());
        let classifier = Classifier::new(&policy, &probe);

        let raws = vec![
            RawTorrent::seeding("01").state("uploading").build(),
            RawTorrent::seeding("02").state("stalledUP").build(),
            RawTorrent::seeding("03").state("pausedUP").build(),
            RawTorrent::seeding("04").state("stoppedUP").build(),
            RawTorrent::seeding("05").state("forcedUP").build(),
            RawTorrent::seeding("06").state("queuedUP").build(),
            RawTorrent::seeding("07").state("stalledDL").build(),
            RawTorrent::seeding("08").state("checkingUP").build(),
            json!({ "hash": "09", "name": "broken" }),
            RawTorrent::seeding("10").ratio(-1.0).build(),
        ];
        let batch = classifier.classify_batch(&raws, "local")?;

        assert_eq!(
            batch.stats,
            BatchStats {
                received: 10,
                included: 6,
                invalid: 2,
                excluded: 2,
            }
        );
        let hashes: Vec<_> = batch.records.iter().map(ClassificationRecord::hash).collect();
        assert_eq!(hashes, ["01", "02", "03", "04", "05", "06"]);
        Ok(())
    }

    #[test]
    fn all_downloading_batch_is_an_error() -> anyhow::Result<()> {
        let policy = sample_policy()?;
        let probe = StubProbe::linked(Vec::<&str>::new());
        let classifier = Classifier::new(&policy, &probe);

        let raws: Vec<Value> = (0..3)
            .map(|i| RawTorrent::seeding(&format!("dl{i}")).state("downloading").build())
            .collect();
        let err = classifier.classify_batch(&raws, "local").unwrap_err();
        assert_eq!(
            err,
            ClassifyError::NoQualifyingTorrents {
                received: 3,
                invalid: 0,
                excluded: 3,
            }
        );
        Ok(())
    }

    #[test]
    fn empty_batch_is_not_an_error() -> anyhow::Result<()> {
        let policy = sample_policy()?;
        let probe = StubProbe::linked(Vec::<&str>::new());
        let batch = Classifier::new(&policy, &probe).classify_batch(&[], "local")?;
        assert!(batch.records.is_empty());
        assert_eq!(batch.stats, BatchStats::default());
        Ok(())
    }

    #[test]
    fn parallel_batch_matches_sequential_set() -> anyhow::Result<()> {
        let policy = sample_policy()?;
        let probe = StubProbe::linked(["/downloads/item-3", "/downloads/item-7"]);
        let classifier = Classifier::new(&policy, &probe);

        let raws: Vec<Value> = (0..32)
            .map(|i| {
                RawTorrent::seeding(&format!("h{i:02}"))
                    .content_path(&format!("/qBittorrent/item-{i}"))
                    .state(if i % 4 == 0 { "downloading" } else { "uploading" })
                    .build()
            })
            .collect();

        let sequential = classifier.classify_batch(&raws, "local")?;
        let mut parallel = classifier.classify_batch_parallel(&raws, "local")?;
        parallel
            .records
            .sort_by(|a, b| a.hash().cmp(b.hash()));

        assert_eq!(parallel.stats, sequential.stats);
        assert_eq!(parallel.records, sequential.records);
        Ok(())
    }
}
