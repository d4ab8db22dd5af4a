use anyhow::{Result, bail};
use qbt_flow_classify::{
    Classification, ClassifyError, Classifier, CrossSeedStatus, TrackerTag, TriState,
    compute_tag_plan,
};
use qbt_flow_test_support::fixtures::{RawTorrent, sample_policy};
use qbt_flow_test_support::mocks::StubProbe;
use serde_json::Value;

fn included(classification: Classification) -> Result<qbt_flow_classify::ClassificationRecord> {
    match classification {
        Classification::Included(record) => Ok(*record),
        other => bail!("expected included torrent, got {other:?}"),
    }
}

#[test]
fn undownloaded_cross_seed_is_flagged_for_remediation() -> Result<()> {
    let policy = sample_policy()?;
    let probe = StubProbe::default();
    let classifier = Classifier::new(&policy, &probe);

    let raw = RawTorrent::seeding("x1")
        .downloaded(0)
        .tags(&["cross-seed"])
        .content_path("/qBittorrent/movies/Film.2024")
        .build();
    let record = included(classifier.classify(&raw, "local"))?;

    match record.cross_seed {
        Some(CrossSeedStatus::NeedsRemediation { content_path, hash }) => {
            assert_eq!(content_path.to_str(), Some("/qBittorrent/movies/Film.2024"));
            assert_eq!(hash, "x1");
        }
        other => bail!("expected remediation, got {other:?}"),
    }
    Ok(())
}

#[test]
fn downloaded_cross_seed_is_safe() -> Result<()> {
    let policy = sample_policy()?;
    let probe = StubProbe::default();
    let classifier = Classifier::new(&policy, &probe);

    let raw = RawTorrent::seeding("x2")
        .downloaded(500)
        .tags(&["cross-seed"])
        .build();
    let record = included(classifier.classify(&raw, "local"))?;
    assert_eq!(record.cross_seed, Some(CrossSeedStatus::Safe));
    Ok(())
}

#[test]
fn hit_and_run_follows_minimum_seed_time() -> Result<()> {
    let policy = sample_policy()?;
    let probe = StubProbe::default();
    let classifier = Classifier::new(&policy, &probe);

    let young = RawTorrent::seeding("h1")
        .tracker("https://alpha.example.org/announce/key")
        .seeding_time(1_800)
        .build();
    let mature = RawTorrent::seeding("h2")
        .tracker("https://alpha.example.org/announce/key")
        .seeding_time(7_200)
        .build();

    assert_eq!(included(classifier.classify(&young, "local"))?.hit_and_run, TriState::True);
    assert_eq!(included(classifier.classify(&mature, "local"))?.hit_and_run, TriState::False);
    Ok(())
}

#[test]
fn unknown_tag_is_swapped_for_resolved_tracker() -> Result<()> {
    let policy = sample_policy()?;
    let probe = StubProbe::default();
    let classifier = Classifier::new(&policy, &probe);

    let raws = vec![
        RawTorrent::seeding("t1")
            .tracker("https://tracker.example.com/a/announce")
            .tags(&["Other"])
            .build(),
    ];
    let batch = classifier.classify_batch(&raws, "local")?;
    assert_eq!(
        batch.records[0].tracker_tag,
        TrackerTag::Configured("ExampleTracker".into())
    );

    let plan = compute_tag_plan(&batch.records, &policy);
    let add = plan.add.unwrap_or_default();
    let remove = plan.remove.unwrap_or_default();
    assert_eq!(add.get("ExampleTracker"), Some(&vec!["t1".to_string()]));
    assert_eq!(remove.get("Other"), Some(&vec!["t1".to_string()]));
    Ok(())
}

#[test]
fn batch_of_downloading_torrents_has_no_usable_data() -> Result<()> {
    let policy = sample_policy()?;
    let probe = StubProbe::default();
    let classifier = Classifier::new(&policy, &probe);

    let raws: Vec<Value> = ["d1", "d2", "d3"]
        .into_iter()
        .map(|hash| RawTorrent::seeding(hash).state("downloading").build())
        .collect();

    match classifier.classify_batch(&raws, "local") {
        Err(ClassifyError::NoQualifyingTorrents { received, excluded, .. }) => {
            assert_eq!(received, 3);
            assert_eq!(excluded, 3);
        }
        other => bail!("expected no-qualifying error, got {other:?}"),
    }
    assert!(classifier.classify_batch(&[], "local")?.records.is_empty());
    Ok(())
}

#[test]
fn classify_then_plan_is_idempotent() -> Result<()> {
    let policy = sample_policy()?;
    let probe = StubProbe::linked(["/downloads/p2"]);
    let classifier = Classifier::new(&policy, &probe);

    let raws = vec![
        RawTorrent::seeding("p1")
            .tracker("https://alpha.example.org/announce")
            .seeding_time(60)
            .trackers_count(3)
            .up_limit(512)
            .tags(&["Other", "noHL"])
            .build(),
        RawTorrent::seeding("p2")
            .tracker("https://tracker.example.com/announce")
            .tracker_status("https://tracker.example.com/announce", 4)
            .tags(&["ExampleTracker", "noHL"])
            .build(),
    ];
    let batch = classifier.classify_batch(&raws, "local")?;
    let plan = compute_tag_plan(&batch.records, &policy);
    assert_eq!(plan, compute_tag_plan(&batch.records, &policy));

    let add = plan.add.clone().unwrap_or_default();
    let remove = plan.remove.clone().unwrap_or_default();
    assert_eq!(add.get("Alpha"), Some(&vec!["p1".to_string()]));
    assert_eq!(add.get("Public"), Some(&vec!["p1".to_string()]));
    assert_eq!(add.get("H&R"), Some(&vec!["p1".to_string()]));
    assert_eq!(add.get("UpLimit"), Some(&vec!["p1".to_string()]));
    assert_eq!(add.get("TrackerIssue"), Some(&vec!["p2".to_string()]));
    assert_eq!(remove.get("Other"), Some(&vec!["p1".to_string()]));
    assert_eq!(remove.get("noHL"), Some(&vec!["p2".to_string()]));
    assert!(!add.contains_key("noHL"));
    Ok(())
}
