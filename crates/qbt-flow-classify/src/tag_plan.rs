//! Minimal tag additions and removals for a set of classified torrents.
//!
//! # Design
//! - Checks run in a fixed order: tracker issue, public, hit-and-run,
//!   no-hard-link, upload limit, download limit. Tracker tags come last.
//! - A field that was not evaluated never produces a removal; tags set by
//!   other tooling stay untouched.
//! - Maps are keyed by tag in sorted order and hash lists keep record order,
//!   so the same records always yield the same plan.

use std::collections::BTreeMap;

use qbt_flow_config::{Policy, TagRule};
use serde::Serialize;

use crate::record::{ClassificationRecord, TriState};

/// Tag name to the hashes it applies to.
pub type TagHashes = BTreeMap<String, Vec<String>>;

/// Additions and removals needed to bring client tags in line with a classification.
///
/// An empty side is `None`, meaning no client call is needed for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagPlan {
    /// Tags to add.
    pub add: Option<TagHashes>,
    /// Tags to remove.
    pub remove: Option<TagHashes>,
}

impl TagPlan {
    /// Whether the plan has nothing to do.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.add.is_none() && self.remove.is_none()
    }

    /// Number of (tag, hash) additions.
    #[must_use]
    pub fn additions(&self) -> usize {
        count(self.add.as_ref())
    }

    /// Number of (tag, hash) removals.
    #[must_use]
    pub fn removals(&self) -> usize {
        count(self.remove.as_ref())
    }
}

fn count(side: Option<&TagHashes>) -> usize {
    side.map_or(0, |map| map.values().map(Vec::len).sum())
}

#[derive(Default)]
struct PlanBuilder {
    add: TagHashes,
    remove: TagHashes,
}

impl PlanBuilder {
    fn schedule(map: &mut TagHashes, tag: &str, hash: &str) {
        let hashes = map.entry(tag.to_string()).or_default();
        if !hashes.iter().any(|existing| existing == hash) {
            hashes.push(hash.to_string());
        }
    }

    fn apply_rule(&mut self, record: &ClassificationRecord, rule: &TagRule, condition: TriState) {
        if !rule.auto_apply {
            return;
        }
        let present = record.snapshot.has_tag(&rule.name);
        match condition {
            TriState::True if !present => Self::schedule(&mut self.add, &rule.name, record.hash()),
            TriState::False if present => {
                Self::schedule(&mut self.remove, &rule.name, record.hash());
            }
            _ => {}
        }
    }

    fn apply_tracker(&mut self, record: &ClassificationRecord, unknown: &str) {
        let resolved = record.tracker_tag.as_str();
        if !record.snapshot.has_tag(resolved) {
            Self::schedule(&mut self.add, resolved, record.hash());
        }
        if resolved != unknown && record.snapshot.has_tag(unknown) {
            Self::schedule(&mut self.remove, unknown, record.hash());
        }
    }

    fn finish(self) -> TagPlan {
        TagPlan {
            add: (!self.add.is_empty()).then_some(self.add),
            remove: (!self.remove.is_empty()).then_some(self.remove),
        }
    }
}

/// Compute the tag plan for `records`.
#[must_use]
pub fn compute_tag_plan(records: &[ClassificationRecord], policy: &Policy) -> TagPlan {
    let tags = policy.tags();
    let mut builder = PlanBuilder::default();

    for record in records {
        let checklist = [
            (&tags.tracker_issue, record.tracker_issue),
            (&tags.public, record.public),
            (&tags.hit_and_run, record.hit_and_run),
            (&tags.no_hard_link, record.hard_link.negate()),
            (&tags.upload_limit, record.upload_limit),
            (&tags.download_limit, record.download_limit),
        ];
        for (rule, condition) in checklist {
            builder.apply_rule(record, rule, condition);
        }

        if tags.auto_tag_trackers {
            builder.apply_tracker(record, &tags.unknown_tracker);
        }
    }

    builder.finish()
}
