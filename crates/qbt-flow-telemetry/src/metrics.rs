//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Counters cover one classification run: torrents seen, skipped, classified, tag operations.

use std::sync::Arc;

use prometheus::core::Collector;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Prometheus-backed metrics registry for classification runs.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    torrents_seen_total: IntCounter,
    torrents_classified_total: IntCounterVec,
    torrents_skipped_total: IntCounterVec,
    tag_operations_total: IntCounterVec,
    classify_batch_failures_total: IntCounter,
}

/// Point-in-time view of the run counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Raw torrent records received from clients.
    pub torrents_seen_total: u64,
    /// Records that were classified, across all clients.
    pub torrents_classified_total: u64,
    /// Records dropped as invalid.
    pub torrents_invalid_total: u64,
    /// Records excluded by the seeding-state filter.
    pub torrents_excluded_total: u64,
    /// Tag additions planned.
    pub tag_additions_total: u64,
    /// Tag removals planned.
    pub tag_removals_total: u64,
    /// Batches that produced no usable data.
    pub classify_batch_failures_total: u64,
}

/// Why a torrent record was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The record failed validation.
    Invalid,
    /// The record is not in a seeding-phase state.
    Excluded,
}

impl SkipReason {
    const fn label(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Excluded => "excluded",
        }
    }
}

/// Direction of a planned tag operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOperation {
    /// A tag will be attached.
    Add,
    /// A tag will be detached.
    Remove,
}

impl TagOperation {
    const fn label(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let torrents_seen_total = IntCounter::with_opts(Opts::new(
            "torrents_seen_total",
            "Raw torrent records received from clients",
        ))
        .map_err(|source| collector("torrents_seen_total", source))?;
        let torrents_classified_total = IntCounterVec::new(
            Opts::new(
                "torrents_classified_total",
                "Torrent records classified by client",
            ),
            &["client"],
        )
        .map_err(|source| collector("torrents_classified_total", source))?;
        let torrents_skipped_total = IntCounterVec::new(
            Opts::new("torrents_skipped_total", "Torrent records skipped by reason"),
            &["reason"],
        )
        .map_err(|source| collector("torrents_skipped_total", source))?;
        let tag_operations_total = IntCounterVec::new(
            Opts::new("tag_operations_total", "Planned tag operations by direction"),
            &["op"],
        )
        .map_err(|source| collector("tag_operations_total", source))?;
        let classify_batch_failures_total = IntCounter::with_opts(Opts::new(
            "classify_batch_failures_total",
            "Batches that produced no qualifying torrents",
        ))
        .map_err(|source| collector("classify_batch_failures_total", source))?;

        register(&registry, "torrents_seen_total", &torrents_seen_total)?;
        register(
            &registry,
            "torrents_classified_total",
            &torrents_classified_total,
        )?;
        register(&registry, "torrents_skipped_total", &torrents_skipped_total)?;
        register(&registry, "tag_operations_total", &tag_operations_total)?;
        register(
            &registry,
            "classify_batch_failures_total",
            &classify_batch_failures_total,
        )?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                torrents_seen_total,
                torrents_classified_total,
                torrents_skipped_total,
                tag_operations_total,
                classify_batch_failures_total,
            }),
        })
    }

    /// Count raw records received from a client.
    pub fn add_seen(&self, count: u64) {
        self.inner.torrents_seen_total.inc_by(count);
    }

    /// Count records classified for `client`.
    pub fn add_classified(&self, client: &str, count: u64) {
        self.inner
            .torrents_classified_total
            .with_label_values(&[client])
            .inc_by(count);
    }

    /// Count skipped records.
    pub fn add_skipped(&self, reason: SkipReason, count: u64) {
        self.inner
            .torrents_skipped_total
            .with_label_values(&[reason.label()])
            .inc_by(count);
    }

    /// Count planned tag operations; each (tag, hash) pair is one operation.
    pub fn add_tag_operations(&self, op: TagOperation, count: u64) {
        self.inner
            .tag_operations_total
            .with_label_values(&[op.label()])
            .inc_by(count);
    }

    /// Increment the counter of batches without qualifying torrents.
    pub fn inc_batch_failure(&self) {
        self.inner.classify_batch_failures_total.inc();
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Render`] if the registry cannot be encoded.
    pub fn render(&self) -> Result<String> {
        TextEncoder::new()
            .encode_to_string(&self.inner.registry.gather())
            .map_err(|source| TelemetryError::Render { source })
    }

    /// Take a point-in-time snapshot of the counters, summed across labels.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let skipped = |reason: SkipReason| {
            self.inner
                .torrents_skipped_total
                .with_label_values(&[reason.label()])
                .get()
        };
        let tagged = |op: TagOperation| {
            self.inner
                .tag_operations_total
                .with_label_values(&[op.label()])
                .get()
        };
        MetricsSnapshot {
            torrents_seen_total: self.inner.torrents_seen_total.get(),
            torrents_classified_total: label_sum(&self.inner.torrents_classified_total),
            torrents_invalid_total: skipped(SkipReason::Invalid),
            torrents_excluded_total: skipped(SkipReason::Excluded),
            tag_additions_total: tagged(TagOperation::Add),
            tag_removals_total: tagged(TagOperation::Remove),
            classify_batch_failures_total: self.inner.classify_batch_failures_total.get(),
        }
    }
}

/// Total of every label combination of `counters`.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "integer counters export whole, non-negative values"
)]
fn label_sum(counters: &IntCounterVec) -> u64 {
    let total: f64 = counters
        .collect()
        .iter()
        .flat_map(|family| family.get_metric())
        .map(|metric| metric.get_counter().value())
        .sum();
    total as u64
}

const fn collector(name: &'static str, source: prometheus::Error) -> TelemetryError {
    TelemetryError::Metric { name, source }
}

fn register<C>(registry: &Registry, name: &'static str, counter: &C) -> Result<()>
where
    C: Collector + Clone + 'static,
{
    registry
        .register(Box::new(counter.clone()))
        .map_err(|source| collector(name, source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_sums_labelled_counters() -> Result<()> {
        let metrics = Metrics::new()?;
        metrics.add_seen(5);
        metrics.add_classified("local", 2);
        metrics.add_classified("remote", 1);
        metrics.add_skipped(SkipReason::Excluded, 1);
        metrics.add_skipped(SkipReason::Invalid, 1);
        metrics.add_tag_operations(TagOperation::Add, 4);
        metrics.add_tag_operations(TagOperation::Remove, 2);
        metrics.inc_batch_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(
            snapshot,
            MetricsSnapshot {
                torrents_seen_total: 5,
                torrents_classified_total: 3,
                torrents_invalid_total: 1,
                torrents_excluded_total: 1,
                tag_additions_total: 4,
                tag_removals_total: 2,
                classify_batch_failures_total: 1,
            }
        );
        Ok(())
    }

    #[test]
    fn classified_total_covers_every_client_label() -> Result<()> {
        let metrics = Metrics::new()?;
        assert_eq!(metrics.snapshot().torrents_classified_total, 0);
        for (client, count) in [("local", 4), ("seedbox", 2), ("local", 1), ("backup", 0)] {
            metrics.add_classified(client, count);
        }
        assert_eq!(metrics.snapshot().torrents_classified_total, 7);

        let rendered = metrics.render()?;
        assert!(rendered.contains("torrents_classified_total{client=\"seedbox\"} 2"));
        assert!(rendered.contains("torrents_classified_total{client=\"local\"} 5"));
        Ok(())
    }

    #[test]
    fn duplicate_registration_is_reported() -> Result<()> {
        let registry = Registry::new();
        let counter = IntCounter::new("torrents_seen_total", "seen")
            .map_err(|source| collector("torrents_seen_total", source))?;
        register(&registry, "torrents_seen_total", &counter)?;
        let err = register(&registry, "torrents_seen_total", &counter).unwrap_err();
        assert!(matches!(
            err,
            TelemetryError::Metric {
                name: "torrents_seen_total",
                ..
            }
        ));
        Ok(())
    }

    #[test]
    fn render_uses_text_exposition() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let metrics = Metrics::new()?;
        metrics.add_classified("local", 3);
        let rendered = metrics.render()?;
        assert!(rendered.contains("torrents_classified_total{client=\"local\"} 3"));

        let json = serde_json::to_value(metrics.snapshot())?;
        assert_eq!(json["torrents_classified_total"], 3);
        Ok(())
    }
}
