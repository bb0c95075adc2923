//! Live aggregate state: category tallies, the metric window, and the
//! alert evaluator that watches it.
//!
//! ## Sharing
//!
//! ```text
//!  ingestion loop                      render loop
//!       │                                   │
//!       ▼                                   ▼
//!  SharedAggregator ──▶ RwLock<Aggregator> ◀── SnapshotReader
//!   (sole writer)                         (read-only, clones)
//! ```
//!
//! Every per-event update runs under one write lock and every snapshot is
//! copied under one read lock, so a snapshot always reflects a whole
//! number of events.

mod snapshot;
mod tally;
mod window;

pub use snapshot::Snapshot;
pub use tally::{CategoryTally, Increment};
pub use window::{MetricSample, MetricWindow};

use std::num::NonZeroUsize;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::time::Instant;

use crate::alert::{AlertEvaluator, AlertRule, AlertState, AlertTransition};
use crate::event::Event;

/// Tallies, metric window, and alert evaluation for one session.
#[derive(Debug, Clone)]
pub struct Aggregator {
    tallies: CategoryTally,
    window: MetricWindow,
    evaluator: AlertEvaluator,
    decode_failures: u64,
    started_at: Instant,
}

impl Aggregator {
    pub fn new(capacity: NonZeroUsize, rule: AlertRule) -> Self {
        let now = Instant::now();
        Self {
            tallies: CategoryTally::new(),
            window: MetricWindow::new(capacity),
            evaluator: AlertEvaluator::starting_at(rule, now),
            decode_failures: 0,
            started_at: now,
        }
    }

    /// Fold one event into the aggregates.
    ///
    /// The alert rule is evaluated once for every event that carries a
    /// metric, so a crossing is never missed between render ticks.
    ///
    /// The decoder never yields an empty category, but events built by hand
    /// may; those are counted under the empty label like any other.
    pub fn ingest(&mut self, event: Event) -> Option<AlertTransition> {
        self.tallies.increment(event.category());

        let value = event.metric()?;
        self.window.push(MetricSample {
            value,
            at: event.timestamp(),
        });
        self.evaluator.evaluate_at(&self.window, event.timestamp())
    }

    /// Count a payload that failed to decode.
    pub fn record_decode_failure(&mut self) {
        self.decode_failures += 1;
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tallies: self.tallies.clone(),
            window: self.window.clone(),
            alert: self.evaluator.state(),
            rule: self.evaluator.rule(),
            decode_failures: self.decode_failures,
            started_at: self.started_at,
            taken_at: Instant::now(),
        }
    }

    /// Clear everything for a fresh session.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.tallies.clear();
        self.window.clear();
        self.evaluator.reset(now);
        self.decode_failures = 0;
        self.started_at = now;
    }

    pub fn tallies(&self) -> &CategoryTally {
        &self.tallies
    }

    pub fn window(&self) -> &MetricWindow {
        &self.window
    }

    pub fn alert(&self) -> AlertState {
        self.evaluator.state()
    }

    pub fn decode_failures(&self) -> u64 {
        self.decode_failures
    }
}

/// Write access to an aggregator shared with the render path.
///
/// Deliberately not `Clone`: the ingestion loop holding this handle is the
/// only writer.
#[derive(Debug)]
pub struct SharedAggregator {
    inner: Arc<RwLock<Aggregator>>,
}

impl SharedAggregator {
    pub fn new(aggregator: Aggregator) -> Self {
        Self {
            inner: Arc::new(RwLock::new(aggregator)),
        }
    }

    pub fn ingest(&self, event: Event) -> Option<AlertTransition> {
        self.inner.write().ingest(event)
    }

    pub fn record_decode_failure(&self) {
        self.inner.write().record_decode_failure();
    }

    pub fn reset(&self) {
        self.inner.write().reset();
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.read().snapshot()
    }

    /// A read-only handle for the render path.
    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Read-only access: the only thing the render path can do is copy.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    inner: Arc<RwLock<Aggregator>>,
}

impl SnapshotReader {
    pub fn snapshot(&self) -> Snapshot {
        self.inner.read().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregator(capacity: usize) -> Aggregator {
        Aggregator::new(
            NonZeroUsize::new(capacity).unwrap(),
            AlertRule::new(80.0, 50.0).unwrap(),
        )
    }

    #[test]
    fn test_conservation() {
        let mut agg = aggregator(4);
        let labels = ["a", "b", "a", "c", "a", "b", "d"];
        for (i, label) in labels.iter().enumerate() {
            let metric = (i % 2 == 0).then_some(i as f64);
            agg.ingest(Event::new(*label, metric));
        }
        let sum: u64 = agg.tallies().iter().map(|(_, c)| *c).sum();
        assert_eq!(sum, labels.len() as u64);
        assert_eq!(agg.tallies().get("a"), 3);
        assert_eq!(agg.window().len(), 4);
    }

    #[test]
    fn test_hand_built_empty_category_is_counted() {
        let mut agg = aggregator(4);
        agg.ingest(Event::new("", Some(1.0)));
        agg.ingest(Event::new("a", None));

        assert_eq!(agg.tallies().get(""), 1);
        assert_eq!(agg.snapshot().events_ingested(), 2);
    }

    #[test]
    fn test_decode_failures_do_not_count_as_events() {
        let mut agg = aggregator(4);
        agg.ingest(Event::new("a", None));
        agg.record_decode_failure();
        agg.ingest(Event::new("b", None));

        let snapshot = agg.snapshot();
        assert_eq!(snapshot.events_ingested(), 2);
        assert_eq!(snapshot.decode_failures, 1);
    }

    #[test]
    fn test_window_bound_and_eviction() {
        let capacity = 3;
        let mut agg = aggregator(capacity);
        for v in 1..=(capacity + 1) {
            agg.ingest(Event::new("m", Some(v as f64)));
            assert!(agg.window().len() <= capacity);
        }
        let values: Vec<f64> = agg.window().values().collect();
        assert!(!values.contains(&1.0));
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_snapshot_isolation() {
        let mut agg = aggregator(2);
        agg.ingest(Event::new("a", Some(10.0)));
        let before = agg.snapshot();
        let frozen = before.clone();

        agg.ingest(Event::new("a", Some(20.0)));
        agg.ingest(Event::new("b", Some(30.0)));
        agg.ingest(Event::new("c", Some(95.0)));

        assert_eq!(before, frozen);
        assert_eq!(before.tallies.get("a"), 1);
        assert_eq!(before.tallies.get("b"), 0);
        assert_eq!(before.window.values().collect::<Vec<_>>(), vec![10.0]);
        assert!(!before.alert.active);
    }

    #[test]
    fn test_ingest_reports_alert_transition() {
        let mut agg = aggregator(1);
        assert!(agg.ingest(Event::new("m", Some(60.0))).is_none());
        assert_eq!(
            agg.ingest(Event::new("m", Some(85.0))),
            Some(AlertTransition::Raised { mean: 85.0 })
        );
        // Category-only events do not re-evaluate.
        assert!(agg.ingest(Event::new("x", None)).is_none());
        assert!(agg.alert().active);
    }

    #[test]
    fn test_reset() {
        let mut agg = aggregator(2);
        agg.ingest(Event::new("a", Some(99.0)));
        agg.record_decode_failure();
        agg.reset();
        assert!(agg.tallies().is_empty());
        assert!(agg.window().is_empty());
        assert!(!agg.alert().active);
        assert_eq!(agg.decode_failures(), 0);
    }

    #[test]
    fn test_reader_sees_writes_but_snapshots_do_not() {
        let shared = SharedAggregator::new(aggregator(8));
        let reader = shared.reader();

        shared.ingest(Event::new("a", None));
        let first = reader.snapshot();
        shared.ingest(Event::new("a", None));

        assert_eq!(first.events_ingested(), 1);
        assert_eq!(reader.snapshot().events_ingested(), 2);
    }
}
