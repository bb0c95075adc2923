//! Point-in-time copies of aggregate state for the render path.

use tokio::time::Instant;

use super::{CategoryTally, MetricWindow};
use crate::alert::{AlertRule, AlertState};

/// An owned copy of the aggregate state at `taken_at`.
///
/// Snapshots share nothing with the live aggregator, so later ingestion is
/// never visible through one.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub tallies: CategoryTally,
    pub window: MetricWindow,
    pub alert: AlertState,
    pub rule: AlertRule,
    pub decode_failures: u64,
    pub started_at: Instant,
    pub taken_at: Instant,
}

impl Snapshot {
    /// Events successfully ingested since session start.
    pub fn events_ingested(&self) -> u64 {
        self.tallies.total()
    }

    /// Seconds between session start and `at`, for time axes.
    pub fn seconds_since_start(&self, at: Instant) -> f64 {
        at.saturating_duration_since(self.started_at).as_secs_f64()
    }
}
