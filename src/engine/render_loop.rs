//! The render loop: periodic, read-only, never blocks ingestion for longer
//! than one snapshot copy.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::StopReason;
use crate::aggregate::SnapshotReader;
use crate::duration::format_duration;
use crate::render::{represent, ChartKind, RenderSurface, Renderable};

/// Counters kept by the render loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames the surface accepted, including the final one.
    pub ticks: u64,
    /// Frames the surface rejected.
    pub failed: u64,
    /// Ticks that took longer than the render period.
    pub overruns: u64,
}

pub(super) async fn run(
    mut surface: Box<dyn RenderSurface>,
    reader: SnapshotReader,
    chart: ChartKind,
    period: Duration,
    mut stop_rx: watch::Receiver<Option<StopReason>>,
) -> RenderStats {
    let mut stats = RenderStats::default();
    let mut ticker = time::interval(period);
    // A slow tick pushes the schedule back instead of bursting to catch up.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let stopped = stop_rx.borrow_and_update().clone();
        if let Some(reason) = stopped {
            let frame = represent(&reader.snapshot(), chart).ended(reason.to_string());
            draw(surface.as_mut(), &frame, &mut stats);
            break;
        }

        tokio::select! {
            biased;
            changed = stop_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        let started = Instant::now();
        let frame = represent(&reader.snapshot(), chart);
        draw(surface.as_mut(), &frame, &mut stats);

        let took = started.elapsed();
        if took > period {
            stats.overruns += 1;
            debug!(
                took = %format_duration(took),
                period = %format_duration(period),
                "render tick overran its period"
            );
        }
    }

    debug!(ticks = stats.ticks, failed = stats.failed, "render loop stopped");
    stats
}

fn draw(surface: &mut dyn RenderSurface, frame: &Renderable, stats: &mut RenderStats) {
    match surface.draw(frame) {
        Ok(()) => stats.ticks += 1,
        Err(e) => {
            stats.failed += 1;
            warn!(error = %e, "render tick failed, skipping frame");
        }
    }
}
