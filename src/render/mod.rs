//! Turning snapshots into something a surface can draw.
//!
//! The render loop calls [`represent`] on every tick and hands the result to
//! a [`RenderSurface`]. Surfaces own all drawing mechanics; the engine only
//! cares that a frame was accepted.
//!
//! ## Submodules
//!
//! - [`log`]: headless surface that writes a one-line summary per frame
//! - [`recording`]: in-memory surface that keeps every frame it receives

pub mod log;
pub mod recording;

pub use log::LogSurface;
pub use recording::RecordingSurface;

use std::time::Duration;

use serde::Deserialize;

use crate::aggregate::Snapshot;
use crate::alert::AlertState;
use crate::error::RenderError;

/// Which chart the session draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// Share of events per category.
    #[default]
    Distribution,
    /// Metric values over time with the alert marker.
    #[value(name = "timeseries")]
    TimeSeries,
}

/// One category's share of the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: String,
    pub count: u64,
    pub proportion: f64,
}

/// Category proportions over all non-zero categories, in label order.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub slices: Vec<Slice>,
    pub total: u64,
}

/// The metric window on a time axis, flagged with the alert state.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    /// (seconds since session start, value), oldest first.
    pub points: Vec<(f64, f64)>,
    pub mean: f64,
    pub alert: AlertState,
    pub upper: f64,
    pub lower: f64,
}

impl TimeSeries {
    /// Time span covered by the points.
    pub fn x_bounds(&self) -> (f64, f64) {
        let first = self.points.first().map_or(0.0, |p| p.0);
        let last = self.points.last().map_or(0.0, |p| p.0);
        (first, last.max(first + 1.0))
    }

    /// Value range including both thresholds, so reference lines stay visible.
    pub fn y_bounds(&self) -> (f64, f64) {
        let (mut lo, mut hi) = (self.lower, self.upper);
        for &(_, v) in &self.points {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        let pad = ((hi - lo) * 0.05).max(1e-9);
        (lo - pad, hi + pad)
    }
}

/// What to draw in the chart area.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Nothing to show yet ("Waiting for data...").
    NoData,
    Distribution(Distribution),
    TimeSeries(TimeSeries),
}

/// A complete frame for one render tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Renderable {
    pub chart: ChartKind,
    pub body: Body,
    pub events_ingested: u64,
    pub decode_failures: u64,
    /// Time since session start when the snapshot was taken.
    pub elapsed: Duration,
    /// Set on the final frame after the engine stopped.
    pub stream_ended: Option<String>,
}

impl Renderable {
    /// Mark this frame as the final one, with the reason the stream ended.
    pub fn ended(mut self, reason: impl Into<String>) -> Self {
        self.stream_ended = Some(reason.into());
        self
    }
}

/// Build the frame for `chart` from a snapshot.
pub fn represent(snapshot: &Snapshot, chart: ChartKind) -> Renderable {
    let body = match chart {
        ChartKind::Distribution => distribution(snapshot),
        ChartKind::TimeSeries => time_series(snapshot),
    };

    Renderable {
        chart,
        body,
        events_ingested: snapshot.events_ingested(),
        decode_failures: snapshot.decode_failures,
        elapsed: snapshot
            .taken_at
            .saturating_duration_since(snapshot.started_at),
        stream_ended: None,
    }
}

fn distribution(snapshot: &Snapshot) -> Body {
    let total = snapshot.tallies.total();
    if total == 0 {
        return Body::NoData;
    }

    let slices = snapshot
        .tallies
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(label, count)| Slice {
            label: label.clone(),
            count: *count,
            proportion: *count as f64 / total as f64,
        })
        .collect();

    Body::Distribution(Distribution { slices, total })
}

fn time_series(snapshot: &Snapshot) -> Body {
    let Some(mean) = snapshot.window.mean() else {
        return Body::NoData;
    };

    let points = snapshot
        .window
        .samples()
        .map(|s| (snapshot.seconds_since_start(s.at), s.value))
        .collect();

    Body::TimeSeries(TimeSeries {
        points,
        mean,
        alert: snapshot.alert,
        upper: snapshot.rule.upper(),
        lower: snapshot.rule.lower(),
    })
}

/// Something that displays frames.
pub trait RenderSurface: Send {
    /// Display one frame. An error skips this tick only.
    fn draw(&mut self, frame: &Renderable) -> Result<(), RenderError>;
}

impl<S: RenderSurface + ?Sized> RenderSurface for Box<S> {
    fn draw(&mut self, frame: &Renderable) -> Result<(), RenderError> {
        (**self).draw(frame)
    }
}
