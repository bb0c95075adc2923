//! Headless surface: one log line per frame.

use tracing::{info, warn};

use super::{Body, RenderSurface, Renderable};
use crate::duration::format_duration;
use crate::error::RenderError;

/// Writes a compact summary of each frame through `tracing`.
///
/// Used when no terminal is attached (`--headless`), e.g. in CI or when the
/// output is piped to a log collector.
#[derive(Debug, Default)]
pub struct LogSurface {
    frames: u64,
}

impl LogSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames drawn so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// One-line description of the chart body.
pub fn summarize(body: &Body) -> String {
    match body {
        Body::NoData => "waiting for data".to_string(),
        Body::Distribution(dist) => dist
            .slices
            .iter()
            .map(|s| format!("{}={:.1}%", s.label, s.proportion * 100.0))
            .collect::<Vec<_>>()
            .join(" "),
        Body::TimeSeries(series) => {
            let latest = series.points.last().map_or(0.0, |p| p.1);
            format!(
                "latest={:.2} mean={:.2} samples={} alert={}",
                latest,
                series.mean,
                series.points.len(),
                if series.alert.active { "ACTIVE" } else { "ok" }
            )
        }
    }
}

impl RenderSurface for LogSurface {
    fn draw(&mut self, frame: &Renderable) -> Result<(), RenderError> {
        self.frames += 1;
        let summary = summarize(&frame.body);

        match &frame.stream_ended {
            Some(reason) => warn!(
                events = frame.events_ingested,
                decode_failures = frame.decode_failures,
                reason = %reason,
                "stream ended: {}",
                summary
            ),
            None => info!(
                events = frame.events_ingested,
                decode_failures = frame.decode_failures,
                elapsed = %format_duration(frame.elapsed),
                "{}",
                summary
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::render::{ChartKind, Distribution, Slice};

    #[test]
    fn test_summarize_distribution() {
        let body = Body::Distribution(Distribution {
            slices: vec![
                Slice {
                    label: "found".to_string(),
                    count: 1,
                    proportion: 0.25,
                },
                Slice {
                    label: "saw".to_string(),
                    count: 3,
                    proportion: 0.75,
                },
            ],
            total: 4,
        });
        assert_eq!(summarize(&body), "found=25.0% saw=75.0%");
        assert_eq!(summarize(&Body::NoData), "waiting for data");
    }

    #[test]
    fn test_counts_frames() {
        let mut surface = LogSurface::new();
        let frame = Renderable {
            chart: ChartKind::Distribution,
            body: Body::NoData,
            events_ingested: 0,
            decode_failures: 0,
            elapsed: Duration::ZERO,
            stream_ended: None,
        };
        surface.draw(&frame).unwrap();
        surface.draw(&frame.clone().ended("shutdown")).unwrap();
        assert_eq!(surface.frames(), 2);
    }
}
