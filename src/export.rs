//! JSON export of a finished session.

use serde_json::{json, Map, Value};

use crate::engine::SessionReport;

/// Build the export document for `report`.
///
/// ```json
/// {
///   "summary": { "reason": "end of stream", "events": 6, ... },
///   "categories": { "a": { "count": 3, "proportion": 0.5 }, ... },
///   "window": { "values": [...], "mean": 42.0 },
///   "alert": { "active": false, "upper": 80.0, "lower": 50.0 }
/// }
/// ```
pub fn report_to_json(report: &SessionReport) -> Value {
    let snapshot = &report.final_snapshot;
    let total = snapshot.tallies.total();

    let categories: Map<String, Value> = snapshot
        .tallies
        .iter()
        .map(|(label, count)| {
            let proportion = if total == 0 {
                0.0
            } else {
                *count as f64 / total as f64
            };
            (
                label.clone(),
                json!({ "count": count, "proportion": proportion }),
            )
        })
        .collect();

    json!({
        "summary": {
            "reason": report.reason.to_string(),
            "events": snapshot.events_ingested(),
            "payloads": report.ingest.payloads,
            "decode_failures": snapshot.decode_failures,
            "alert_transitions": report.ingest.alert_transitions,
            "frames": report.render.ticks,
            "failed_frames": report.render.failed,
            "elapsed_secs": snapshot
                .taken_at
                .saturating_duration_since(snapshot.started_at)
                .as_secs_f64(),
        },
        "categories": categories,
        "window": {
            "capacity": snapshot.window.capacity(),
            "values": snapshot.window.values().collect::<Vec<_>>(),
            "mean": snapshot.window.mean(),
        },
        "alert": {
            "active": snapshot.alert.active,
            "upper": snapshot.rule.upper(),
            "lower": snapshot.rule.lower(),
        },
    })
}
