//! The ingestion loop: sole writer of the aggregator.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::{StopHandle, StopReason};
use crate::aggregate::SharedAggregator;
use crate::alert::AlertTransition;
use crate::decode::Decoder;
use crate::source::{Poll, Transport};

/// Give other tasks a turn after this many back-to-back payloads.
const YIELD_EVERY: u32 = 64;

/// Counters kept by the ingestion loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Payloads received from the transport.
    pub payloads: u64,
    /// Payloads that decoded into events.
    pub events: u64,
    /// Payloads dropped because they did not decode.
    pub decode_failures: u64,
    /// Alert raise/clear transitions observed.
    pub alert_transitions: u64,
}

pub(super) async fn run(
    mut transport: Box<dyn Transport>,
    decoder: Decoder,
    aggregator: SharedAggregator,
    stop: StopHandle,
    idle_backoff: Duration,
) -> IngestStats {
    let mut stats = IngestStats::default();
    let mut stop_rx = stop.subscribe();
    let mut burst = 0u32;

    debug!(source = transport.description(), "ingestion loop started");

    loop {
        if stop_rx.borrow_and_update().is_some() {
            break;
        }

        match transport.next() {
            Ok(Poll::Payload(raw)) => {
                stats.payloads += 1;
                match decoder.decode(&raw) {
                    Ok(event) => {
                        stats.events += 1;
                        if let Some(transition) = aggregator.ingest(event) {
                            stats.alert_transitions += 1;
                            log_transition(transition);
                        }
                    }
                    Err(e) => {
                        stats.decode_failures += 1;
                        aggregator.record_decode_failure();
                        if stats.decode_failures == 1 {
                            warn!(error = %e, "dropping undecodable payload (further failures logged at debug)");
                        } else {
                            debug!(error = %e, bytes = raw.len(), "dropping undecodable payload");
                        }
                    }
                }

                burst += 1;
                if burst >= YIELD_EVERY {
                    burst = 0;
                    tokio::task::yield_now().await;
                }
            }
            Ok(Poll::Pending) => {
                burst = 0;
                tokio::select! {
                    _ = tokio::time::sleep(idle_backoff) => {}
                    changed = stop_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            Ok(Poll::End) => {
                info!(source = transport.description(), "transport reached end of stream");
                stop.stop(StopReason::EndOfStream);
                break;
            }
            Err(e) => {
                warn!(source = transport.description(), error = %e, "transport failed");
                stop.stop(StopReason::TransportFailed(e.to_string()));
                break;
            }
        }
    }

    transport.close();
    debug!(
        payloads = stats.payloads,
        events = stats.events,
        decode_failures = stats.decode_failures,
        "ingestion loop stopped"
    );
    stats
}

fn log_transition(transition: AlertTransition) {
    match transition {
        AlertTransition::Raised { mean } => warn!(mean, "alert raised"),
        AlertTransition::Cleared { mean } => info!(mean, "alert cleared"),
    }
}
