//! The streaming session: an ingestion loop and a render loop sharing one
//! aggregator.
//!
//! ## Architecture
//!
//! ```text
//!  Transport ──▶ Decoder ──▶ SharedAggregator ◀── SnapshotReader ◀── render loop
//!  (ingestion loop: sole writer)      │                     (interval tick)
//!                                     └─ AlertEvaluator               │
//!                                                                     ▼
//!                                                               RenderSurface
//! ```
//!
//! Both loops run as tokio tasks. They share nothing but the aggregator lock
//! and a stop signal (a watch channel carrying the [`StopReason`]).
//!
//! ## Lifecycle
//!
//! `Idle` (constructed) → `Running` ([`Engine::run`] resets the aggregator
//! and spawns both loops) → `Stopped` (both loops have finished). `run`
//! consumes the engine, so a stopped session cannot be restarted.

mod ingest;
mod render_loop;

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};

use crate::aggregate::{Aggregator, SharedAggregator, Snapshot, SnapshotReader};
use crate::alert::AlertRule;
use crate::config::Settings;
use crate::decode::Decoder;
use crate::duration::format_duration;
use crate::error::ConfigError;
use crate::render::{ChartKind, RenderSurface};
use crate::source::Transport;

pub use ingest::IngestStats;
pub use render_loop::RenderStats;

/// Session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Stopped,
}

/// Why a session stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Explicit shutdown request (user quit, signal, embedding code).
    Shutdown,
    /// The transport reported a terminal end of stream.
    EndOfStream,
    /// The transport failed; the message describes the error.
    TransportFailed(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Shutdown => write!(f, "shut down"),
            StopReason::EndOfStream => write!(f, "end of stream"),
            StopReason::TransportFailed(e) => write!(f, "transport failed: {e}"),
        }
    }
}

/// Requests a cooperative stop. Cheap to clone; the first reason wins.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<Option<StopReason>>>,
}

impl StopHandle {
    /// Signal both loops to stop. Returns false if a stop was already
    /// requested.
    pub fn stop(&self, reason: StopReason) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        })
    }

    pub fn is_stopped(&self) -> bool {
        self.tx.borrow().is_some()
    }

    fn subscribe(&self) -> watch::Receiver<Option<StopReason>> {
        self.tx.subscribe()
    }
}

/// Resolved engine parameters.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub chart: ChartKind,
    pub period: Duration,
    pub window_capacity: NonZeroUsize,
    pub rule: AlertRule,
    pub idle_backoff: Duration,
    pub shutdown_grace: Duration,
}

impl EngineConfig {
    /// Defaults for everything but the window and the alert rule.
    pub fn new(window_capacity: NonZeroUsize, rule: AlertRule) -> Self {
        Self {
            chart: ChartKind::default(),
            period: Duration::from_millis(500),
            window_capacity,
            rule,
            idle_backoff: Duration::from_millis(50),
            shutdown_grace: Duration::from_secs(2),
        }
    }

    pub fn chart(mut self, chart: ChartKind) -> Self {
        self.chart = chart;
        self
    }

    pub fn period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn idle_backoff(mut self, idle_backoff: Duration) -> Self {
        self.idle_backoff = idle_backoff;
        self
    }

    pub fn shutdown_grace(mut self, shutdown_grace: Duration) -> Self {
        self.shutdown_grace = shutdown_grace;
        self
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self::new(settings.window_capacity()?, settings.alert_rule()?)
            .chart(settings.render.chart)
            .period(settings.render.period)
            .idle_backoff(settings.transport.idle_backoff)
            .shutdown_grace(settings.engine.shutdown_grace))
    }
}

/// Summary of a finished session.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub reason: StopReason,
    pub ingest: IngestStats,
    pub render: RenderStats,
    pub final_snapshot: Snapshot,
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "session {} after {}: {} events, {} decode failures, {} frames ({} failed)",
            self.reason,
            format_duration(
                self.final_snapshot
                    .taken_at
                    .saturating_duration_since(self.final_snapshot.started_at)
            ),
            self.final_snapshot.events_ingested(),
            self.final_snapshot.decode_failures,
            self.render.ticks,
            self.render.failed,
        )
    }
}

/// One streaming session.
pub struct Engine {
    config: EngineConfig,
    transport: Box<dyn Transport>,
    decoder: Decoder,
    surface: Box<dyn RenderSurface>,
    aggregator: SharedAggregator,
    stop: StopHandle,
    state: watch::Sender<EngineState>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("transport", &self.transport)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        transport: Box<dyn Transport>,
        decoder: Decoder,
        surface: Box<dyn RenderSurface>,
    ) -> Self {
        let aggregator =
            SharedAggregator::new(Aggregator::new(config.window_capacity, config.rule));
        let (stop_tx, _) = watch::channel(None);
        let (state, _) = watch::channel(EngineState::Idle);

        Self {
            config,
            transport,
            decoder,
            surface,
            aggregator,
            stop: StopHandle {
                tx: Arc::new(stop_tx),
            },
            state,
        }
    }

    /// Handle for requesting shutdown from outside the session.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Watch the session phase.
    pub fn state(&self) -> watch::Receiver<EngineState> {
        self.state.subscribe()
    }

    /// Read-only snapshot access, e.g. for exporting state on exit.
    pub fn snapshots(&self) -> SnapshotReader {
        self.aggregator.reader()
    }

    /// Run the session until it stops, then report.
    pub async fn run(self) -> SessionReport {
        let Engine {
            config,
            transport,
            decoder,
            surface,
            aggregator,
            stop,
            state,
        } = self;

        aggregator.reset();
        let reader = aggregator.reader();

        info!(
            source = transport.description(),
            chart = ?config.chart,
            period = %format_duration(config.period),
            window = config.window_capacity.get(),
            upper = config.rule.upper(),
            lower = config.rule.lower(),
            "session started"
        );
        state.send_replace(EngineState::Running);

        let mut ingest_task = tokio::spawn(ingest::run(
            transport,
            decoder,
            aggregator,
            stop.clone(),
            config.idle_backoff,
        ));
        let mut render_task = tokio::spawn(render_loop::run(
            surface,
            reader.clone(),
            config.chart,
            config.period,
            stop.subscribe(),
        ));

        // Wait until something asks to stop, or the ingestion loop ends on
        // its own (it records its own stop reason when it does).
        let mut stop_rx = stop.subscribe();
        let ingest_result = tokio::select! {
            result = &mut ingest_task => Some(result),
            _ = async {
                let _ = stop_rx.wait_for(Option::is_some).await;
            } => None,
        };

        let deadline = Instant::now() + config.shutdown_grace;
        let ingest = match ingest_result {
            Some(Ok(stats)) => stats,
            Some(Err(e)) => {
                warn!(error = %e, "ingestion task failed");
                stop.stop(StopReason::TransportFailed(format!("ingestion task failed: {e}")));
                IngestStats::default()
            }
            None => join_within(&mut ingest_task, deadline, "ingestion").await,
        };
        let render = join_within(&mut render_task, deadline, "render").await;

        let reason = stop.tx.borrow().clone().unwrap_or(StopReason::Shutdown);
        let final_snapshot = reader.snapshot();
        state.send_replace(EngineState::Stopped);

        let report = SessionReport {
            reason,
            ingest,
            render,
            final_snapshot,
        };
        info!("{}", report);
        report
    }
}

/// Await a loop task until `deadline`, aborting it if it overstays.
async fn join_within<T: Default>(
    task: &mut JoinHandle<T>,
    deadline: Instant,
    name: &'static str,
) -> T {
    match timeout_at(deadline, &mut *task).await {
        Ok(Ok(stats)) => stats,
        Ok(Err(e)) => {
            warn!(task = name, error = %e, "loop task failed");
            T::default()
        }
        Err(_) => {
            warn!(task = name, "loop did not stop within the grace period, aborting");
            task.abort();
            T::default()
        }
    }
}
