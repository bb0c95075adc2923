//! # streamchart
//!
//! A streaming aggregation engine with a live chart.
//!
//! Raw payloads arrive from a transport (a tailed file, a TCP stream, an
//! in-process channel, or a Kafka topic), are decoded into events, folded
//! into running per-category counts and a rolling window of metric values,
//! checked against a hysteresis alert rule, and periodically rendered as a
//! category distribution or a metric time series.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                             Engine                               │
//! │  ┌───────────┐   ┌─────────┐   ┌──────────────────┐              │
//! │  │ Transport │──▶│ Decoder │──▶│ SharedAggregator │ (sole writer)│
//! │  └───────────┘   └─────────┘   │  tallies, window │              │
//! │     ingestion loop             │  alert evaluator │              │
//! │                                └────────┬─────────┘              │
//! │                                         │ snapshot()             │
//! │     render loop (every period)          ▼                        │
//! │  ┌───────────────┐   ┌──────────────────────────┐                │
//! │  │ RenderSurface │◀──│ represent(snapshot, kind)│                │
//! │  └───────────────┘   └──────────────────────────┘                │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: the [`Transport`] trait and its implementations
//! - **[`decode`]**: payload bytes to [`Event`]s (JSON or delimited text)
//! - **[`aggregate`]**: category tallies, the rolling metric window, snapshots
//! - **[`alert`]**: the hysteresis alert rule and evaluator
//! - **[`render`]**: snapshot-to-frame conversion and the [`RenderSurface`] trait
//! - **[`engine`]**: the two loops, the stop signal and the session lifecycle
//! - **[`ui`]**: the ratatui terminal surface
//! - **[`config`]**: layered settings (defaults, TOML file, environment)
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Tail a JSON-lines file and chart the category distribution
//! streamchart --file events.jsonl
//!
//! # Chart a metric from a TCP feed, alerting above 80 until it drops to 50
//! streamchart --connect localhost:9999 --chart timeseries --alert-upper 80 --alert-lower 50
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::num::NonZeroUsize;
//! use streamchart::render::RecordingSurface;
//! use streamchart::source::ChannelTransport;
//! use streamchart::{AlertRule, Decoder, Engine, EngineConfig, StopReason};
//!
//! # tokio_test::block_on(async {
//! let (tx, transport) = ChannelTransport::create("example", 16);
//! let surface = RecordingSurface::new();
//! let frames = surface.frames();
//!
//! let config = EngineConfig::new(NonZeroUsize::new(60).unwrap(), AlertRule::new(80.0, 50.0).unwrap());
//! let engine = Engine::new(config, Box::new(transport), Decoder::json(), Box::new(surface));
//!
//! tx.send(br#"{"category":"a","metric":12.5}"#.to_vec()).await.unwrap();
//! drop(tx);
//!
//! let report = engine.run().await;
//! assert_eq!(report.reason, StopReason::EndOfStream);
//! assert_eq!(report.final_snapshot.events_ingested(), 1);
//! assert!(frames.lock().last().unwrap().frame.stream_ended.is_some());
//! # });
//! ```

pub mod aggregate;
pub mod alert;
pub mod config;
pub mod decode;
pub mod duration;
pub mod engine;
pub mod error;
pub mod event;
pub mod events;
pub mod export;
pub mod logging;
pub mod render;
pub mod source;
pub mod ui;

pub use aggregate::{Aggregator, SharedAggregator, Snapshot, SnapshotReader};
pub use alert::{AlertEvaluator, AlertRule, AlertState, AlertTransition};
pub use config::Settings;
pub use decode::{Decoder, PayloadFormat};
pub use engine::{Engine, EngineConfig, EngineState, SessionReport, StopHandle, StopReason};
pub use error::{ConfigError, DecodeError, RenderError, TransportError};
pub use event::Event;
pub use render::{represent, ChartKind, Renderable, RenderSurface};
pub use source::{Poll, Transport};
