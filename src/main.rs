use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use streamchart::config::{Settings, TransportKind, TransportSettings};
use streamchart::duration::parse_duration;
use streamchart::logging::{self, LogTarget};
use streamchart::render::LogSurface;
use streamchart::source::{FileTail, StreamTransport, Transport};
use streamchart::ui::{self, ChartView, TerminalSurface, Theme};
use streamchart::{
    events, export, ChartKind, Decoder, Engine, EngineConfig, PayloadFormat, SessionReport,
    StopReason,
};

#[derive(Parser, Debug)]
#[command(name = "streamchart")]
#[command(about = "Live chart of a streaming event feed")]
struct Args {
    /// TOML configuration file (overridden by STREAMCHART__* variables and flags)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tail a file of newline-delimited payloads
    #[arg(short, long, conflicts_with_all = ["connect", "kafka_topic"])]
    file: Option<PathBuf>,

    /// Read newline-delimited payloads from a TCP endpoint (host:port)
    #[arg(short, long, conflicts_with_all = ["file", "kafka_topic"])]
    connect: Option<String>,

    /// Subscribe to a Kafka topic (requires the `kafka` feature)
    #[arg(long, conflicts_with_all = ["file", "connect"])]
    kafka_topic: Option<String>,

    /// Kafka bootstrap brokers (used with --kafka-topic)
    #[arg(long, requires = "kafka_topic")]
    kafka_brokers: Option<String>,

    /// Chart to draw
    #[arg(long, value_enum)]
    chart: Option<ChartKind>,

    /// Render period (e.g., "500ms", "1s")
    #[arg(short, long)]
    refresh: Option<String>,

    /// Rolling metric window size
    #[arg(short, long)]
    window: Option<usize>,

    /// Raise the alert when the window mean reaches this value
    #[arg(long)]
    alert_upper: Option<f64>,

    /// Clear the alert when the window mean falls to this value
    #[arg(long)]
    alert_lower: Option<f64>,

    /// Payload format
    #[arg(long, value_enum)]
    format: Option<PayloadFormat>,

    /// Read the tailed file from the beginning
    #[arg(long)]
    from_start: bool,

    /// Log a summary per frame instead of drawing the terminal UI
    #[arg(long)]
    headless: bool,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Export the final session state to a JSON file on exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

impl Args {
    /// Apply command-line overrides on top of the loaded settings.
    fn apply(&self, settings: &mut Settings) -> Result<()> {
        let transport = &mut settings.transport;
        if let Some(path) = &self.file {
            transport.kind = TransportKind::File;
            transport.path = Some(path.clone());
        }
        if let Some(addr) = &self.connect {
            transport.kind = TransportKind::Tcp;
            transport.addr = Some(addr.clone());
        }
        if let Some(topic) = &self.kafka_topic {
            transport.kind = TransportKind::Kafka;
            transport.topic = topic.clone();
        }
        if let Some(brokers) = &self.kafka_brokers {
            transport.brokers = brokers.clone();
        }
        if self.from_start {
            transport.from_start = true;
        }

        if let Some(chart) = self.chart {
            settings.render.chart = chart;
        }
        if let Some(refresh) = &self.refresh {
            settings.render.period = parse_duration(refresh).context("invalid --refresh")?;
        }
        if let Some(capacity) = self.window {
            settings.window.capacity = capacity;
        }
        if let Some(upper) = self.alert_upper {
            settings.alert.upper = upper;
        }
        if let Some(lower) = self.alert_lower {
            settings.alert.lower = lower;
        }
        if let Some(format) = self.format {
            settings.decoder.format = format;
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings =
        Settings::load(args.config.as_deref()).context("failed to load configuration")?;
    args.apply(&mut settings)?;
    let engine_config = EngineConfig::from_settings(&settings).context("invalid configuration")?;

    let _log_guard = logging::init(&LogTarget::for_session(
        args.headless,
        args.log_file.as_deref(),
    ));

    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(run_session(&args, &settings, engine_config))?;

    println!("{report}");

    if let Some(path) = &args.export {
        let json = serde_json::to_string_pretty(&export::report_to_json(&report))?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write export to {}", path.display()))?;
        println!("Exported session to {}", path.display());
    }

    Ok(())
}

/// Open the transport and run one session to completion.
async fn run_session(
    args: &Args,
    settings: &Settings,
    config: EngineConfig,
) -> Result<SessionReport> {
    let transport = open_transport(&settings.transport).await?;
    let decoder = Decoder::from_settings(&settings.decoder);

    if args.headless {
        return Ok(run_headless(config, transport, decoder).await);
    }

    let view = ChartView::new(
        settings.render.title(),
        transport.description(),
        Theme::auto_detect(),
    );
    run_terminal(config, transport, decoder, view).await
}

async fn open_transport(settings: &TransportSettings) -> Result<Box<dyn Transport>> {
    match settings.kind {
        TransportKind::File => {
            let path = settings
                .path
                .as_ref()
                .context("file transport needs transport.path")?;
            Ok(Box::new(
                FileTail::new(path).from_start(settings.from_start),
            ))
        }
        TransportKind::Tcp => {
            let addr = settings
                .addr
                .as_deref()
                .context("tcp transport needs transport.addr")?;
            let stream = StreamTransport::connect(addr)
                .await
                .with_context(|| format!("failed to connect to {addr}"))?;
            Ok(Box::new(stream))
        }
        TransportKind::Kafka => open_kafka(settings),
    }
}

#[cfg(feature = "kafka")]
fn open_kafka(settings: &TransportSettings) -> Result<Box<dyn Transport>> {
    let transport = streamchart::source::KafkaTransport::builder()
        .brokers(&settings.brokers)
        .topic(&settings.topic)
        .group_id(&settings.group_id)
        .build()
        .context("failed to subscribe to Kafka")?;
    Ok(Box::new(transport))
}

#[cfg(not(feature = "kafka"))]
fn open_kafka(_settings: &TransportSettings) -> Result<Box<dyn Transport>> {
    anyhow::bail!("Kafka support is not compiled in; rebuild with `--features kafka`")
}

/// Log surface; Ctrl-C stops the session.
async fn run_headless(
    config: EngineConfig,
    transport: Box<dyn Transport>,
    decoder: Decoder,
) -> SessionReport {
    let engine = Engine::new(config, transport, decoder, Box::new(LogSurface::new()));

    let stop = engine.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping");
            stop.stop(StopReason::Shutdown);
        }
    });

    engine.run().await
}

/// Terminal surface; `q`, `Esc` or `Ctrl-C` stops the session. When the
/// stream ends on its own the final frame stays up until the user quits.
async fn run_terminal(
    config: EngineConfig,
    transport: Box<dyn Transport>,
    decoder: Decoder,
    view: ChartView,
) -> Result<SessionReport> {
    let terminal = ui::enter().context("failed to set up terminal")?;
    let surface = TerminalSurface::new(terminal, view);
    let engine = Engine::new(config, transport, decoder, Box::new(surface));

    let finished = Arc::new(AtomicBool::new(false));
    let keys = {
        let stop = engine.stop_handle();
        let finished = Arc::clone(&finished);
        tokio::task::spawn_blocking(move || events::wait_for_quit(stop, &finished))
    };

    let report = engine.run().await;
    if report.reason == StopReason::Shutdown {
        finished.store(true, Ordering::Relaxed);
    }

    let keys = keys.await;
    ui::restore().context("failed to restore terminal")?;
    keys.context("key handler panicked")?
        .context("failed to read terminal events")?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn settings_for(argv: &[&str]) -> Result<Settings> {
        let args = Args::try_parse_from(argv)?;
        let mut settings = Settings::default();
        args.apply(&mut settings)?;
        Ok(settings)
    }

    #[test]
    fn test_flags_override_settings() {
        let settings = settings_for(&[
            "streamchart",
            "--connect",
            "localhost:9999",
            "--chart",
            "timeseries",
            "--refresh",
            "250ms",
            "--window",
            "10",
            "--alert-upper",
            "90",
            "--alert-lower",
            "40",
            "--format",
            "delimited",
        ])
        .unwrap();

        assert_eq!(settings.transport.kind, TransportKind::Tcp);
        assert_eq!(settings.transport.addr.as_deref(), Some("localhost:9999"));
        assert_eq!(settings.render.chart, ChartKind::TimeSeries);
        assert_eq!(settings.render.period, Duration::from_millis(250));
        assert_eq!(settings.window.capacity, 10);
        assert_eq!((settings.alert.upper, settings.alert.lower), (90.0, 40.0));
        assert_eq!(settings.decoder.format, PayloadFormat::Delimited);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_transport_flags_conflict() {
        assert!(Args::try_parse_from(["streamchart", "--file", "a.jsonl", "--connect", "h:1"])
            .is_err());
        assert!(Args::try_parse_from(["streamchart", "--kafka-brokers", "b:9092"]).is_err());
    }

    #[test]
    fn test_bad_refresh_is_rejected() {
        assert!(settings_for(&["streamchart", "--refresh", "soon"]).is_err());
    }

    #[test]
    fn test_inverted_thresholds_fail_validation() {
        let settings =
            settings_for(&["streamchart", "--alert-upper", "40", "--alert-lower", "60"]).unwrap();
        assert!(settings.validate().is_err());
    }
}
