//! Session configuration.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `STREAMCHART__`-prefixed environment variables (`__` separates sections,
//! e.g. `STREAMCHART__ALERT__UPPER=90`). Command-line flags are applied on
//! top by the binary.
//!
//! ```toml
//! [render]
//! chart = "timeseries"
//! period = "500ms"
//!
//! [window]
//! capacity = 30
//!
//! [alert]
//! upper = 80.0
//! lower = 50.0
//!
//! [transport]
//! kind = "file"
//! path = "events.jsonl"
//! ```

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::alert::AlertRule;
use crate::decode::PayloadFormat;
use crate::error::ConfigError;
use crate::render::ChartKind;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "STREAMCHART";

/// All settings for one streaming session. Static once resolved.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub render: RenderSettings,
    pub window: WindowSettings,
    pub alert: AlertSettings,
    pub decoder: DecoderSettings,
    pub transport: TransportSettings,
    pub engine: EngineSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub chart: ChartKind,
    #[serde(deserialize_with = "crate::duration::deserialize")]
    pub period: Duration,
    /// Chart title; a default is derived from the chart kind when unset.
    pub title: Option<String>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            chart: ChartKind::default(),
            period: Duration::from_millis(500),
            title: None,
        }
    }
}

impl RenderSettings {
    pub fn title(&self) -> &str {
        match (&self.title, self.chart) {
            (Some(title), _) => title,
            (None, ChartKind::Distribution) => "Real-Time Category Frequency",
            (None, ChartKind::TimeSeries) => "Live Metric with Alert",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub capacity: usize,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self { capacity: 60 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    pub upper: f64,
    pub lower: f64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            upper: 80.0,
            lower: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DecoderSettings {
    pub format: PayloadFormat,
    pub category_field: String,
    pub metric_field: Option<String>,
    pub delimiter: char,
    pub category_index: usize,
    pub metric_index: Option<usize>,
    pub require_metric: bool,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            format: PayloadFormat::Json,
            category_field: "category".to_string(),
            metric_field: Some("metric".to_string()),
            delimiter: ',',
            category_index: 0,
            metric_index: Some(1),
            require_metric: false,
        }
    }
}

/// Which transport feeds the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Tail an append-only file.
    #[default]
    File,
    /// Newline-delimited payloads over TCP.
    Tcp,
    /// Kafka topic subscription.
    Kafka,
}

impl TransportKind {
    fn as_str(&self) -> &'static str {
        match self {
            TransportKind::File => "file",
            TransportKind::Tcp => "tcp",
            TransportKind::Kafka => "kafka",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    pub kind: TransportKind,
    /// File to tail.
    pub path: Option<PathBuf>,
    /// Read the file from the beginning instead of only new lines.
    pub from_start: bool,
    /// TCP endpoint (host:port).
    pub addr: Option<String>,
    pub brokers: String,
    pub topic: String,
    pub group_id: String,
    /// Pause between empty polls.
    #[serde(deserialize_with = "crate::duration::deserialize")]
    pub idle_backoff: Duration,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            kind: TransportKind::File,
            path: Some(PathBuf::from("events.jsonl")),
            from_start: false,
            addr: None,
            brokers: "localhost:9092".to_string(),
            topic: "buzzline-topic".to_string(),
            group_id: "streamchart".to_string(),
            idle_backoff: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// How long to wait for both loops after a stop before aborting them.
    #[serde(deserialize_with = "crate::duration::deserialize")]
    pub shutdown_grace: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            shutdown_grace: Duration::from_secs(2),
        }
    }
}

impl Settings {
    /// Load defaults, the optional file at `path`, and environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Check cross-field constraints. Call after all overrides are applied.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.window_capacity()?;
        self.alert_rule()?;

        if self.render.period.is_zero() {
            return Err(ConfigError::invalid("render.period", "must be non-zero"));
        }
        if self.transport.idle_backoff.is_zero() {
            return Err(ConfigError::invalid(
                "transport.idle_backoff",
                "must be non-zero",
            ));
        }

        if self.decoder.format == PayloadFormat::Delimited
            && self.decoder.metric_index == Some(self.decoder.category_index)
        {
            return Err(ConfigError::invalid(
                "decoder.metric_index",
                "must differ from decoder.category_index",
            ));
        }
        if self.decoder.format == PayloadFormat::Json && self.decoder.category_field.is_empty() {
            return Err(ConfigError::invalid(
                "decoder.category_field",
                "must not be empty",
            ));
        }

        self.validate_transport()
    }

    fn validate_transport(&self) -> Result<(), ConfigError> {
        let t = &self.transport;
        let kind = t.kind.as_str();
        match t.kind {
            TransportKind::File if t.path.is_none() => {
                Err(ConfigError::MissingTransportParam { kind, field: "path" })
            }
            TransportKind::Tcp if t.addr.as_deref().map_or(true, str::is_empty) => {
                Err(ConfigError::MissingTransportParam { kind, field: "addr" })
            }
            TransportKind::Kafka if t.brokers.is_empty() => {
                Err(ConfigError::MissingTransportParam {
                    kind,
                    field: "brokers",
                })
            }
            TransportKind::Kafka if t.topic.is_empty() => {
                Err(ConfigError::MissingTransportParam { kind, field: "topic" })
            }
            TransportKind::Kafka if !cfg!(feature = "kafka") => Err(ConfigError::invalid(
                "transport.kind",
                "this build does not include the `kafka` feature",
            )),
            _ => Ok(()),
        }
    }

    pub fn window_capacity(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.window.capacity)
            .ok_or_else(|| ConfigError::invalid("window.capacity", "must be at least 1"))
    }

    pub fn alert_rule(&self) -> Result<AlertRule, ConfigError> {
        AlertRule::new(self.alert.upper, self.alert.lower)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    /// `Settings::load` reads the process environment; tests that load or
    /// set `STREAMCHART__*` variables hold this lock.
    static ENV_LOCK: parking_lot::Mutex<()> = parking_lot::Mutex::new(());

    fn toml_file() -> NamedTempFile {
        tempfile::Builder::new().suffix(".toml").tempfile().unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.render.period, Duration::from_millis(500));
        assert_eq!(settings.window_capacity().unwrap().get(), 60);
        assert_eq!(settings.render.title(), "Real-Time Category Frequency");
    }

    #[test]
    fn test_load_from_file() {
        let _env = ENV_LOCK.lock();
        let mut file = toml_file();
        writeln!(
            file,
            r#"
            [render]
            chart = "timeseries"
            period = "250ms"

            [window]
            capacity = 5

            [alert]
            upper = 0.9
            lower = 0.4

            [decoder]
            format = "delimited"
            delimiter = "|"
            category_index = 1
            metric_index = 2

            [transport]
            kind = "tcp"
            addr = "127.0.0.1:9000"
            idle_backoff = "10ms"
            "#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        settings.validate().unwrap();
        assert_eq!(settings.render.chart, ChartKind::TimeSeries);
        assert_eq!(settings.render.period, Duration::from_millis(250));
        assert_eq!(settings.window.capacity, 5);
        assert_eq!(settings.alert_rule().unwrap().upper(), 0.9);
        assert_eq!(settings.decoder.format, PayloadFormat::Delimited);
        assert_eq!(settings.decoder.delimiter, '|');
        assert_eq!(settings.decoder.metric_index, Some(2));
        assert_eq!(settings.transport.kind, TransportKind::Tcp);
        assert_eq!(settings.transport.idle_backoff, Duration::from_millis(10));
        // Untouched sections keep their defaults.
        assert_eq!(settings.engine.shutdown_grace, Duration::from_secs(2));
    }

    #[test]
    fn test_rejects_bad_duration_in_file() {
        let _env = ENV_LOCK.lock();
        let mut file = toml_file();
        writeln!(file, "[render]\nperiod = \"often\"").unwrap();
        assert!(Settings::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_environment_overrides_file() {
        let _env = ENV_LOCK.lock();
        let mut file = toml_file();
        writeln!(file, "[alert]\nupper = 0.9\nlower = 0.4").unwrap();

        std::env::set_var("STREAMCHART__ALERT__UPPER", "0.95");
        std::env::set_var("STREAMCHART__RENDER__PERIOD", "2s");
        let loaded = Settings::load(Some(file.path()));
        std::env::remove_var("STREAMCHART__ALERT__UPPER");
        std::env::remove_var("STREAMCHART__RENDER__PERIOD");

        let settings = loaded.unwrap();
        assert_eq!(settings.alert.upper, 0.95);
        assert_eq!(settings.alert.lower, 0.4);
        assert_eq!(settings.render.period, Duration::from_secs(2));
        settings.validate().unwrap();
    }

    #[test]
    fn test_validation_errors() {
        let mut settings = Settings::default();
        settings.window.capacity = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.alert.lower = settings.alert.upper;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.render.period = Duration::ZERO;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.decoder.format = PayloadFormat::Delimited;
        settings.decoder.metric_index = Some(0);
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.transport.kind = TransportKind::Tcp;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::MissingTransportParam { field: "addr", .. })
        ));
    }
}
