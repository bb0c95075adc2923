//! Error types for the ingestion, render, and configuration paths.

use thiserror::Error;

/// A payload that could not be turned into an [`Event`](crate::Event).
///
/// Decode errors are never fatal: the ingestion loop counts them and
/// moves on to the next payload.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// Payload bytes are not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,

    /// Payload is not a JSON object.
    #[error("malformed JSON payload: {0}")]
    Json(String),

    /// Category field is absent or blank.
    #[error("missing or empty category")]
    MissingCategory,

    /// Category field holds something other than a string.
    #[error("category field `{0}` is not a string")]
    CategoryNotString(String),

    /// A metric is required but the payload has none.
    #[error("missing metric")]
    MissingMetric,

    /// Metric field could not be parsed as a number.
    #[error("invalid metric `{0}`")]
    InvalidMetric(String),

    /// Metric parsed, but is NaN or infinite.
    #[error("metric is not finite: {0}")]
    NonFiniteMetric(f64),
}

/// Failure of the underlying transport. Ends the ingestion loop.
#[derive(Debug, Error)]
pub enum TransportError {
    /// File or socket I/O failed.
    #[error("I/O error on {source_name}: {error}")]
    Io {
        source_name: String,
        #[source]
        error: std::io::Error,
    },

    /// Remote end closed the connection.
    #[error("connection closed: {0}")]
    Closed(String),

    /// Message queue client reported an error.
    #[error("queue error: {0}")]
    Queue(String),
}

impl TransportError {
    pub(crate) fn io(source_name: impl Into<String>, error: std::io::Error) -> Self {
        TransportError::Io {
            source_name: source_name.into(),
            error,
        }
    }
}

/// A render tick that could not be drawn. The tick is skipped.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Terminal backend failed while drawing.
    #[error("draw failed: {0}")]
    Draw(#[from] std::io::Error),

    /// Surface refused the representation.
    #[error("surface unavailable: {0}")]
    Unavailable(String),
}

/// Invalid or incomplete configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Loading or deserializing the layered configuration failed.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A duration string could not be parsed.
    #[error("invalid duration `{0}`")]
    Duration(String),

    /// A value is out of its allowed range.
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// A transport is selected without the parameters it needs.
    #[error("transport `{kind}` requires `{field}`")]
    MissingTransportParam {
        kind: &'static str,
        field: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
