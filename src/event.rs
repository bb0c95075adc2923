//! The decoded unit of stream data.

use tokio::time::Instant;

/// One decoded event: a category label, an optional numeric metric, and the
/// instant it was decoded.
///
/// Events are immutable once built and are consumed exactly once by the
/// [`Aggregator`](crate::aggregate::Aggregator).
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    category: String,
    metric: Option<f64>,
    timestamp: Instant,
}

impl Event {
    /// Create an event stamped with the current instant.
    pub fn new(category: impl Into<String>, metric: Option<f64>) -> Self {
        Self::at(category, metric, Instant::now())
    }

    /// Create an event with an explicit timestamp.
    pub fn at(category: impl Into<String>, metric: Option<f64>, timestamp: Instant) -> Self {
        Self {
            category: category.into(),
            metric,
            timestamp,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn metric(&self) -> Option<f64> {
        self.metric
    }

    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }
}
