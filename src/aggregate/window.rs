//! Bounded FIFO of recent metric samples.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use tokio::time::Instant;

/// A metric value with its arrival instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSample {
    pub value: f64,
    pub at: Instant,
}

/// The most recent `capacity` metric samples in arrival order.
///
/// Pushing into a full window evicts the oldest sample. The window only
/// empties on [`clear`](Self::clear).
#[derive(Debug, Clone, PartialEq)]
pub struct MetricWindow {
    samples: VecDeque<MetricSample>,
    capacity: NonZeroUsize,
}

impl MetricWindow {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.get()),
            capacity,
        }
    }

    /// Append a sample, returning the evicted one if the window was full.
    pub fn push(&mut self, sample: MetricSample) -> Option<MetricSample> {
        let evicted = if self.samples.len() == self.capacity.get() {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    /// Arithmetic mean, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let len = self.samples.len() as f64;
        let sum: f64 = self.samples.iter().map(|s| s.value).sum();
        if sum.is_finite() {
            return Some(sum / len);
        }
        // The plain sum overflowed; scaling first keeps every term finite.
        Some(self.samples.iter().map(|s| s.value / len).sum())
    }

    /// Values oldest first.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.value)
    }

    pub fn samples(&self) -> impl Iterator<Item = &MetricSample> + '_ {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&MetricSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
