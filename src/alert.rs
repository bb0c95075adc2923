//! Threshold alerting with hysteresis over the metric window.
//!
//! The alert raises when the window mean reaches the upper threshold and
//! only clears once the mean falls to the strictly lower release threshold.

use tokio::time::Instant;

use crate::aggregate::MetricWindow;
use crate::error::ConfigError;

/// Upper trigger and lower release thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertRule {
    upper: f64,
    lower: f64,
}

impl AlertRule {
    /// Create a rule. `lower` must be strictly below `upper` and both finite.
    pub fn new(upper: f64, lower: f64) -> Result<Self, ConfigError> {
        if !upper.is_finite() || !lower.is_finite() {
            return Err(ConfigError::invalid(
                "alert thresholds",
                "thresholds must be finite",
            ));
        }
        if lower >= upper {
            return Err(ConfigError::invalid(
                "alert thresholds",
                format!("lower ({lower}) must be below upper ({upper})"),
            ));
        }
        Ok(Self { upper, lower })
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }
}

/// Current alert status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertState {
    pub active: bool,
    /// Instant of the last real transition, or of evaluator start.
    pub last_transition: Instant,
}

/// A change of alert status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlertTransition {
    Raised { mean: f64 },
    Cleared { mean: f64 },
}

/// Owns the [`AlertState`] and applies the [`AlertRule`] to the window.
#[derive(Debug, Clone)]
pub struct AlertEvaluator {
    rule: AlertRule,
    state: AlertState,
}

impl AlertEvaluator {
    pub fn new(rule: AlertRule) -> Self {
        Self::starting_at(rule, Instant::now())
    }

    pub fn starting_at(rule: AlertRule, now: Instant) -> Self {
        Self {
            rule,
            state: AlertState {
                active: false,
                last_transition: now,
            },
        }
    }

    pub fn rule(&self) -> AlertRule {
        self.rule
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    /// Evaluate the window after a metric was appended.
    pub fn evaluate(&mut self, window: &MetricWindow) -> Option<AlertTransition> {
        self.evaluate_at(window, Instant::now())
    }

    /// Evaluate with an explicit clock reading.
    ///
    /// An empty window leaves the state untouched: there is no mean to
    /// compare, and an active alert only clears through the release rule.
    pub fn evaluate_at(&mut self, window: &MetricWindow, now: Instant) -> Option<AlertTransition> {
        let mean = window.mean()?;

        let transition = if !self.state.active && mean >= self.rule.upper {
            AlertTransition::Raised { mean }
        } else if self.state.active && mean <= self.rule.lower {
            AlertTransition::Cleared { mean }
        } else {
            return None;
        };

        self.state = AlertState {
            active: matches!(transition, AlertTransition::Raised { .. }),
            last_transition: now,
        };
        Some(transition)
    }

    /// Back to inactive, as at session start.
    pub fn reset(&mut self, now: Instant) {
        self.state = AlertState {
            active: false,
            last_transition: now,
        };
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;
    use std::time::Duration;

    use super::*;
    use crate::aggregate::MetricSample;

    fn single_sample_window() -> MetricWindow {
        MetricWindow::new(NonZeroUsize::new(1).unwrap())
    }

    #[test]
    fn test_rule_validation() {
        assert!(AlertRule::new(80.0, 50.0).is_ok());
        assert!(AlertRule::new(50.0, 50.0).is_err());
        assert!(AlertRule::new(50.0, 80.0).is_err());
        assert!(AlertRule::new(f64::INFINITY, 0.0).is_err());
        assert!(AlertRule::new(1.0, f64::NAN).is_err());
    }

    #[test]
    fn test_hysteresis_sequence() {
        let start = Instant::now();
        let mut evaluator = AlertEvaluator::starting_at(AlertRule::new(80.0, 50.0).unwrap(), start);
        let mut window = single_sample_window();

        let means = [60.0, 85.0, 70.0, 55.0, 45.0, 90.0];
        let mut transitions = Vec::new();
        for (i, mean) in means.into_iter().enumerate() {
            let now = start + Duration::from_secs(i as u64 + 1);
            window.push(MetricSample {
                value: mean,
                at: now,
            });
            if let Some(t) = evaluator.evaluate_at(&window, now) {
                transitions.push((i, t));
            }
        }

        assert_eq!(
            transitions,
            vec![
                (1, AlertTransition::Raised { mean: 85.0 }),
                (4, AlertTransition::Cleared { mean: 45.0 }),
                (5, AlertTransition::Raised { mean: 90.0 }),
            ]
        );
    }

    #[test]
    fn test_last_transition_only_moves_on_transition() {
        let start = Instant::now();
        let mut evaluator = AlertEvaluator::starting_at(AlertRule::new(80.0, 50.0).unwrap(), start);
        let mut window = single_sample_window();

        let raised_at = start + Duration::from_secs(1);
        window.push(MetricSample {
            value: 90.0,
            at: raised_at,
        });
        evaluator.evaluate_at(&window, raised_at);

        // Still above the release threshold: no change.
        let later = start + Duration::from_secs(2);
        window.push(MetricSample {
            value: 70.0,
            at: later,
        });
        assert!(evaluator.evaluate_at(&window, later).is_none());

        let state = evaluator.state();
        assert!(state.active);
        assert_eq!(state.last_transition, raised_at);
    }

    #[test]
    fn test_trigger_value_does_not_release() {
        // Release needs mean <= lower; the trigger value itself is above it.
        let mut evaluator = AlertEvaluator::new(AlertRule::new(80.0, 50.0).unwrap());
        let mut window = single_sample_window();
        for _ in 0..3 {
            window.push(MetricSample {
                value: 80.0,
                at: Instant::now(),
            });
            evaluator.evaluate(&window);
            assert!(evaluator.state().active);
        }
    }

    #[test]
    fn test_empty_window_keeps_state() {
        let mut evaluator = AlertEvaluator::new(AlertRule::new(80.0, 50.0).unwrap());
        let mut window = single_sample_window();
        assert!(evaluator.evaluate(&window).is_none());
        assert!(!evaluator.state().active);

        window.push(MetricSample {
            value: 99.0,
            at: Instant::now(),
        });
        evaluator.evaluate(&window);
        window.clear();
        assert!(evaluator.evaluate(&window).is_none());
        assert!(evaluator.state().active);
    }
}
