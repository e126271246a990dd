//! Retry delays for failed passes

use std::time::Duration;

use crate::config::BackoffConfig;

/// Exponential backoff, capped at a maximum delay
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    multiplier: f64,
    attempt: u32,
}

impl Backoff {
    pub fn new(config: &BackoffConfig) -> Self {
        Self {
            initial: config.initial_delay(),
            max: config.max_delay(),
            multiplier: config.multiplier,
            attempt: 0,
        }
    }

    /// Delay before the next retry; each call grows the following one
    pub fn next_delay(&mut self) -> Duration {
        let factor = self.multiplier.powi(self.attempt.min(i32::MAX as u32) as i32);
        let secs = self.initial.as_secs_f64() * factor;
        self.attempt = self.attempt.saturating_add(1);

        if !secs.is_finite() || secs >= self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Start over after a successful pass
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Retries since the last reset
    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}
