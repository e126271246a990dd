//! Control loop configuration

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Control loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Capacity of the cluster event channel
    pub event_buffer: usize,

    /// Deadline for one evaluation pass, in seconds
    pub evaluation_timeout_secs: u64,

    /// Retry backoff for failed passes
    pub backoff: BackoffConfig,
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer == 0 {
            return Err(anyhow!("controller.event_buffer must be greater than zero"));
        }

        if self.evaluation_timeout_secs == 0 {
            return Err(anyhow!(
                "controller.evaluation_timeout_secs must be greater than zero"
            ));
        }

        self.backoff.validate()
    }

    pub fn evaluation_timeout(&self) -> Duration {
        Duration::from_secs(self.evaluation_timeout_secs)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            event_buffer: 256,
            evaluation_timeout_secs: 60,
            backoff: BackoffConfig::default(),
        }
    }
}

/// Exponential retry backoff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Delay before the first retry, in milliseconds
    pub initial_ms: u64,

    /// Upper bound on any delay, in milliseconds
    pub max_ms: u64,

    /// Growth factor between consecutive retries
    pub multiplier: f64,
}

impl BackoffConfig {
    pub fn validate(&self) -> Result<()> {
        if self.initial_ms == 0 {
            return Err(anyhow!("controller.backoff.initial_ms must be greater than zero"));
        }

        if self.max_ms < self.initial_ms {
            return Err(anyhow!(
                "controller.backoff.max_ms ({}) is below initial_ms ({})",
                self.max_ms,
                self.initial_ms
            ));
        }

        if self.multiplier.is_nan() || self.multiplier < 1.0 {
            return Err(anyhow!(
                "controller.backoff.multiplier must be at least 1.0, got {}",
                self.multiplier
            ));
        }

        Ok(())
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_ms: 500,
            max_ms: 300_000,
            multiplier: 2.0,
        }
    }
}
