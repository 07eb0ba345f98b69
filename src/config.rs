use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MAX_SETTLE_DELAY_MS: u64 = 1_000;
pub const MAX_STEP_DELAY_MS: u64 = 10_000;

/// Timing and filtering knobs for an extraction run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Wait after revealing the correct answer, before extracting.
    pub settle_delay_ms: u64,
    /// Wait after advancing, before the next iteration.
    pub step_delay_ms: u64,
    /// Skip items the adapter reports as answered correctly.
    pub incorrect_only: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1_000,
            step_delay_ms: 3_000,
            incorrect_only: false,
        }
    }
}

impl DriverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON config handed over by the host page.
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        let config: DriverConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Values above [`MAX_SETTLE_DELAY_MS`] are clamped.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = clamp_millis(delay, MAX_SETTLE_DELAY_MS);
        self
    }

    /// Values above [`MAX_STEP_DELAY_MS`] are clamped.
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay_ms = clamp_millis(delay, MAX_STEP_DELAY_MS);
        self
    }

    pub fn incorrect_only(mut self) -> Self {
        self.incorrect_only = true;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settle_delay_ms > MAX_SETTLE_DELAY_MS {
            return Err(ConfigError::DelayOutOfRange {
                field: "settle_delay_ms",
                value_ms: self.settle_delay_ms,
                max_ms: MAX_SETTLE_DELAY_MS,
            });
        }
        if self.step_delay_ms > MAX_STEP_DELAY_MS {
            return Err(ConfigError::DelayOutOfRange {
                field: "step_delay_ms",
                value_ms: self.step_delay_ms,
                max_ms: MAX_STEP_DELAY_MS,
            });
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms.min(MAX_SETTLE_DELAY_MS))
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms.min(MAX_STEP_DELAY_MS))
    }
}

fn clamp_millis(delay: Duration, max_ms: u64) -> u64 {
    u64::try_from(delay.as_millis()).map_or(max_ms, |ms| ms.min(max_ms))
}
