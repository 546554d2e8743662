//! Counter configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::runtime::error::{CounterError, CounterResult};

/// Last value emitted by a default run.
pub const DEFAULT_BOUND: u32 = 100;
/// Pause between two emitted values in a default run.
pub const DEFAULT_INTERVAL_MS: u64 = 50;
/// Upper limit on the pause between values.
pub const MAX_INTERVAL_MS: u64 = 60 * 60 * 1000;

/// Configuration for a counter run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    /// Last value (inclusive) the counter emits
    pub bound: u32,
    /// Sleep between values, in milliseconds
    pub interval_ms: u64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            bound: DEFAULT_BOUND,
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}

impl CounterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bound(mut self, bound: u32) -> Self {
        self.bound = bound;
        self
    }

    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Set the interval from a `Duration`, truncated to whole milliseconds.
    pub fn with_interval(self, interval: Duration) -> Self {
        let millis = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self.with_interval_ms(millis)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn validate(&self) -> CounterResult<()> {
        if self.interval_ms > MAX_INTERVAL_MS {
            return Err(CounterError::invalid_config(format!(
                "interval_ms {} exceeds maximum of {}",
                self.interval_ms, MAX_INTERVAL_MS
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> CounterResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| CounterError::invalid_config(format!("parse failed: {}", err)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> CounterResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|err| {
            CounterError::invalid_config(format!("read {} failed: {}", path.display(), err))
        })?;
        Self::from_json_str(&contents)
    }
}
