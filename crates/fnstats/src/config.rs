//! Collector configuration, loadable from TOML.
//!
//! ```toml
//! window_interval = "60s"
//! exception_log_capacity = 10
//! metrics_prefix = "pulsar_function_"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StatsError, StatsResult};

/// Default trailing-window length.
pub const DEFAULT_WINDOW_INTERVAL: &str = "60s";

/// Default number of entries kept per exception log.
pub const DEFAULT_EXCEPTION_LOG_CAPACITY: usize = 10;

/// Longest accepted window. Keeps the first reset deadline representable
/// as an `Instant`.
pub const MAX_WINDOW_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default prefix applied to every exported metric name.
pub const DEFAULT_METRICS_PREFIX: &str = "pulsar_function_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Reset period for the windowed metrics ("500ms", "60s", "1m").
    pub window_interval: String,
    /// Maximum entries retained by each exception log.
    pub exception_log_capacity: usize,
    /// Prefix for exported metric names.
    pub metrics_prefix: String,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            window_interval: DEFAULT_WINDOW_INTERVAL.to_string(),
            exception_log_capacity: DEFAULT_EXCEPTION_LOG_CAPACITY,
            metrics_prefix: DEFAULT_METRICS_PREFIX.to_string(),
        }
    }
}

impl StatsConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> StatsResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a config from TOML text.
    pub fn from_toml_str(content: &str) -> StatsResult<Self> {
        let config: StatsConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the interval parses to a non-zero duration and the
    /// exception logs can hold at least one entry.
    pub fn validate(&self) -> StatsResult<()> {
        self.window_interval()?;
        if self.exception_log_capacity == 0 {
            return Err(StatsError::InvalidConfig(
                "exception_log_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The parsed reset period, between zero (exclusive) and
    /// [`MAX_WINDOW_INTERVAL`].
    pub fn window_interval(&self) -> StatsResult<Duration> {
        let Some(interval) = parse_duration(&self.window_interval) else {
            return Err(StatsError::InvalidConfig(format!(
                "unparseable window_interval: {:?}",
                self.window_interval
            )));
        };
        if interval.is_zero() {
            return Err(StatsError::InvalidConfig(
                "window_interval must be greater than zero".to_string(),
            ));
        }
        if interval > MAX_WINDOW_INTERVAL {
            return Err(StatsError::InvalidConfig(format!(
                "window_interval {:?} exceeds the maximum of {}s",
                self.window_interval,
                MAX_WINDOW_INTERVAL.as_secs()
            )));
        }
        Ok(interval)
    }
}

/// Parse "500ms", "60s", "1m", or bare seconds. `None` on unknown units
/// or values that overflow a `Duration`.
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (digits, millis_per_unit) = if let Some(v) = s.strip_suffix("ms") {
        (v, 1)
    } else if let Some(v) = s.strip_suffix('s') {
        (v, 1_000)
    } else if let Some(v) = s.strip_suffix('m') {
        (v, 60_000)
    } else {
        (s, 1_000)
    };
    let value = digits.trim().parse::<u64>().ok()?;
    value.checked_mul(millis_per_unit).map(Duration::from_millis)
}
