//! Sum + count latency aggregation, lifetime and windowed.
//!
//! Only the mean is derived from the aggregate; no quantiles are kept.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::lock;

/// One sum/count observation pair, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub sum_ms: f64,
    pub count: u64,
}

impl LatencySummary {
    /// Mean latency in milliseconds. `0.0` when nothing was observed.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum_ms / self.count as f64
        }
    }

    fn observe(&mut self, ms: f64) {
        self.sum_ms += ms;
        self.count += 1;
    }
}

#[derive(Debug, Default)]
struct Pairs {
    lifetime: LatencySummary,
    windowed: LatencySummary,
}

/// Latency aggregator with a lifetime pair and a resettable windowed pair.
///
/// Both pairs sit behind one mutex: an observation lands in both or, relative
/// to a concurrent reset, in neither window half.
#[derive(Debug, Default)]
pub struct WindowedLatency {
    pairs: Mutex<Pairs>,
}

impl WindowedLatency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation. Negative and NaN durations are clamped to 0.
    pub fn observe(&self, ms: f64) {
        let ms = clamp_ms(ms);
        let mut pairs = lock(&self.pairs);
        pairs.lifetime.observe(ms);
        pairs.windowed.observe(ms);
    }

    pub fn lifetime(&self) -> LatencySummary {
        lock(&self.pairs).lifetime
    }

    pub fn windowed(&self) -> LatencySummary {
        lock(&self.pairs).windowed
    }

    /// Zero the windowed sum and count.
    pub fn reset_window(&self) {
        lock(&self.pairs).windowed = LatencySummary::default();
    }
}

/// NaN fails the comparison too.
fn clamp_ms(ms: f64) -> f64 {
    if ms > 0.0 { ms } else { 0.0 }
}
