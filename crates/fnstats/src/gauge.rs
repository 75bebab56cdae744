//! Last-invocation timestamp gauge.

use std::sync::atomic::{AtomicU64, Ordering};

/// A single `f64` holding the last invocation time in epoch milliseconds.
///
/// Stored as raw bits in an `AtomicU64`. Every write overwrites, and the
/// window reset never touches it.
#[derive(Debug, Default)]
pub struct InvocationGauge {
    millis_bits: AtomicU64,
}

impl InvocationGauge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gauge from an epoch timestamp in seconds.
    pub fn set_epoch_secs(&self, epoch_secs: f64) {
        self.millis_bits
            .store((epoch_secs * 1000.0).to_bits(), Ordering::Relaxed);
    }

    /// Last invocation time in epoch milliseconds (`0.0` if never set).
    pub fn millis(&self) -> f64 {
        f64::from_bits(self.millis_bits.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_reads_zero() {
        assert_eq!(InvocationGauge::new().millis(), 0.0);
    }

    #[test]
    fn converts_seconds_to_millis() {
        let gauge = InvocationGauge::new();
        gauge.set_epoch_secs(1000.0);
        assert_eq!(gauge.millis(), 1_000_000.0);
    }

    #[test]
    fn smaller_value_still_overwrites() {
        let gauge = InvocationGauge::new();
        gauge.set_epoch_secs(1000.0);
        gauge.set_epoch_secs(2.5);
        assert_eq!(gauge.millis(), 2500.0);
    }
}
