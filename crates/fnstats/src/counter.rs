//! Lifetime counter paired with a resettable trailing-window twin.
//!
//! Both halves are plain atomics. An increment touches the lifetime half
//! first, then the windowed half; a concurrent reset landing between the two
//! attributes that event to the next window. The lifetime half is never
//! written by a reset, so it cannot lose an increment.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct WindowedCounter {
    lifetime: AtomicU64,
    windowed: AtomicU64,
}

impl WindowedCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one event in both the lifetime and windowed halves.
    pub fn incr(&self) {
        self.lifetime.fetch_add(1, Ordering::Relaxed);
        self.windowed.fetch_add(1, Ordering::Relaxed);
    }

    /// Total since process start.
    pub fn lifetime(&self) -> u64 {
        self.lifetime.load(Ordering::Relaxed)
    }

    /// Total since the last window reset.
    pub fn windowed(&self) -> u64 {
        self.windowed.load(Ordering::Relaxed)
    }

    /// Zero the windowed half, returning the count it held.
    pub fn reset_window(&self) -> u64 {
        self.windowed.swap(0, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let counter = WindowedCounter::new();
        assert_eq!(counter.lifetime(), 0);
        assert_eq!(counter.windowed(), 0);
    }

    #[test]
    fn incr_moves_both_halves() {
        let counter = WindowedCounter::new();
        for _ in 0..7 {
            counter.incr();
        }
        assert_eq!(counter.lifetime(), 7);
        assert_eq!(counter.windowed(), 7);
    }

    #[test]
    fn reset_only_clears_window() {
        let counter = WindowedCounter::new();
        counter.incr();
        counter.incr();

        assert_eq!(counter.reset_window(), 2);
        assert_eq!(counter.windowed(), 0);
        assert_eq!(counter.lifetime(), 2);

        counter.incr();
        assert_eq!(counter.windowed(), 1);
        assert_eq!(counter.lifetime(), 3);
    }

    #[test]
    fn reset_of_empty_window_is_zero() {
        let counter = WindowedCounter::new();
        assert_eq!(counter.reset_window(), 0);
    }
}
