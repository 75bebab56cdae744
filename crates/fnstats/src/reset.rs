//! Periodic window reset: a background task that fires an action once per
//! fixed period until stopped.
//!
//! The first firing happens one full period after [`WindowReset::spawn`],
//! not immediately. A panicking action is caught and logged; the next
//! period fires on schedule.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::error::{StatsError, StatsResult};
use crate::lock;

/// Handle to a running reset task. Dropping the handle stops the task.
pub struct WindowReset {
    period: Duration,
    /// Completed (non-panicking) firings.
    fired: Arc<AtomicU64>,
    shutdown_tx: watch::Sender<bool>,
    /// `None` once stopped.
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl WindowReset {
    /// Spawn the reset loop on the current Tokio runtime.
    ///
    /// Fails with [`StatsError::NoRuntime`] when called outside a runtime,
    /// and with [`StatsError::InvalidConfig`] for a zero period or one whose
    /// first deadline does not fit in an `Instant`.
    pub fn spawn<F>(period: Duration, action: F) -> StatsResult<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| StatsError::NoRuntime)?;
        if period.is_zero() {
            return Err(StatsError::InvalidConfig(
                "reset period must be greater than zero".to_string(),
            ));
        }
        let first = Instant::now().checked_add(period).ok_or_else(|| {
            StatsError::InvalidConfig(format!("reset period {period:?} is out of range"))
        })?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let fired = Arc::new(AtomicU64::new(0));

        let handle = runtime.spawn(run_reset_loop(
            first,
            period,
            action,
            fired.clone(),
            shutdown_rx,
        ));

        Ok(Self {
            period,
            fired,
            shutdown_tx,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Stop the loop. Safe to call more than once.
    pub fn stop(&self) {
        if let Some(handle) = lock(&self.handle).take() {
            let _ = self.shutdown_tx.send(true);
            handle.abort();
            info!(period_ms = self.period.as_millis() as u64, "window reset stopped");
        }
    }

    /// Whether the loop is still scheduled.
    pub fn is_running(&self) -> bool {
        lock(&self.handle)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Number of firings that completed without panicking.
    pub fn fired(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }

    /// Time between firings.
    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Drop for WindowReset {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_reset_loop<F>(
    first: Instant,
    period: Duration,
    action: F,
    fired: Arc<AtomicU64>,
    mut shutdown: watch::Receiver<bool>,
) where
    F: Fn() + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval_at(first, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!(period_ms = period.as_millis() as u64, "window reset loop starting");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match panic::catch_unwind(AssertUnwindSafe(&action)) {
                    Ok(()) => {
                        fired.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(cause) => {
                        let cause = cause
                            .downcast_ref::<&str>()
                            .map(|s| s.to_string())
                            .or_else(|| cause.downcast_ref::<String>().cloned())
                            .unwrap_or_else(|| "unknown panic".to_string());
                        error!(%cause, "window reset panicked, next cycle stays scheduled");
                    }
                }
            }
            _ = shutdown.changed() => {
                debug!("window reset loop shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    fn counting_action() -> (Arc<AtomicU64>, impl Fn() + Send + Sync + 'static) {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();
        (calls, move || {
            counter.fetch_add(1, Ordering::Relaxed);
        })
    }

    #[test]
    fn spawn_outside_runtime_fails() {
        let (_, action) = counting_action();
        let err = WindowReset::spawn(MINUTE, action).err().unwrap();
        assert!(matches!(err, StatsError::NoRuntime));
    }

    #[tokio::test]
    async fn out_of_range_period_rejected() {
        let (calls, action) = counting_action();
        let err = WindowReset::spawn(Duration::MAX, action).err().unwrap();
        assert!(matches!(err, StatsError::InvalidConfig(_)));
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn zero_period_rejected() {
        let (_, action) = counting_action();
        let err = WindowReset::spawn(Duration::ZERO, action).err().unwrap();
        assert!(matches!(err, StatsError::InvalidConfig(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn first_fire_after_one_period() {
        let (calls, action) = counting_action();
        let reset = WindowReset::spawn(MINUTE, action).unwrap();
        assert_eq!(reset.period(), MINUTE);

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(calls.load(Ordering::Relaxed), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(reset.fired(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fires_every_period() {
        let (calls, action) = counting_action();
        let reset = WindowReset::spawn(MINUTE, action).unwrap();

        tokio::time::sleep(Duration::from_secs(60 * 5 + 1)).await;
        assert_eq!(calls.load(Ordering::Relaxed), 5);
        assert_eq!(reset.fired(), 5);
        assert!(reset.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_action_keeps_firing() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();
        let reset = WindowReset::spawn(MINUTE, move || {
            if counter.fetch_add(1, Ordering::Relaxed) == 0 {
                panic!("first reset blows up");
            }
        })
        .unwrap();

        tokio::time::sleep(Duration::from_secs(60 * 3 + 1)).await;
        assert_eq!(calls.load(Ordering::Relaxed), 3);
        assert_eq!(reset.fired(), 2);
        assert!(reset.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_further_firings() {
        let (calls, action) = counting_action();
        let reset = WindowReset::spawn(MINUTE, action).unwrap();

        tokio::time::sleep(Duration::from_secs(61)).await;
        reset.stop();
        reset.stop();
        assert!(!reset.is_running());

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_loop() {
        let (calls, action) = counting_action();
        let reset = WindowReset::spawn(MINUTE, action).unwrap();
        drop(reset);

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }
}
