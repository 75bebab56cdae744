//! fnstats — per-instance runtime metrics for a stream-processing worker.
//!
//! Tracks messages received, processed, and failed (user vs. system), the
//! mean processing latency, and the last invocation time. Every count exists
//! twice: a lifetime view and a trailing 1-minute window that a background
//! task resets. The most recent failure traces are kept in bounded logs.
//!
//! # Architecture
//!
//! ```text
//! FunctionStats (one per worker instance, keyed by MetricIdentity)
//!   ├── WindowedCounter × 4   ← record_received / record_success / record_*_exception
//!   ├── WindowedLatency       ← begin_processing / end_processing
//!   ├── InvocationGauge       ← set_last_invocation
//!   ├── ExceptionLog × 2      ← record_user_exception / record_system_exception
//!   ├── WindowReset           → reset_window() every interval (default 60s)
//!   └── snapshot() → StatsSnapshot → render_prometheus()
//! ```

pub mod config;
pub mod counter;
pub mod error;
pub mod exception_log;
pub mod gauge;
pub mod identity;
pub mod latency;
pub mod prometheus;
pub mod reset;
pub mod snapshot;
pub mod stats;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use config::{MAX_WINDOW_INTERVAL, StatsConfig};
pub use counter::WindowedCounter;
pub use error::{StatsError, StatsResult};
pub use exception_log::{ExceptionEntry, ExceptionLog};
pub use gauge::InvocationGauge;
pub use identity::MetricIdentity;
pub use latency::{LatencySummary, WindowedLatency};
pub use prometheus::render_prometheus;
pub use reset::WindowReset;
pub use snapshot::StatsSnapshot;
pub use stats::FunctionStats;

/// Lock a mutex, recovering the data if a previous holder panicked.
/// Recording must keep working after a poisoned lock.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
