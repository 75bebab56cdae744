//! Per-instance function stats, the facade a worker calls on its hot path.
//!
//! Every recording method is infallible and returns immediately. Readers
//! may call any accessor at any time without coordinating with writers.

use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::StatsConfig;
use crate::counter::WindowedCounter;
use crate::error::StatsResult;
use crate::exception_log::{ExceptionEntry, ExceptionLog, format_trace};
use crate::gauge::InvocationGauge;
use crate::identity::MetricIdentity;
use crate::latency::WindowedLatency;
use crate::lock;
use crate::reset::WindowReset;
use crate::snapshot::StatsSnapshot;

/// Metric state shared between the hot path and the reset task.
#[derive(Debug)]
struct StatsState {
    received: WindowedCounter,
    processed_successfully: WindowedCounter,
    system_exceptions: WindowedCounter,
    user_exceptions: WindowedCounter,
    process_latency: WindowedLatency,
    last_invocation: InvocationGauge,
    latest_user_exceptions: ExceptionLog,
    latest_system_exceptions: ExceptionLog,
}

impl StatsState {
    fn new(exception_log_capacity: usize) -> Self {
        Self {
            received: WindowedCounter::new(),
            processed_successfully: WindowedCounter::new(),
            system_exceptions: WindowedCounter::new(),
            user_exceptions: WindowedCounter::new(),
            process_latency: WindowedLatency::new(),
            last_invocation: InvocationGauge::new(),
            latest_user_exceptions: ExceptionLog::with_capacity(exception_log_capacity),
            latest_system_exceptions: ExceptionLog::with_capacity(exception_log_capacity),
        }
    }

    /// Zero every windowed metric and empty both exception logs.
    fn reset_window(&self) {
        let received = self.received.reset_window();
        let processed = self.processed_successfully.reset_window();
        let system = self.system_exceptions.reset_window();
        let user = self.user_exceptions.reset_window();
        self.process_latency.reset_window();
        self.latest_user_exceptions.clear();
        self.latest_system_exceptions.clear();

        debug!(
            received,
            processed,
            system_exceptions = system,
            user_exceptions = user,
            "windowed metrics reset"
        );
    }
}

/// Lifetime and 1-minute windowed metrics for one function instance.
///
/// Owns a background [`WindowReset`] that clears the windowed half of the
/// state once per configured interval. The task stops on [`shutdown`] or
/// when the facade is dropped.
///
/// [`shutdown`]: FunctionStats::shutdown
pub struct FunctionStats {
    identity: MetricIdentity,
    state: Arc<StatsState>,
    /// Start of the in-flight processing measurement, if any.
    processing_started: Mutex<Option<Instant>>,
    reset: WindowReset,
}

impl FunctionStats {
    /// Create the stats for `identity` and start its window reset task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(identity: MetricIdentity, config: &StatsConfig) -> StatsResult<Self> {
        config.validate()?;
        let interval = config.window_interval()?;

        let state = Arc::new(StatsState::new(config.exception_log_capacity));
        let reset_state = state.clone();
        let reset = WindowReset::spawn(interval, move || reset_state.reset_window())?;

        info!(
            tenant = %identity.tenant,
            namespace = %identity.namespace,
            function = %identity.function,
            instance_id = %identity.instance_id,
            cluster = %identity.cluster,
            interval_secs = reset.period().as_secs_f64(),
            "function stats started"
        );

        Ok(Self {
            identity,
            state,
            processing_started: Mutex::new(None),
            reset,
        })
    }

    pub fn identity(&self) -> &MetricIdentity {
        &self.identity
    }

    // ── Recording ──────────────────────────────────────────────────

    /// A message arrived from the source.
    pub fn record_received(&self) {
        self.state.received.incr();
    }

    /// A message was processed successfully.
    pub fn record_success(&self) {
        self.state.processed_successfully.incr();
    }

    /// Processing failed inside the runtime rather than in user code.
    pub fn record_system_exception(&self, failure: &dyn Error) {
        self.state.system_exceptions.incr();
        append_trace(&self.state.latest_system_exceptions, failure);
    }

    /// The user's function returned an error.
    pub fn record_user_exception(&self, failure: &dyn Error) {
        self.state.user_exceptions.incr();
        append_trace(&self.state.latest_user_exceptions, failure);
    }

    /// Start measuring one unit of processing. Replaces any unfinished start.
    pub fn begin_processing(&self) {
        *lock(&self.processing_started) = Some(Instant::now());
    }

    /// Finish the measurement begun by [`begin_processing`] and record the
    /// elapsed time. Without a pending start this does nothing.
    ///
    /// [`begin_processing`]: FunctionStats::begin_processing
    pub fn end_processing(&self) {
        let Some(started) = lock(&self.processing_started).take() else {
            return;
        };
        let elapsed = Instant::now().saturating_duration_since(started);
        self.state.process_latency.observe(duration_ms(elapsed));
    }

    /// Record an externally measured processing time, in milliseconds.
    pub fn record_latency_ms(&self, ms: f64) {
        self.state.process_latency.observe(ms);
    }

    /// Set the last-invocation gauge from an epoch timestamp in seconds.
    pub fn set_last_invocation(&self, epoch_secs: f64) {
        self.state.last_invocation.set_epoch_secs(epoch_secs);
    }

    // ── Window lifecycle ───────────────────────────────────────────

    /// Run the window reset immediately, outside the regular schedule.
    pub fn reset_window(&self) {
        self.state.reset_window();
    }

    /// Number of scheduled window resets completed so far.
    pub fn window_resets(&self) -> u64 {
        self.reset.fired()
    }

    /// Stop the window reset task. Recording keeps working; the windowed
    /// metrics simply stop being cleared.
    pub fn shutdown(&self) {
        self.reset.stop();
    }

    pub fn is_running(&self) -> bool {
        self.reset.is_running()
    }

    /// Length of one window.
    pub fn window_interval(&self) -> Duration {
        self.reset.period()
    }

    // ── Reads ──────────────────────────────────────────────────────

    pub fn total_received(&self) -> u64 {
        self.state.received.lifetime()
    }

    pub fn total_received_1min(&self) -> u64 {
        self.state.received.windowed()
    }

    pub fn total_processed_successfully(&self) -> u64 {
        self.state.processed_successfully.lifetime()
    }

    pub fn total_processed_successfully_1min(&self) -> u64 {
        self.state.processed_successfully.windowed()
    }

    pub fn total_system_exceptions(&self) -> u64 {
        self.state.system_exceptions.lifetime()
    }

    pub fn total_system_exceptions_1min(&self) -> u64 {
        self.state.system_exceptions.windowed()
    }

    pub fn total_user_exceptions(&self) -> u64 {
        self.state.user_exceptions.lifetime()
    }

    pub fn total_user_exceptions_1min(&self) -> u64 {
        self.state.user_exceptions.windowed()
    }

    /// Mean processing latency since start, in ms (`0.0` with no samples).
    pub fn avg_process_latency_ms(&self) -> f64 {
        self.state.process_latency.lifetime().mean()
    }

    /// Mean processing latency in the current window, in ms.
    pub fn avg_process_latency_ms_1min(&self) -> f64 {
        self.state.process_latency.windowed().mean()
    }

    /// Last invocation time, epoch milliseconds.
    pub fn last_invocation(&self) -> f64 {
        self.state.last_invocation.millis()
    }

    /// Recent user-code failures in the current window, oldest first.
    pub fn latest_user_exceptions(&self) -> Vec<ExceptionEntry> {
        self.state.latest_user_exceptions.entries()
    }

    /// Recent system failures in the current window, oldest first.
    pub fn latest_system_exceptions(&self) -> Vec<ExceptionEntry> {
        self.state.latest_system_exceptions.entries()
    }

    /// Point-in-time copy of every numeric metric.
    pub fn snapshot(&self) -> StatsSnapshot {
        let s = &self.state;
        let lifetime_latency = s.process_latency.lifetime();
        let windowed_latency = s.process_latency.windowed();
        StatsSnapshot {
            identity: self.identity.clone(),
            received_total: s.received.lifetime(),
            received_total_1min: s.received.windowed(),
            processed_successfully_total: s.processed_successfully.lifetime(),
            processed_successfully_total_1min: s.processed_successfully.windowed(),
            system_exceptions_total: s.system_exceptions.lifetime(),
            system_exceptions_total_1min: s.system_exceptions.windowed(),
            user_exceptions_total: s.user_exceptions.lifetime(),
            user_exceptions_total_1min: s.user_exceptions.windowed(),
            process_latency_ms: lifetime_latency,
            process_latency_mean_ms: lifetime_latency.mean(),
            process_latency_ms_1min: windowed_latency,
            process_latency_mean_ms_1min: windowed_latency.mean(),
            last_invocation: s.last_invocation.millis(),
        }
    }
}

fn append_trace(log: &ExceptionLog, failure: &dyn Error) {
    match format_trace(failure) {
        Some(trace) => log.append(ExceptionEntry {
            trace,
            epoch_millis: epoch_millis(),
        }),
        None => warn!("failure trace could not be formatted, log entry omitted"),
    }
}

fn duration_ms(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
