//! Bounded log of recent failure traces.
//!
//! [`ExceptionLog`] keeps the most recent failures, oldest first. When full,
//! appending drops the oldest entry. The log is for diagnostics only; the
//! exception *counts* live in [`WindowedCounter`](crate::WindowedCounter).

use std::collections::VecDeque;
use std::error::Error;
use std::fmt::Write as _;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_EXCEPTION_LOG_CAPACITY;
use crate::lock;

/// One recorded failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionEntry {
    /// Formatted error and its cause chain.
    pub trace: String,
    /// When the failure was recorded, epoch milliseconds.
    pub epoch_millis: u64,
}

/// Fixed-capacity FIFO of [`ExceptionEntry`] values.
///
/// Appends and clears are serialized by an internal mutex, so a concurrent
/// append is either fully visible after a clear or fully discarded by it.
#[derive(Debug)]
pub struct ExceptionLog {
    entries: Mutex<VecDeque<ExceptionEntry>>,
    capacity: usize,
}

impl ExceptionLog {
    /// Create an empty log with the default capacity (10).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EXCEPTION_LOG_CAPACITY)
    }

    /// Create an empty log holding at most `capacity` entries (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest if the log is full.
    pub fn append(&self, entry: ExceptionEntry) {
        let mut entries = lock(&self.entries);
        if entries.len() >= self.capacity {
            let evicted = entries.pop_front();
            tracing::debug!(
                evicted_at = evicted.map(|e| e.epoch_millis),
                capacity = self.capacity,
                "exception log full, dropped oldest entry"
            );
        }
        entries.push_back(entry);
    }

    /// Remove every entry.
    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    /// Copy of the current entries, oldest first.
    pub fn entries(&self) -> Vec<ExceptionEntry> {
        lock(&self.entries).iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ExceptionLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Format an error and its `source()` chain.
///
/// ```text
/// connection reset
///
/// Caused by:
///     0: broken pipe
///     1: os error 32
/// ```
///
/// Returns `None` if any `Display` impl in the chain reports a formatting
/// error.
pub fn format_trace(err: &dyn Error) -> Option<String> {
    let mut trace = String::new();
    write!(trace, "{err}").ok()?;

    let mut source = err.source();
    if source.is_some() {
        trace.push_str("\n\nCaused by:");
    }
    let mut depth = 0;
    while let Some(cause) = source {
        write!(trace, "\n    {depth}: {cause}").ok()?;
        depth += 1;
        source = cause.source();
    }
    Some(trace)
}
