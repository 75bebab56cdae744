//! Point-in-time copy of a [`FunctionStats`](crate::FunctionStats) instance,
//! and the canonical metric names it is exported under.

use serde::{Deserialize, Serialize};

use crate::identity::MetricIdentity;
use crate::latency::LatencySummary;

pub const RECEIVED_TOTAL: &str = "received_total";
pub const PROCESSED_SUCCESSFULLY_TOTAL: &str = "processed_successfully_total";
pub const SYSTEM_EXCEPTIONS_TOTAL: &str = "system_exceptions_total";
pub const USER_EXCEPTIONS_TOTAL: &str = "user_exceptions_total";
pub const PROCESS_LATENCY_MS: &str = "process_latency_ms";
pub const LAST_INVOCATION: &str = "last_invocation";

/// Suffix of the windowed sibling of each metric.
pub const WINDOW_SUFFIX: &str = "_1min";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub identity: MetricIdentity,
    pub received_total: u64,
    pub received_total_1min: u64,
    pub processed_successfully_total: u64,
    pub processed_successfully_total_1min: u64,
    pub system_exceptions_total: u64,
    pub system_exceptions_total_1min: u64,
    pub user_exceptions_total: u64,
    pub user_exceptions_total_1min: u64,
    pub process_latency_ms: LatencySummary,
    /// Lifetime mean in ms, 0.0 before the first observation.
    pub process_latency_mean_ms: f64,
    pub process_latency_ms_1min: LatencySummary,
    pub process_latency_mean_ms_1min: f64,
    /// Epoch milliseconds.
    pub last_invocation: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_uses_canonical_field_names() {
        let snap = StatsSnapshot {
            identity: MetricIdentity::new("public", "default", "echo", "0", "standalone"),
            received_total: 3,
            received_total_1min: 1,
            processed_successfully_total: 2,
            processed_successfully_total_1min: 1,
            system_exceptions_total: 1,
            system_exceptions_total_1min: 0,
            user_exceptions_total: 0,
            user_exceptions_total_1min: 0,
            process_latency_ms: LatencySummary {
                sum_ms: 30.0,
                count: 3,
            },
            process_latency_mean_ms: 10.0,
            process_latency_ms_1min: LatencySummary::default(),
            process_latency_mean_ms_1min: 0.0,
            last_invocation: 1_000_000.0,
        };

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json[RECEIVED_TOTAL], 3);
        assert_eq!(json[format!("{RECEIVED_TOTAL}{WINDOW_SUFFIX}")], 1);
        assert_eq!(json[PROCESS_LATENCY_MS]["count"], 3);
        assert_eq!(json["process_latency_mean_ms"], 10.0);
        assert_eq!(json["process_latency_mean_ms_1min"], 0.0);
        assert_eq!(json[LAST_INVOCATION], 1_000_000.0);
        assert_eq!(json["identity"]["instance_id"], "0");
    }
}
