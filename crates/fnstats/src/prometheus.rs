//! Prometheus text exposition format.
//!
//! Renders stats snapshots into the Prometheus text exposition format. How
//! the text reaches a scraper is up to the caller.

use std::fmt::Write as _;

use crate::identity::{LABEL_NAMES, MetricIdentity};
use crate::latency::LatencySummary;
use crate::snapshot::*;

/// Render snapshots into Prometheus text format, every metric name
/// prefixed with `prefix`.
///
/// Counters and their `_1min` siblings are exported as `counter`, latency as
/// `summary` (`_sum` and `_count` samples), last invocation as `gauge`.
pub fn render_prometheus(prefix: &str, snapshots: &[StatsSnapshot]) -> String {
    let mut out = String::new();

    let counters: [(&str, &str, fn(&StatsSnapshot) -> (u64, u64)); 4] = [
        (
            RECEIVED_TOTAL,
            "Total number of messages received from source",
            |s| (s.received_total, s.received_total_1min),
        ),
        (
            PROCESSED_SUCCESSFULLY_TOTAL,
            "Total number of messages processed successfully",
            |s| (s.processed_successfully_total, s.processed_successfully_total_1min),
        ),
        (
            SYSTEM_EXCEPTIONS_TOTAL,
            "Total number of system exceptions",
            |s| (s.system_exceptions_total, s.system_exceptions_total_1min),
        ),
        (
            USER_EXCEPTIONS_TOTAL,
            "Total number of user exceptions",
            |s| (s.user_exceptions_total, s.user_exceptions_total_1min),
        ),
    ];

    for (name, help, values) in counters {
        let lifetime = format!("{prefix}{name}");
        header(&mut out, &lifetime, &format!("{help}."), "counter");
        for s in snapshots {
            sample(&mut out, &lifetime, &s.identity, values(s).0);
        }

        let windowed = format!("{prefix}{name}{WINDOW_SUFFIX}");
        header(&mut out, &windowed, &format!("{help} in the last 1 minute."), "counter");
        for s in snapshots {
            sample(&mut out, &windowed, &s.identity, values(s).1);
        }
    }

    let latency = format!("{prefix}{PROCESS_LATENCY_MS}");
    header(&mut out, &latency, "Process latency in milliseconds.", "summary");
    for s in snapshots {
        summary(&mut out, &latency, &s.identity, &s.process_latency_ms);
    }

    let latency_1min = format!("{prefix}{PROCESS_LATENCY_MS}{WINDOW_SUFFIX}");
    header(
        &mut out,
        &latency_1min,
        "Process latency in milliseconds in the last 1 minute.",
        "summary",
    );
    for s in snapshots {
        summary(&mut out, &latency_1min, &s.identity, &s.process_latency_ms_1min);
    }

    let last = format!("{prefix}{LAST_INVOCATION}");
    header(
        &mut out,
        &last,
        "The timestamp of the last invocation of the function.",
        "gauge",
    );
    for s in snapshots {
        sample(&mut out, &last, &s.identity, s.last_invocation);
    }

    out
}

fn header(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} {kind}");
}

fn sample(out: &mut String, name: &str, identity: &MetricIdentity, value: impl std::fmt::Display) {
    let _ = writeln!(out, "{name}{{{}}} {value}", labels(identity));
}

fn summary(out: &mut String, name: &str, identity: &MetricIdentity, latency: &LatencySummary) {
    sample(out, &format!("{name}_sum"), identity, latency.sum_ms);
    sample(out, &format!("{name}_count"), identity, latency.count);
}

fn labels(identity: &MetricIdentity) -> String {
    LABEL_NAMES
        .iter()
        .zip(identity.label_values())
        .map(|(name, value)| format!("{name}=\"{}\"", escape_label(value)))
        .collect::<Vec<_>>()
        .join(",")
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
