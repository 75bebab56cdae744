use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use fnstats::{
    ExceptionEntry, FunctionStats, MetricIdentity, StatsConfig, StatsSnapshot, render_prometheus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Prometheus,
    Json,
}

#[derive(Debug, Clone)]
pub struct SimulateOptions {
    pub identity: MetricIdentity,
    pub messages: u64,
    pub user_failure_every: u64,
    pub system_failure_every: u64,
    pub work_ms: u64,
    pub config: Option<PathBuf>,
}

/// Failures the simulated worker can produce.
#[derive(Debug, Error, PartialEq, Eq)]
enum ProcessError {
    #[error("user function failed on message {0}")]
    User(u64),
    #[error("failed to acknowledge message {0}")]
    System(u64),
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub snapshot: StatsSnapshot,
    pub latest_user_exceptions: Vec<ExceptionEntry>,
    pub latest_system_exceptions: Vec<ExceptionEntry>,
}

pub async fn simulate(opts: SimulateOptions, format: OutputFormat) -> anyhow::Result<()> {
    let config = match &opts.config {
        Some(path) => StatsConfig::from_file(path)?,
        None => StatsConfig::default(),
    };

    let report = run(&opts, &config).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Prometheus => {
            print!("{}", render_prometheus(&config.metrics_prefix, &[report.snapshot]))
        }
    }
    Ok(())
}

/// Drive `opts.messages` messages through a fresh stats instance.
pub async fn run(opts: &SimulateOptions, config: &StatsConfig) -> anyhow::Result<SimulationReport> {
    let stats = FunctionStats::start(opts.identity.clone(), config)?;
    let work = Duration::from_millis(opts.work_ms);

    for seq in 1..=opts.messages {
        stats.record_received();
        stats.set_last_invocation(epoch_secs());
        stats.begin_processing();
        if !work.is_zero() {
            tokio::time::sleep(work).await;
        }
        let outcome = process(seq, opts.user_failure_every, opts.system_failure_every);
        stats.end_processing();

        match outcome {
            Ok(()) => stats.record_success(),
            Err(e @ ProcessError::User(_)) => stats.record_user_exception(&e),
            Err(e @ ProcessError::System(_)) => stats.record_system_exception(&e),
        }
    }

    info!(
        function = %opts.identity,
        received = stats.total_received(),
        succeeded = stats.total_processed_successfully(),
        window_resets = stats.window_resets(),
        "simulation finished"
    );

    let report = SimulationReport {
        snapshot: stats.snapshot(),
        latest_user_exceptions: stats.latest_user_exceptions(),
        latest_system_exceptions: stats.latest_system_exceptions(),
    };
    stats.shutdown();
    Ok(report)
}

/// System failures win when both schedules hit the same message.
fn process(seq: u64, user_every: u64, system_every: u64) -> Result<(), ProcessError> {
    if system_every > 0 && seq % system_every == 0 {
        Err(ProcessError::System(seq))
    } else if user_every > 0 && seq % user_every == 0 {
        Err(ProcessError::User(seq))
    } else {
        Ok(())
    }
}

fn epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(messages: u64, user_every: u64, system_every: u64, work_ms: u64) -> SimulateOptions {
        SimulateOptions {
            identity: MetricIdentity::new("public", "default", "echo", "0", "standalone"),
            messages,
            user_failure_every: user_every,
            system_failure_every: system_every,
            work_ms,
            config: None,
        }
    }

    #[test]
    fn process_schedules() {
        assert_eq!(process(1, 0, 0), Ok(()));
        assert_eq!(process(7, 7, 0), Err(ProcessError::User(7)));
        assert_eq!(process(13, 7, 13), Err(ProcessError::System(13)));
        assert_eq!(process(91, 7, 13), Err(ProcessError::System(91)));
        assert_eq!(process(8, 7, 13), Ok(()));
    }

    #[tokio::test]
    async fn run_counts_outcomes() {
        let report = run(&opts(20, 5, 10, 0), &StatsConfig::default()).await.unwrap();
        let snap = &report.snapshot;

        assert_eq!(snap.received_total, 20);
        // 5, 15 are user failures; 10, 20 are system failures.
        assert_eq!(snap.user_exceptions_total, 2);
        assert_eq!(snap.system_exceptions_total, 2);
        assert_eq!(snap.processed_successfully_total, 16);
        assert_eq!(snap.process_latency_ms.count, 20);
        assert!(snap.last_invocation > 0.0);

        assert_eq!(report.latest_user_exceptions.len(), 2);
        assert_eq!(
            report.latest_system_exceptions[1].trace,
            "failed to acknowledge message 20"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn long_run_crosses_window_boundary() {
        // 100 messages at 1s each spans one 60s reset.
        let report = run(&opts(100, 0, 0, 1000), &StatsConfig::default()).await.unwrap();
        let snap = &report.snapshot;

        assert_eq!(snap.received_total, 100);
        assert!(snap.received_total_1min < 100);
        assert!(snap.process_latency_ms_1min.count < snap.process_latency_ms.count);
    }

    #[tokio::test]
    async fn json_report_serializes() {
        let report = run(&opts(3, 0, 3, 0), &StatsConfig::default()).await.unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["snapshot"]["received_total"], 3);
        assert!(json["snapshot"]["process_latency_mean_ms"].is_number());
        assert!(json["snapshot"]["process_latency_mean_ms_1min"].is_number());
        assert_eq!(json["latest_system_exceptions"].as_array().unwrap().len(), 1);
    }
}
