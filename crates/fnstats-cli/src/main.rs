//! fnstats — drive a simulated function worker and print its metrics.
//!
//! # Usage
//!
//! ```text
//! fnstats simulate --function echo --messages 500 --user-failure-every 7 --format prometheus
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::simulate::{OutputFormat, SimulateOptions};
use fnstats::MetricIdentity;

mod commands;

#[derive(Parser)]
#[command(
    name = "fnstats",
    about = "Per-instance function metrics collector",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated worker loop against one stats instance and print
    /// the resulting metrics.
    Simulate {
        #[arg(long, default_value = "public")]
        tenant: String,
        #[arg(long, default_value = "default")]
        namespace: String,
        #[arg(long, default_value = "echo")]
        function: String,
        #[arg(long, default_value = "0")]
        instance_id: String,
        #[arg(long, default_value = "standalone")]
        cluster: String,

        /// Number of messages to process.
        #[arg(short, long, default_value = "100")]
        messages: u64,
        /// Fail every Nth message in user code (0 = never).
        #[arg(long, default_value = "0")]
        user_failure_every: u64,
        /// Fail every Nth message in the runtime (0 = never).
        #[arg(long, default_value = "0")]
        system_failure_every: u64,
        /// Simulated processing time per message, in milliseconds.
        #[arg(long, default_value = "0")]
        work_ms: u64,

        /// TOML config for window interval, log capacity and metric prefix.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output format.
        #[arg(short, long, value_enum, default_value = "prometheus")]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fnstats=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            tenant,
            namespace,
            function,
            instance_id,
            cluster,
            messages,
            user_failure_every,
            system_failure_every,
            work_ms,
            config,
            format,
        } => {
            let opts = SimulateOptions {
                identity: MetricIdentity::new(tenant, namespace, function, instance_id, cluster),
                messages,
                user_failure_every,
                system_failure_every,
                work_ms,
                config,
            };
            commands::simulate::simulate(opts, format).await
        }
    }
}
