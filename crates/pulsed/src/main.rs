//! pulsed — the PulseGrid daemon.
//!
//! Single binary that assembles the PulseGrid subsystems:
//! - Health-check log (redb)
//! - Prober (periodic HTTP health check of the monitored service)
//! - REST API + Prometheus exposition
//!
//! # Usage
//!
//! ```text
//! pulsed serve --config pulse.toml --target payments.internal:8080
//! pulsed stats --since 1700000000000 --data-dir /var/lib/pulsegrid
//! pulsed recent --data-dir /var/lib/pulsegrid
//! pulsed init payments.internal:8080 > pulse.toml
//! ```

mod serve;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use pulse_core::PulseConfig;
use pulse_health::{Aggregator, HealthLog};
use pulse_state::StateStore;

const DB_FILE: &str = "pulsegrid.redb";

#[derive(Parser)]
#[command(name = "pulsed", about = "PulseGrid health-check daemon")]
struct Cli {
    /// Path to pulse.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory for the health-check log (overrides config).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the prober and the API server.
    Serve {
        /// Port to listen on (overrides config).
        #[arg(long)]
        port: Option<u16>,

        /// `host:port` of the service to probe (overrides config).
        #[arg(long)]
        target: Option<String>,
    },
    /// Print uptime stats for every check at or after `since`.
    Stats {
        /// Window start, epoch milliseconds.
        #[arg(long, allow_hyphen_values = true)]
        since: i64,
    },
    /// Print the most recent checks, newest insert first.
    Recent,
    /// Print a starter pulse.toml probing `target`.
    Init {
        /// `host:port` of the service to probe.
        target: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing. Logs go to stderr so `stats`/`recent` output stays pipeable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,pulsed=debug,pulse=debug")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PulseConfig::from_file(path)?,
        None => PulseConfig::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.server.get_or_insert_with(Default::default).data_dir = Some(dir);
    }

    match cli.command {
        Command::Serve { port, target } => {
            if let Some(port) = port {
                config.server.get_or_insert_with(Default::default).port = Some(port);
            }
            if let Some(target) = target {
                config.probe.get_or_insert_with(Default::default).target = Some(target);
            }
            serve::run_serve(config).await
        }
        Command::Stats { since } => {
            let stats = open_aggregator(&config)?.uptime_stats(since)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        Command::Recent => {
            let recent = open_aggregator(&config)?.recent()?;
            println!("{}", serde_json::to_string_pretty(&recent)?);
            Ok(())
        }
        Command::Init { target } => {
            print!("{}", PulseConfig::scaffold(&target).to_toml_string()?);
            Ok(())
        }
    }
}

/// Read-only subcommands never create a log; a wrong `--data-dir` is an error.
fn open_aggregator(config: &PulseConfig) -> anyhow::Result<Aggregator> {
    let db_path = config.data_dir().join(DB_FILE);
    let log: Arc<dyn HealthLog> = Arc::new(StateStore::open_existing(&db_path)?);
    Ok(Aggregator::new(log))
}
