//! jobctl CLI
//!
//! Command-line interface for submitting build jobs to a cluster workflow engine.

mod commands;
mod manifest;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use jobctl_backend::Config;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Log filter used when `RUST_LOG` is not set; status lines log under `jobctl_backend`
const DEFAULT_LOG_FILTER: &str = "jobctl=info,jobctl_backend=info";

#[derive(Parser)]
#[command(name = "jobctl")]
#[command(about = "Submit build jobs to a cluster workflow engine", long_about = None)]
struct Cli {
    /// Directory collecting the output of every job
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Seconds to wait between two polls of the engine
    #[arg(long, global = true)]
    poll_interval: Option<u64>,

    /// Do not echo status lines to the console
    #[arg(long, global = true)]
    silent: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Status lines go to stdout, diagnostics to stderr
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    handle_command(cli.command, config).await
}

/// Loads configuration from the environment, then applies command-line overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env()?;

    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(secs) = cli.poll_interval {
        config.poll_interval = Duration::from_secs(secs);
    }
    config.silent |= cli.silent;

    config.validate()?;
    Ok(config)
}
