//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod check;
mod submit;

use anyhow::Result;
use clap::Subcommand;
use jobctl_backend::Config;
use std::path::PathBuf;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Check whether the job engine can be used here
    Check,
    /// Submit the jobs of a manifest and wait until all of them terminated
    Submit {
        /// JSON manifest listing the jobs, dependencies first
        manifest: PathBuf,

        /// Print the final job counts as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - Backend configuration
pub async fn handle_command(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Check => check::handle_check(&config),
        Commands::Submit { manifest, json } => {
            submit::handle_submit(&manifest, json, config).await
        }
    }
}
