//! Check command handler
//!
//! Reports whether the job engine is usable in the current environment.

use anyhow::Result;
use colored::*;
use jobctl_backend::{AmbientEngineFactory, Config, EngineFactory};

/// Print the engine capability and fail when it is missing
pub fn handle_check(config: &Config) -> Result<()> {
    let factory = AmbientEngineFactory::new(config);

    if !factory.usable() {
        println!("{}", "✗ Slurm engine unavailable (sbatch not found)".red());
        anyhow::bail!("job backend is not usable in this environment");
    }

    println!("{}", "✓ Slurm engine available".green());
    println!("  Output directory: {}", config.output_dir.display());
    println!("  Poll interval:    {:?}", config.poll_interval);
    if let Some(partition) = &config.partition {
        println!("  Partition:        {}", partition);
    }
    if let Some(account) = &config.account {
        println!("  Account:          {}", account);
    }

    Ok(())
}
