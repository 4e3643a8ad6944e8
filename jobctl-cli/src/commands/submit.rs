//! Submit command handler
//!
//! Queues the jobs of a manifest on the backend, waits for all of them to
//! terminate and prints the final counts.

use anyhow::{Context, Result};
use colored::*;
use jobctl_backend::{AmbientEngineFactory, Config, ConsoleReporter, EngineBackend, JobBackend};
use jobctl_core::domain::job::JobHandle;
use jobctl_core::domain::stats::JobStats;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::manifest::{self, ManifestEntry};

/// Submit every job of `manifest_path` and wait for completion
pub async fn handle_submit(manifest_path: &Path, json: bool, config: Config) -> Result<()> {
    let entries = manifest::load(manifest_path)?;
    info!(
        "Loaded {} job(s) from {}",
        entries.len(),
        manifest_path.display()
    );

    let factory = Arc::new(AmbientEngineFactory::new(&config));
    let mut backend = EngineBackend::init(config, factory, Arc::new(ConsoleReporter))
        .context("Failed to initialise job backend")?;

    queue_entries(&mut backend, &entries)?;

    let stats = backend.complete().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_summary(&stats);
    }

    if stats.failed() > 0 {
        anyhow::bail!("{} of {} job(s) failed", stats.failed(), stats.total());
    }

    Ok(())
}

/// Builds and queues a job per manifest entry, in manifest order
///
/// Returns the handles by job name.
pub fn queue_entries<B: JobBackend>(
    backend: &mut B,
    entries: &[ManifestEntry],
) -> Result<HashMap<String, JobHandle>> {
    let mut handles: HashMap<String, JobHandle> = HashMap::new();

    for entry in entries {
        let job = backend.make_job(&entry.request)?;

        let dependencies = entry
            .depends_on
            .iter()
            .map(|name| {
                handles
                    .get(name)
                    .with_context(|| format!("job '{}' depends on unknown job '{}'", job.name, name))
            })
            .collect::<Result<Vec<_>>>()?;

        backend.queue(&job, &dependencies)?;
        handles.insert(job.name.clone(), job);
    }

    Ok(handles)
}

/// Print the final job counts
fn print_summary(stats: &JobStats) {
    println!();
    println!("{}", "All jobs terminated".bold());
    println!("  Total:  {}", stats.total());
    println!("  Ok:     {}", stats.ok().to_string().green());
    if stats.failed() > 0 {
        println!("  Failed: {}", stats.failed().to_string().red());
    } else {
        println!("  Failed: {}", stats.failed().to_string().dimmed());
    }
}
