//! Job manifest
//!
//! A manifest is a JSON array of jobs, each a job request plus the names of
//! the jobs it depends on:
//!
//! ```json
//! [
//!   { "name": "zlib", "script": "eb zlib.eb", "hours": 1 },
//!   { "name": "gcc", "script": "eb gcc.eb", "cores": 8, "depends_on": ["zlib"] }
//! ]
//! ```

use anyhow::{Context, Result};
use jobctl_core::domain::job::JobRequest;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// One manifest entry
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    #[serde(flatten)]
    pub request: JobRequest,

    /// Names of jobs defined earlier in the manifest
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// Reads and checks a manifest file
pub fn load(path: &Path) -> Result<Vec<ManifestEntry>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    parse(&raw).with_context(|| format!("Invalid manifest {}", path.display()))
}

/// Parses a manifest and checks that every dependency is defined before use
pub fn parse(raw: &str) -> Result<Vec<ManifestEntry>> {
    let entries: Vec<ManifestEntry> =
        serde_json::from_str(raw).context("Failed to parse manifest JSON")?;

    let mut seen = HashSet::new();
    for entry in &entries {
        for dependency in &entry.depends_on {
            if !seen.contains(dependency.as_str()) {
                anyhow::bail!(
                    "job '{}' depends on '{}', which is not defined earlier in the manifest",
                    entry.request.name,
                    dependency
                );
            }
        }
        if !seen.insert(entry.request.name.as_str()) {
            anyhow::bail!("job '{}' is defined twice", entry.request.name);
        }
    }

    Ok(entries)
}
