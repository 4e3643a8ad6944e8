//! Job domain types
//!
//! A [`JobRequest`] is what a host asks for: a script, a name and optional
//! resource hints. A [`JobHandle`] is the engine-facing description built
//! from it, ready to be queued.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Shell used to run every job script
pub const JOB_SHELL: &str = "/bin/sh";

/// File (inside the job output directory) receiving merged stdout and stderr
pub const STDOUT_FILE: &str = "stdout.log";

/// Seconds in one hour of requested walltime
const SECS_PER_HOUR: u64 = 3600;

/// Unique identifier of a job handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    /// Generates a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request for one shell-script job
///
/// Optional fields are truly optional: `None` means "use the engine's or the
/// cluster's default", never zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Shell commands to run, passed to `/bin/sh -c`
    pub script: String,

    /// Human-readable job name, also the name of its output directory
    pub name: String,

    /// Extra environment variables for the job's run-time environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<BTreeMap<String, String>>,

    /// Requested walltime in whole hours
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<u32>,

    /// Requested number of cores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cores: Option<u32>,
}

impl JobRequest {
    /// Creates a request with no resource hints
    pub fn new(name: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            name: name.into(),
            environment: None,
            hours: None,
            cores: None,
        }
    }

    /// Adds one environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Requests a walltime of `hours` hours
    pub fn with_hours(mut self, hours: u32) -> Self {
        self.hours = Some(hours);
        self
    }

    /// Requests `cores` cores
    pub fn with_cores(mut self, cores: u32) -> Self {
        self.cores = Some(cores);
        self
    }
}

/// Engine job description built from a [`JobRequest`]
///
/// Handles are compared and hashed by their [`JobId`] only, so two handles
/// built from identical requests are still distinct jobs.
#[derive(Debug, Clone)]
pub struct JobHandle {
    id: JobId,

    /// Name as known to the host
    pub name: String,

    /// Name as known to the engine (same value as `name`)
    pub jobname: String,

    /// Command line: `/bin/sh -c <script>`
    pub arguments: Vec<String>,

    /// Files staged in before the job runs (always empty)
    pub inputs: Vec<PathBuf>,

    /// Files staged out after the job ran (always empty)
    pub outputs: Vec<PathBuf>,

    /// Directory receiving the job's output files
    pub output_dir: PathBuf,

    /// Name of the stdout file inside `output_dir`
    pub stdout: String,

    /// Whether stderr is merged into stdout
    pub join: bool,

    pub environment: Option<BTreeMap<String, String>>,
    pub requested_walltime: Option<Duration>,
    pub requested_cores: Option<u32>,
}

impl JobHandle {
    /// Builds the handle for `request`, with its output under `collection_dir/<name>`
    ///
    /// An empty environment map counts as absent.
    pub fn from_request(request: &JobRequest, collection_dir: &Path) -> Self {
        Self {
            id: JobId::new(),
            name: request.name.clone(),
            jobname: request.name.clone(),
            arguments: vec![
                JOB_SHELL.to_string(),
                "-c".to_string(),
                request.script.clone(),
            ],
            inputs: Vec::new(),
            outputs: Vec::new(),
            output_dir: collection_dir.join(&request.name),
            stdout: STDOUT_FILE.to_string(),
            join: true,
            environment: request.environment.clone().filter(|env| !env.is_empty()),
            requested_walltime: request
                .hours
                .map(|h| Duration::from_secs(u64::from(h) * SECS_PER_HOUR)),
            requested_cores: request.cores,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// The script passed to the shell
    pub fn script(&self) -> &str {
        self.arguments.last().map(String::as_str).unwrap_or_default()
    }

    /// Full path of the merged stdout/stderr log
    pub fn stdout_path(&self) -> PathBuf {
        self.output_dir.join(&self.stdout)
    }
}

impl PartialEq for JobHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for JobHandle {}

impl Hash for JobHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
