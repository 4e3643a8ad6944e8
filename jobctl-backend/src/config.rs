//! Backend configuration
//!
//! Defines the ambient settings of a backend session: where job output
//! goes, how often the engine is polled, whether status lines are echoed,
//! and the scheduler settings used when the engine is created.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{BackendError, Result};

/// Name of the directory (under the working directory) collecting job output
pub const JOBS_DIR_NAME: &str = "easybuild-jobs";

/// Default delay between two engine steps
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Backend configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the job collection; each job writes to `<output_dir>/<name>/`
    pub output_dir: PathBuf,

    /// How long to sleep after each engine step
    pub poll_interval: Duration,

    /// Suppress echoing status lines to the console (they are still logged)
    pub silent: bool,

    /// Slurm partition to submit to (cluster default when unset)
    pub partition: Option<String>,

    /// Slurm account to charge (user default when unset)
    pub account: Option<String>,
}

impl Config {
    /// Creates a configuration rooted at `output_dir` with defaults elsewhere
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            poll_interval: DEFAULT_POLL_INTERVAL,
            silent: false,
            partition: None,
            account: None,
        }
    }

    /// Creates a configuration rooted at `<cwd>/easybuild-jobs`
    pub fn in_current_dir() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| BackendError::Config(format!("cannot read working directory: {}", e)))?;
        Ok(Self::new(cwd.join(JOBS_DIR_NAME)))
    }

    /// Creates configuration from environment variables
    ///
    /// Recognised environment variables:
    /// - JOBCTL_OUTPUT_DIR (optional, default: `<cwd>/easybuild-jobs`)
    /// - JOBCTL_POLL_INTERVAL (optional, seconds, default: 30)
    /// - JOBCTL_SILENT (optional, `1`/`true`/`yes`, default: false)
    /// - JOBCTL_SLURM_PARTITION (optional)
    /// - JOBCTL_SLURM_ACCOUNT (optional)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("JOBCTL_OUTPUT_DIR") {
            Some(dir) => Self::new(PathBuf::from(dir)),
            None => Self::in_current_dir()?,
        };

        if let Some(raw) = lookup("JOBCTL_POLL_INTERVAL") {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                BackendError::Config(format!("JOBCTL_POLL_INTERVAL is not a number: {}", raw))
            })?;
            config.poll_interval = Duration::from_secs(secs);
        }

        config.silent = lookup("JOBCTL_SILENT")
            .map(|raw| parse_flag(&raw))
            .unwrap_or(false);
        config.partition = lookup("JOBCTL_SLURM_PARTITION").filter(|s| !s.is_empty());
        config.account = lookup("JOBCTL_SLURM_ACCOUNT").filter(|s| !s.is_empty());

        config.validate()?;
        Ok(config)
    }

    /// Sets the poll interval
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets the silent flag
    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(BackendError::Config(
                "output_dir cannot be empty".to_string(),
            ));
        }

        if self.poll_interval.is_zero() {
            return Err(BackendError::Config(
                "poll_interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    /// `<cwd>/easybuild-jobs`, or `easybuild-jobs` relative to the process when
    /// the working directory cannot be read
    fn default() -> Self {
        Self::in_current_dir().unwrap_or_else(|_| Self::new(PathBuf::from(JOBS_DIR_NAME)))
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
