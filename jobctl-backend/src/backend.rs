//! Job backend
//!
//! The host-facing side of job submission. A session goes through three
//! steps:
//! - `init`: start an empty job collection under the output directory
//! - `make_job` / `queue`: describe jobs and add them with their dependencies
//! - `complete`: hand the collection to an engine and poll until every job
//!   terminated, printing a status line after each step
//!
//! Scheduling, dependency resolution and resource matching all happen in the
//! engine.

use anyhow::Context;
use async_trait::async_trait;
use jobctl_core::domain::job::{JobHandle, JobRequest};
use jobctl_core::domain::state::CollectionState;
use jobctl_core::domain::stats::{JobStats, StatName};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::collection::JobCollection;
use crate::config::Config;
use crate::engine::{Engine, EngineFactory};
use crate::error::{BackendError, Result};
use crate::report::{FINAL_STATES, PROGRESS_STATES, StatusReporter, format_status_report};

/// Interface a host uses to submit a batch of jobs
#[async_trait]
pub trait JobBackend: Send {
    /// Whether the backend can run jobs in the current environment
    fn usable(&self) -> bool;

    /// Builds a job handle from `request` without queuing it
    fn make_job(&self, request: &JobRequest) -> Result<JobHandle>;

    /// Adds `job` to the batch, to run after every job in `dependencies`
    fn queue(&mut self, job: &JobHandle, dependencies: &[&JobHandle]) -> Result<()>;

    /// Submits the batch and waits until every job terminated
    ///
    /// Returns the final job counts; individual job failures show up in
    /// the `failed` count rather than as an error.
    async fn complete(&mut self) -> Result<JobStats>;
}

/// Backend driving an external workflow engine
pub struct EngineBackend {
    config: Config,
    factory: Arc<dyn EngineFactory>,
    reporter: Arc<dyn StatusReporter>,
    jobs: Option<JobCollection>,
}

impl EngineBackend {
    /// Starts a new backend session with an empty job collection
    ///
    /// # Arguments
    /// * `config` - Backend configuration (output directory, poll interval, silence)
    /// * `factory` - Creates the engine when the batch is completed
    /// * `reporter` - Receives the status lines
    ///
    /// # Returns
    /// `BackendError::Unavailable` when the engine cannot run here
    pub fn init(
        config: Config,
        factory: Arc<dyn EngineFactory>,
        reporter: Arc<dyn StatusReporter>,
    ) -> Result<Self> {
        if !factory.usable() {
            return Err(BackendError::Unavailable(
                "job engine is not installed or not working".to_string(),
            ));
        }
        config.validate()?;

        info!(
            "Starting job collection in {}",
            config.output_dir.display()
        );
        let jobs = JobCollection::new(config.output_dir.clone());

        Ok(Self {
            config,
            factory,
            reporter,
            jobs: Some(jobs),
        })
    }

    /// The jobs queued so far, until the session is completed
    pub fn jobs(&self) -> Option<&JobCollection> {
        self.jobs.as_ref()
    }

    /// Reports the engine's counts for `states`, with `overrides` taking precedence
    fn print_status_report(
        &self,
        engine: &dyn Engine,
        states: &[StatName],
        overrides: &[(StatName, usize)],
    ) {
        let line = format_status_report(&engine.stats(), states, overrides);
        self.reporter.report(&line, self.config.silent);
    }
}

#[async_trait]
impl JobBackend for EngineBackend {
    fn usable(&self) -> bool {
        self.factory.usable()
    }

    fn make_job(&self, request: &JobRequest) -> Result<JobHandle> {
        validate_request(request)?;
        let handle = JobHandle::from_request(request, &self.config.output_dir);
        debug!("Created job {} ({})", handle.name, handle.id());
        Ok(handle)
    }

    fn queue(&mut self, job: &JobHandle, dependencies: &[&JobHandle]) -> Result<()> {
        let jobs = self.jobs.as_mut().ok_or(BackendError::AlreadyCompleted)?;
        jobs.add(job.clone(), dependencies)?;
        debug!("Queued job {} with {} dependencies", job.name, dependencies.len());
        Ok(())
    }

    async fn complete(&mut self) -> Result<JobStats> {
        let jobs = self.jobs.take().ok_or(BackendError::AlreadyCompleted)?;
        let total = jobs.len();

        let mut engine = self
            .factory
            .create_engine()
            .context("Failed to create job engine")?;
        engine
            .add(jobs)
            .context("Failed to hand jobs to the engine")?;

        info!(
            "Submitting {} job(s), polling every {:?}",
            total, self.config.poll_interval
        );
        self.print_status_report(engine.as_ref(), &PROGRESS_STATES, &[(StatName::Total, total)]);

        while engine.state() != CollectionState::Terminated {
            if let Err(e) = engine.progress().await {
                error!("Error during engine step: {:#}", e);
            }

            self.print_status_report(engine.as_ref(), &PROGRESS_STATES, &[]);

            tokio::time::sleep(self.config.poll_interval).await;
        }

        self.print_status_report(engine.as_ref(), &FINAL_STATES, &[]);

        let stats = engine.stats();
        info!(
            "All jobs terminated: {} ok, {} failed",
            stats.ok(),
            stats.failed()
        );
        Ok(stats)
    }
}

/// Checks a request before it becomes a job handle
fn validate_request(request: &JobRequest) -> Result<()> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(BackendError::InvalidJob(
            "job name cannot be empty".to_string(),
        ));
    }
    // The name becomes a directory under the collection root
    if name != request.name || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(BackendError::InvalidJob(format!(
            "job name '{}' is not a valid directory name",
            request.name
        )));
    }
    if request.script.trim().is_empty() {
        return Err(BackendError::InvalidJob(format!(
            "job '{}' has an empty script",
            request.name
        )));
    }
    if request.hours == Some(0) {
        return Err(BackendError::InvalidJob(format!(
            "job '{}' requests zero hours of walltime",
            request.name
        )));
    }
    if request.cores == Some(0) {
        return Err(BackendError::InvalidJob(format!(
            "job '{}' requests zero cores",
            request.name
        )));
    }
    Ok(())
}
