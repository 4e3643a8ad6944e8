//! Job collection
//!
//! The ordered set of queued jobs plus their dependency edges. The backend
//! owns it while jobs are being queued, then hands it to the engine as one
//! batch.

use jobctl_core::domain::job::{JobHandle, JobId};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::{BackendError, Result};

/// Queued jobs and the jobs each of them depends on
#[derive(Debug, Clone)]
pub struct JobCollection {
    output_dir: PathBuf,
    jobs: Vec<JobHandle>,
    dependencies: HashMap<JobId, HashSet<JobId>>,
}

impl JobCollection {
    /// Creates an empty collection rooted at `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            jobs: Vec::new(),
            dependencies: HashMap::new(),
        }
    }

    /// Directory under which every job gets its own output directory
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Adds `job`, depending on every handle in `dependencies`
    ///
    /// Dependencies must already be in the collection and a job can only be
    /// added once. On error the collection is left untouched.
    pub fn add(&mut self, job: JobHandle, dependencies: &[&JobHandle]) -> Result<()> {
        if self.contains(job.id()) {
            return Err(BackendError::DuplicateJob(job.name.clone()));
        }

        let mut edges = HashSet::new();
        for dependency in dependencies {
            if !self.contains(dependency.id()) {
                return Err(BackendError::UnknownDependency {
                    job: job.name.clone(),
                    dependency: dependency.name.clone(),
                });
            }
            edges.insert(dependency.id());
        }

        self.dependencies.insert(job.id(), edges);
        self.jobs.push(job);
        Ok(())
    }

    /// Whether a job with this id was added
    pub fn contains(&self, id: JobId) -> bool {
        self.dependencies.contains_key(&id)
    }

    /// Jobs in the order they were added
    pub fn jobs(&self) -> &[JobHandle] {
        &self.jobs
    }

    /// Ids of the jobs `id` depends on (empty for unknown jobs)
    pub fn dependencies_of(&self, id: JobId) -> impl Iterator<Item = JobId> + '_ {
        self.dependencies.get(&id).into_iter().flatten().copied()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
