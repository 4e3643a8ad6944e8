//! Engine layer
//!
//! The engine is the external workflow manager that actually schedules,
//! submits and monitors jobs. The backend only talks to it through the
//! narrow [`Engine`] trait, and creates it through an [`EngineFactory`],
//! so tests can swap in a stub without a cluster.

pub mod slurm;

use anyhow::Result;
use async_trait::async_trait;
use jobctl_core::domain::state::CollectionState;
use jobctl_core::domain::stats::JobStats;

use crate::collection::JobCollection;
use crate::config::Config;

pub use slurm::{SlurmCli, SlurmEngine, SlurmSettings};

/// Operations the backend needs from a workflow engine
#[async_trait]
pub trait Engine: Send {
    /// Makes the engine aware of a batch of jobs without submitting them
    fn add(&mut self, jobs: JobCollection) -> Result<()>;

    /// Advances execution by one step
    ///
    /// Submits jobs whose dependencies terminated, refreshes the state of
    /// submitted jobs and collects the results of finished ones.
    async fn progress(&mut self) -> Result<()>;

    /// Current per-state job counts
    fn stats(&self) -> JobStats;

    /// Aggregate state of everything added so far
    fn state(&self) -> CollectionState;
}

/// Creates engines from ambient configuration
pub trait EngineFactory: Send + Sync {
    /// Whether the engine can run in this environment
    fn usable(&self) -> bool;

    /// Creates a fresh engine instance
    fn create_engine(&self) -> Result<Box<dyn Engine>>;
}

/// Factory building a [`SlurmEngine`] from the backend configuration
#[derive(Debug, Clone)]
pub struct AmbientEngineFactory {
    settings: SlurmSettings,
}

impl AmbientEngineFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            settings: SlurmSettings::from(config),
        }
    }
}

impl EngineFactory for AmbientEngineFactory {
    fn usable(&self) -> bool {
        SlurmCli::available()
    }

    fn create_engine(&self) -> Result<Box<dyn Engine>> {
        slurm::check_sbatch_available()?;
        Ok(Box::new(SlurmEngine::new(
            self.settings.clone(),
            SlurmCli::default(),
        )))
    }
}
