//! Error types for the job backend

use thiserror::Error;

/// Result type alias for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors that can occur when using a job backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// The job engine is not available in this environment
    #[error("Job backend unavailable: {0}")]
    Unavailable(String),

    /// A job could not be built from its request
    #[error("Invalid job: {0}")]
    InvalidJob(String),

    /// The job was already queued
    #[error("Job '{0}' is already queued")]
    DuplicateJob(String),

    /// A dependency was not queued before its dependent
    #[error("Job '{job}' depends on '{dependency}', which has not been queued")]
    UnknownDependency {
        /// Job being queued
        job: String,
        /// Dependency missing from the collection
        dependency: String,
    },

    /// The session already handed its jobs to an engine
    #[error("Job collection was already completed")]
    AlreadyCompleted,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The engine could not be created or rejected the collection
    #[error("Engine error: {0:#}")]
    Engine(#[from] anyhow::Error),
}

impl BackendError {
    /// Check if this error was caused by the caller's queuing order
    pub fn is_queue_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateJob(_) | Self::UnknownDependency { .. }
        )
    }
}
