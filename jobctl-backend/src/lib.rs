//! jobctl Backend
//!
//! Submits shell-script jobs to an external workflow engine and polls it
//! until every job terminated.
//!
//! Architecture:
//! - Backend: the host-facing session (`init`, `make_job`, `queue`, `complete`)
//! - Collection: queued jobs and their dependency edges
//! - Engine: the narrow seam to the workflow manager, plus a Slurm implementation
//! - Report: status line formatting and the injected reporter
//! - Configuration: output directory, poll interval and silence from the environment
//!
//! # Example
//!
//! ```no_run
//! use jobctl_backend::{AmbientEngineFactory, Config, ConsoleReporter, EngineBackend, JobBackend};
//! use jobctl_core::domain::job::JobRequest;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let factory = Arc::new(AmbientEngineFactory::new(&config));
//!     let mut backend = EngineBackend::init(config, factory, Arc::new(ConsoleReporter))?;
//!
//!     let zlib = backend.make_job(&JobRequest::new("zlib", "eb zlib.eb").with_hours(1))?;
//!     let gcc = backend.make_job(&JobRequest::new("gcc", "eb gcc.eb").with_cores(8))?;
//!     backend.queue(&zlib, &[])?;
//!     backend.queue(&gcc, &[&zlib])?;
//!
//!     let stats = backend.complete().await?;
//!     println!("{} ok, {} failed", stats.ok(), stats.failed());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod collection;
pub mod config;
pub mod engine;
pub mod error;
pub mod report;

// Re-export commonly used types
pub use backend::{EngineBackend, JobBackend};
pub use collection::JobCollection;
pub use config::Config;
pub use engine::{AmbientEngineFactory, Engine, EngineFactory};
pub use error::{BackendError, Result};
pub use report::{ConsoleReporter, StatusReporter};
