//! Core domain types
//!
//! These types are shared between the backend (which builds and tracks jobs)
//! and the command line (which describes jobs and reads the final counts).
//! They carry structure only; execution is the engine's business.

pub mod job;
pub mod state;
pub mod stats;
