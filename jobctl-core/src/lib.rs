//! jobctl Core
//!
//! Core types shared by the job backend and the `jobctl` command line.
//!
//! This crate contains:
//! - Job types: requests and the engine job handles built from them
//! - State types: per-job and per-collection lifecycle states
//! - Statistics: per-state job counts reported by an engine
//!
//! Note: submission logic lives in `jobctl-backend`, user interaction in `jobctl-cli`.

pub mod domain;
