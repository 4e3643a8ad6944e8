//! Job statistics
//!
//! Per-state job counts as reported by an engine, keyed by [`StatName`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::state::{JobState, Outcome};

/// Name of a job statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatName {
    Total,
    New,
    Submitted,
    Running,
    Stopped,
    Terminating,
    Terminated,
    Ok,
    Failed,
}

impl StatName {
    /// Lower-case label used in status reports
    pub fn label(&self) -> &'static str {
        match self {
            StatName::Total => "total",
            StatName::New => "new",
            StatName::Submitted => "submitted",
            StatName::Running => "running",
            StatName::Stopped => "stopped",
            StatName::Terminating => "terminating",
            StatName::Terminated => "terminated",
            StatName::Ok => "ok",
            StatName::Failed => "failed",
        }
    }
}

impl std::fmt::Display for StatName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Job counts per statistic; a missing entry counts as zero
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobStats {
    counts: BTreeMap<StatName, usize>,
}

impl JobStats {
    /// Creates empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts the given job states
    ///
    /// `total` is the number of states, `terminated` is `ok + failed`.
    pub fn from_states<I>(states: I) -> Self
    where
        I: IntoIterator<Item = JobState>,
    {
        let mut stats = Self::new();
        for state in states {
            stats.increment(StatName::Total);
            match state {
                JobState::New => stats.increment(StatName::New),
                JobState::Submitted => stats.increment(StatName::Submitted),
                JobState::Running => stats.increment(StatName::Running),
                JobState::Stopped => stats.increment(StatName::Stopped),
                JobState::Terminating => stats.increment(StatName::Terminating),
                JobState::Terminated(outcome) => {
                    stats.increment(StatName::Terminated);
                    match outcome {
                        Outcome::Ok => stats.increment(StatName::Ok),
                        Outcome::Failed => stats.increment(StatName::Failed),
                    }
                }
            }
        }
        stats
    }

    /// Returns the count for `name`
    pub fn get(&self, name: StatName) -> usize {
        self.counts.get(&name).copied().unwrap_or(0)
    }

    fn increment(&mut self, name: StatName) {
        *self.counts.entry(name).or_insert(0) += 1;
    }

    pub fn total(&self) -> usize {
        self.get(StatName::Total)
    }

    pub fn ok(&self) -> usize {
        self.get(StatName::Ok)
    }

    pub fn failed(&self) -> usize {
        self.get(StatName::Failed)
    }
}
