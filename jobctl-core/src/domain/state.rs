//! Job lifecycle states
//!
//! The engine owns these states; the backend only reads them.

use serde::{Deserialize, Serialize};

/// How a terminated job ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Ok,
    Failed,
}

/// State of a single job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Known to the engine, not yet submitted
    New,

    /// Handed to the scheduler, waiting for resources
    Submitted,

    /// Executing
    Running,

    /// Held or suspended by the scheduler
    Stopped,

    /// Finished executing, results being collected
    Terminating,

    /// Done; no further progress will happen
    Terminated(Outcome),
}

impl JobState {
    /// Whether no further progress will happen on this job
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Terminated(_))
    }

    /// Whether the job occupies the scheduler (running, held or finishing)
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            JobState::Running | JobState::Stopped | JobState::Terminating
        )
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::New => write!(f, "NEW"),
            JobState::Submitted => write!(f, "SUBMITTED"),
            JobState::Running => write!(f, "RUNNING"),
            JobState::Stopped => write!(f, "STOPPED"),
            JobState::Terminating => write!(f, "TERMINATING"),
            JobState::Terminated(Outcome::Ok) => write!(f, "TERMINATED (ok)"),
            JobState::Terminated(Outcome::Failed) => write!(f, "TERMINATED (failed)"),
        }
    }
}

/// Aggregate state of a whole job collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionState {
    New,
    Submitted,
    Running,
    Terminating,
    Terminated,
}

impl CollectionState {
    /// Derives the collection state from the states of its members
    ///
    /// An empty collection is already terminated. A collection whose
    /// unfinished jobs are all terminating is terminating.
    pub fn aggregate<I>(states: I) -> Self
    where
        I: IntoIterator<Item = JobState>,
    {
        let mut all_new = true;
        let mut all_terminal = true;
        let mut all_finishing = true;
        let mut any_active = false;

        for state in states {
            all_new &= state == JobState::New;
            all_terminal &= state.is_terminal();
            all_finishing &= state.is_terminal() || state == JobState::Terminating;
            any_active |= state.is_active();
        }

        if all_terminal {
            CollectionState::Terminated
        } else if all_new {
            CollectionState::New
        } else if all_finishing {
            CollectionState::Terminating
        } else if any_active {
            CollectionState::Running
        } else {
            CollectionState::Submitted
        }
    }
}

impl std::fmt::Display for CollectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionState::New => write!(f, "NEW"),
            CollectionState::Submitted => write!(f, "SUBMITTED"),
            CollectionState::Running => write!(f, "RUNNING"),
            CollectionState::Terminating => write!(f, "TERMINATING"),
            CollectionState::Terminated => write!(f, "TERMINATED"),
        }
    }
}
