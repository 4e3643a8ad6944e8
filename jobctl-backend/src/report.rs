//! Status reporting
//!
//! Turns engine statistics into one-line summaries such as
//! `build jobs: 3 total, 1 running, 2 ok` and hands them to a
//! [`StatusReporter`] supplied by the host.

use jobctl_core::domain::stats::{JobStats, StatName};
use tracing::info;

/// Prefix of every status line
pub const STATUS_PREFIX: &str = "build jobs: ";

/// States reported after every engine step
pub const PROGRESS_STATES: [StatName; 5] = [
    StatName::Total,
    StatName::Submitted,
    StatName::Running,
    StatName::Ok,
    StatName::Failed,
];

/// States reported once all jobs terminated
pub const FINAL_STATES: [StatName; 3] = [StatName::Total, StatName::Ok, StatName::Failed];

/// Sink for status lines, injected into the backend by the host
pub trait StatusReporter: Send + Sync {
    /// Emits one status line
    ///
    /// # Arguments
    /// * `line` - The formatted status line
    /// * `silent` - Whether console echo was switched off by configuration
    fn report(&self, line: &str, silent: bool);
}

/// Reporter that logs every line and echoes it to stdout unless silent
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl StatusReporter for ConsoleReporter {
    fn report(&self, line: &str, silent: bool) {
        info!("{}", line);
        if !silent {
            println!("{}", line);
        }
    }
}

/// Formats the counts of `states` as a status line
///
/// An override replaces the engine's count for its state. States whose
/// effective count is zero are left out.
pub fn format_status_report(
    stats: &JobStats,
    states: &[StatName],
    overrides: &[(StatName, usize)],
) -> String {
    let overview = states
        .iter()
        .filter_map(|&state| {
            let count = overrides
                .iter()
                .find(|(name, _)| *name == state)
                .map(|&(_, count)| count)
                .unwrap_or_else(|| stats.get(state));
            (count > 0).then(|| format!("{} {}", count, state))
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!("{}{}", STATUS_PREFIX, overview)
}
