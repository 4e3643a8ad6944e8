//! Test doubles for the job backend: a stub engine that enforces
//! dependency order, its factory, and a reporter recording status lines.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use jobctl_backend::{Config, Engine, EngineFactory, JobCollection, StatusReporter};
use jobctl_core::domain::job::JobId;
use jobctl_core::domain::state::{CollectionState, JobState, Outcome};
use jobctl_core::domain::stats::JobStats;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the stub engine saw, shared with the test
#[derive(Debug, Default)]
pub struct EngineLog {
    /// "submit <name>" / "finish <name> <ok|failed>" in order
    pub events: Vec<String>,
    /// Jobs submitted while a dependency was still pending
    pub violations: Vec<String>,
    /// Number of `progress` calls
    pub steps: usize,
}

impl EngineLog {
    pub fn position(&self, event: &str) -> Option<usize> {
        self.events.iter().position(|e| e == event)
    }

    pub fn submissions(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| e.strip_prefix("submit "))
            .map(str::to_string)
            .collect()
    }
}

struct StubJob {
    name: String,
    dependencies: Vec<JobId>,
    state: JobState,
}

/// Engine moving each job New → Submitted → Running → Terminated, one
/// state per step, submitting a job only once its dependencies terminated
pub struct StubEngine {
    jobs: Vec<StubJob>,
    index: HashMap<JobId, usize>,
    failing: Vec<String>,
    failing_steps: usize,
    log: Arc<Mutex<EngineLog>>,
}

impl StubEngine {
    fn dependencies_terminated(&self, job: &StubJob, snapshot: &[JobState]) -> bool {
        job.dependencies
            .iter()
            .all(|dep| snapshot[self.index[dep]].is_terminal())
    }
}

#[async_trait]
impl Engine for StubEngine {
    fn add(&mut self, jobs: JobCollection) -> Result<()> {
        for handle in jobs.jobs() {
            self.index.insert(handle.id(), self.jobs.len());
            self.jobs.push(StubJob {
                name: handle.name.clone(),
                dependencies: jobs.dependencies_of(handle.id()).collect(),
                state: JobState::New,
            });
        }
        Ok(())
    }

    async fn progress(&mut self) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        log.steps += 1;
        if log.steps <= self.failing_steps {
            anyhow::bail!("scheduler unreachable");
        }

        let snapshot: Vec<JobState> = self.jobs.iter().map(|j| j.state).collect();
        for i in 0..self.jobs.len() {
            let next = match snapshot[i] {
                JobState::New if self.dependencies_terminated(&self.jobs[i], &snapshot) => {
                    let job = &self.jobs[i];
                    let pending = job
                        .dependencies
                        .iter()
                        .any(|dep| !self.jobs[self.index[dep]].state.is_terminal());
                    if pending {
                        log.violations.push(job.name.clone());
                    }
                    log.events.push(format!("submit {}", job.name));
                    JobState::Submitted
                }
                JobState::Submitted => JobState::Running,
                JobState::Running => {
                    let job = &self.jobs[i];
                    let outcome = if self.failing.contains(&job.name) {
                        Outcome::Failed
                    } else {
                        Outcome::Ok
                    };
                    let label = if outcome == Outcome::Ok { "ok" } else { "failed" };
                    log.events.push(format!("finish {} {}", job.name, label));
                    JobState::Terminated(outcome)
                }
                other => other,
            };
            self.jobs[i].state = next;
        }
        Ok(())
    }

    fn stats(&self) -> JobStats {
        JobStats::from_states(self.jobs.iter().map(|j| j.state))
    }

    fn state(&self) -> CollectionState {
        CollectionState::aggregate(self.jobs.iter().map(|j| j.state))
    }
}

/// Factory handing out [`StubEngine`]s
#[derive(Default)]
pub struct StubFactory {
    pub unusable: bool,
    /// Job names that end up failed
    pub failing: Vec<String>,
    /// Number of initial `progress` calls that return an error
    pub failing_steps: usize,
    pub log: Arc<Mutex<EngineLog>>,
}

impl StubFactory {
    pub fn failing(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        }
    }
}

impl EngineFactory for StubFactory {
    fn usable(&self) -> bool {
        !self.unusable
    }

    fn create_engine(&self) -> Result<Box<dyn Engine>> {
        Ok(Box::new(StubEngine {
            jobs: Vec::new(),
            index: HashMap::new(),
            failing: self.failing.clone(),
            failing_steps: self.failing_steps,
            log: Arc::clone(&self.log),
        }))
    }
}

/// Reporter keeping every line and the silent flag it came with
#[derive(Default)]
pub struct RecordingReporter {
    pub lines: Mutex<Vec<(String, bool)>>,
}

impl RecordingReporter {
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .map(|(line, _)| line.clone())
            .collect()
    }

    pub fn last(&self) -> Option<String> {
        self.lines().pop()
    }
}

impl StatusReporter for RecordingReporter {
    fn report(&self, line: &str, silent: bool) {
        self.lines.lock().unwrap().push((line.to_string(), silent));
    }
}

/// Configuration polling every millisecond
pub fn fast_config(output_dir: &Path) -> Config {
    Config::new(output_dir.to_path_buf()).with_poll_interval(Duration::from_millis(1))
}
