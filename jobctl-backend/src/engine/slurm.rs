//! Slurm engine
//!
//! Runs a job collection on a Slurm cluster:
//! - Submitting each job with `sbatch` once all of its dependencies terminated
//! - Tracking submitted jobs with `squeue`
//! - Resolving finished jobs with `sacct`, or with the exit code marker the
//!   job script appends to its stdout log when accounting is off
//!
//! Queueing, placement and resource matching stay with Slurm.

use anyhow::{Context, Result};
use async_trait::async_trait;
use jobctl_core::domain::job::{JobHandle, JobId};
use jobctl_core::domain::state::{CollectionState, JobState, Outcome};
use jobctl_core::domain::stats::JobStats;
use std::collections::{BTreeMap, HashMap};
use std::process::Command as StdCommand;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::Engine;
use crate::collection::JobCollection;
use crate::config::Config;

/// Prefix of the line carrying the script's exit code in `stdout.log`
pub const EXIT_CODE_MARKER: &str = "__JOBCTL_EXIT_CODE=";

/// Polls a submitted job may go unseen by Slurm before it is given up as failed
pub const MAX_MISSING_POLLS: u32 = 10;

/// Checks if `sbatch` is installed and answering
pub fn check_sbatch_available() -> Result<()> {
    let output = StdCommand::new("sbatch")
        .arg("--version")
        .output()
        .context("Failed to execute 'sbatch --version'. Is Slurm installed?")?;

    if !output.status.success() {
        anyhow::bail!("sbatch is not working correctly");
    }

    let version = String::from_utf8_lossy(&output.stdout);
    debug!("sbatch is available: {}", version.trim());

    Ok(())
}

/// Cluster-wide submission settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlurmSettings {
    pub partition: Option<String>,
    pub account: Option<String>,
}

impl From<&Config> for SlurmSettings {
    fn from(config: &Config) -> Self {
        Self {
            partition: config.partition.clone(),
            account: config.account.clone(),
        }
    }
}

/// Access to the Slurm command line tools
#[async_trait]
pub trait SlurmClient: Send + Sync {
    /// Runs `sbatch` with `args` and the extra `environment`, returning the Slurm job id
    async fn submit(&self, args: &[String], environment: &BTreeMap<String, String>)
    -> Result<String>;

    /// Looks up the state of the given Slurm job ids
    ///
    /// Ids whose state cannot be determined yet are left out of the result.
    async fn query(&self, ids: &[String]) -> Result<HashMap<String, JobState>>;
}

/// [`SlurmClient`] shelling out to `sbatch`, `squeue` and `sacct`
#[derive(Debug, Clone, Copy, Default)]
pub struct SlurmCli;

impl SlurmCli {
    /// Whether `sbatch` can be executed
    pub fn available() -> bool {
        check_sbatch_available().is_ok()
    }

    async fn squeue(&self, ids: &[String]) -> Result<HashMap<String, JobState>> {
        let output = Command::new("squeue")
            .arg("-h")
            .arg("-o")
            .arg("%i %T")
            .arg("-j")
            .arg(ids.join(","))
            .output()
            .await
            .context("Failed to execute squeue")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // squeue refuses ids that already left the queue
            if stderr.contains("Invalid job id") {
                return Ok(HashMap::new());
            }
            anyhow::bail!("squeue failed: {}", stderr.trim());
        }

        Ok(parse_squeue(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn sacct(&self, id: &str) -> Result<Option<JobState>> {
        let output = Command::new("sacct")
            .arg("-n")
            .arg("-P")
            .arg("-X")
            .arg("-o")
            .arg("JobID,State")
            .arg("-j")
            .arg(id)
            .output()
            .await
            .context("Failed to execute sacct")?;

        if !output.status.success() {
            anyhow::bail!(
                "sacct failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(parse_sacct(&String::from_utf8_lossy(&output.stdout), id))
    }
}

#[async_trait]
impl SlurmClient for SlurmCli {
    async fn submit(
        &self,
        args: &[String],
        environment: &BTreeMap<String, String>,
    ) -> Result<String> {
        let output = Command::new("sbatch")
            .args(args)
            .envs(environment)
            .output()
            .await
            .context("Failed to execute sbatch")?;

        if !output.status.success() {
            anyhow::bail!(
                "sbatch failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        parse_sbatch_id(&String::from_utf8_lossy(&output.stdout))
    }

    async fn query(&self, ids: &[String]) -> Result<HashMap<String, JobState>> {
        let mut states = self.squeue(ids).await?;

        for id in ids {
            if states.contains_key(id) {
                continue;
            }
            match self.sacct(id).await {
                Ok(Some(state)) => {
                    states.insert(id.clone(), state);
                }
                Ok(None) => debug!("No accounting record yet for Slurm job {}", id),
                Err(e) => warn!("Failed to query accounting for Slurm job {}: {:#}", id, e),
            }
        }

        Ok(states)
    }
}

/// A job as tracked by the engine
#[derive(Debug)]
struct TrackedJob {
    handle: JobHandle,
    dependencies: Vec<JobId>,
    state: JobState,
    slurm_id: Option<String>,
    missing_polls: u32,
}

/// Engine submitting a job collection to Slurm
pub struct SlurmEngine<C: SlurmClient = SlurmCli> {
    settings: SlurmSettings,
    client: C,
    jobs: Vec<TrackedJob>,
    index: HashMap<JobId, usize>,
}

impl<C: SlurmClient> SlurmEngine<C> {
    /// Creates an engine with no jobs
    pub fn new(settings: SlurmSettings, client: C) -> Self {
        Self {
            settings,
            client,
            jobs: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn state_of(&self, id: JobId) -> Option<JobState> {
        self.index.get(&id).map(|&i| self.jobs[i].state)
    }

    /// Whether every dependency of `job` terminated, successfully or not
    fn is_ready(&self, job: &TrackedJob) -> bool {
        job.state == JobState::New
            && job
                .dependencies
                .iter()
                .all(|&dep| self.state_of(dep).is_none_or(|s| s.is_terminal()))
    }

    /// Refreshes the state of every submitted, not yet terminated job
    ///
    /// A job Slurm no longer reports is resolved from the exit code marker in
    /// its stdout log. Without a marker it counts as failed once it went
    /// unseen for [`MAX_MISSING_POLLS`] polls in a row.
    async fn refresh(&mut self) -> Result<()> {
        let ids: Vec<String> = self
            .jobs
            .iter()
            .filter(|job| !job.state.is_terminal())
            .filter_map(|job| job.slurm_id.clone())
            .collect();

        if ids.is_empty() {
            return Ok(());
        }

        debug!("Polling {} Slurm job(s)", ids.len());
        let (states, polled) = match self.client.query(&ids).await {
            Ok(states) => (states, Ok(())),
            Err(e) => (HashMap::new(), Err(e.context("Failed to poll Slurm job states"))),
        };

        for job in self.jobs.iter_mut() {
            if job.state.is_terminal() {
                continue;
            }
            let Some(slurm_id) = job.slurm_id.clone() else {
                continue;
            };

            let state = match states.get(&slurm_id) {
                Some(&state) => {
                    job.missing_polls = 0;
                    state
                }
                None => match read_exit_code(&job.handle).await {
                    Some(code) => {
                        debug!("Job {} exited with code {}", job.handle.name, code);
                        exit_code_state(code)
                    }
                    None => {
                        job.missing_polls += 1;
                        if job.missing_polls < MAX_MISSING_POLLS {
                            continue;
                        }
                        warn!(
                            "Slurm job {} ({}) vanished without an exit code, marking it failed",
                            slurm_id, job.handle.name
                        );
                        JobState::Terminated(Outcome::Failed)
                    }
                },
            };

            if state != job.state {
                info!("Job {} (Slurm {}) is now {}", job.handle.name, slurm_id, state);
                job.state = state;
            }
        }

        polled
    }

    /// Submits every job whose dependencies terminated
    async fn submit_ready(&mut self) {
        let ready: Vec<usize> = (0..self.jobs.len())
            .filter(|&i| self.is_ready(&self.jobs[i]))
            .collect();

        for i in ready {
            let args = sbatch_args(&self.jobs[i].handle, &self.settings);
            let job = &mut self.jobs[i];

            if let Err(e) = tokio::fs::create_dir_all(&job.handle.output_dir).await {
                warn!(
                    "Failed to create output directory {} for job {}: {}",
                    job.handle.output_dir.display(),
                    job.handle.name,
                    e
                );
                job.state = JobState::Terminated(Outcome::Failed);
                continue;
            }

            let environment = job.handle.environment.clone().unwrap_or_default();
            debug!("Submitting job {}: {}", job.handle.name, job.handle.script());
            match self.client.submit(&args, &environment).await {
                Ok(slurm_id) => {
                    info!("Submitted job {} as Slurm job {}", job.handle.name, slurm_id);
                    job.slurm_id = Some(slurm_id);
                    job.state = JobState::Submitted;
                }
                Err(e) => {
                    warn!("Failed to submit job {}: {:#}", job.handle.name, e);
                    job.state = JobState::Terminated(Outcome::Failed);
                }
            }
        }
    }
}

#[async_trait]
impl<C: SlurmClient> Engine for SlurmEngine<C> {
    fn add(&mut self, jobs: JobCollection) -> Result<()> {
        debug!(
            "Adding {} job(s) writing under {}",
            jobs.len(),
            jobs.output_dir().display()
        );
        for handle in jobs.jobs() {
            if self.index.contains_key(&handle.id()) {
                anyhow::bail!("Job {} was already added to the engine", handle.name);
            }
            let dependencies = jobs.dependencies_of(handle.id()).collect();
            self.index.insert(handle.id(), self.jobs.len());
            self.jobs.push(TrackedJob {
                handle: handle.clone(),
                dependencies,
                state: JobState::New,
                slurm_id: None,
                missing_polls: 0,
            });
        }
        Ok(())
    }

    async fn progress(&mut self) -> Result<()> {
        let refreshed = self.refresh().await;
        self.submit_ready().await;
        refreshed
    }

    fn stats(&self) -> JobStats {
        JobStats::from_states(self.jobs.iter().map(|job| job.state))
    }

    fn state(&self) -> CollectionState {
        CollectionState::aggregate(self.jobs.iter().map(|job| job.state))
    }
}

/// Builds the `sbatch` arguments submitting `handle`
pub fn sbatch_args(handle: &JobHandle, settings: &SlurmSettings) -> Vec<String> {
    let mut args = vec![
        "--parsable".to_string(),
        "--job-name".to_string(),
        handle.jobname.clone(),
        "--chdir".to_string(),
        handle.output_dir.to_string_lossy().to_string(),
        "--output".to_string(),
        handle.stdout_path().to_string_lossy().to_string(),
    ];

    // Without --error Slurm writes stderr to the --output file
    if !handle.join {
        args.push("--error".to_string());
        args.push(
            handle
                .output_dir
                .join("stderr.log")
                .to_string_lossy()
                .to_string(),
        );
    }

    if let Some(walltime) = handle.requested_walltime {
        args.push("--time".to_string());
        args.push(format_walltime(walltime));
    }
    if let Some(cores) = handle.requested_cores {
        args.push("--cpus-per-task".to_string());
        args.push(cores.to_string());
    }
    if let Some(partition) = &settings.partition {
        args.push("--partition".to_string());
        args.push(partition.clone());
    }
    if let Some(account) = &settings.account {
        args.push("--account".to_string());
        args.push(account.clone());
    }

    args.push("--export=ALL".to_string());
    args.push("--wrap".to_string());
    args.push(wrap_command(&handle.arguments));
    args
}

/// Formats a walltime as Slurm's `D-HH:MM:SS`
pub fn format_walltime(walltime: Duration) -> String {
    let secs = walltime.as_secs();
    format!(
        "{}-{:02}:{:02}:{:02}",
        secs / 86_400,
        (secs % 86_400) / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

/// Runs the job command, then records its exit code in the job's stdout log
fn wrap_command(arguments: &[String]) -> String {
    let quoted: Vec<String> = arguments.iter().map(|a| shell_quote(a)).collect();
    format!(
        "{}; rc=$?; echo \"{}$rc\"; exit $rc",
        quoted.join(" "),
        EXIT_CODE_MARKER
    )
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Extracts the job id from `sbatch --parsable` output (`<id>[;<cluster>]`)
pub fn parse_sbatch_id(stdout: &str) -> Result<String> {
    let id = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.split(';').next())
        .unwrap_or_default();

    if id.is_empty() {
        anyhow::bail!("sbatch did not print a job id");
    }
    Ok(id.to_string())
}

/// Extracts the last exit code marker from a job's stdout log
pub fn parse_exit_code(stdout: &str) -> Option<i32> {
    stdout
        .lines()
        .rev()
        .find_map(|line| line.trim().strip_prefix(EXIT_CODE_MARKER))
        .and_then(|code| code.trim().parse().ok())
}

async fn read_exit_code(handle: &JobHandle) -> Option<i32> {
    let log = tokio::fs::read_to_string(handle.stdout_path()).await.ok()?;
    parse_exit_code(&log)
}

fn exit_code_state(code: i32) -> JobState {
    if code == 0 {
        JobState::Terminated(Outcome::Ok)
    } else {
        JobState::Terminated(Outcome::Failed)
    }
}

/// Parses `squeue -h -o "%i %T"` output
pub fn parse_squeue(stdout: &str) -> HashMap<String, JobState> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let id = fields.next()?;
            let state = map_slurm_state(fields.next()?)?;
            Some((id.to_string(), state))
        })
        .collect()
}

/// Parses `sacct -n -P -X -o JobID,State` output for job `id`
pub fn parse_sacct(stdout: &str, id: &str) -> Option<JobState> {
    stdout.lines().find_map(|line| {
        let (job_id, state) = line.trim().split_once('|')?;
        if job_id != id {
            return None;
        }
        map_slurm_state(state)
    })
}

/// Maps a Slurm job state name to a [`JobState`]
///
/// Slurm marks a non-zero exit code as `FAILED`, so `COMPLETED` means success.
pub fn map_slurm_state(raw: &str) -> Option<JobState> {
    // sacct may append details, e.g. "CANCELLED by 1000"
    let name = raw.split_whitespace().next()?.trim_end_matches('+');
    let state = match name {
        "PENDING" | "CONFIGURING" | "REQUEUED" | "REQUEUE_HOLD" | "RESV_DEL_HOLD" => {
            JobState::Submitted
        }
        "RUNNING" | "COMPLETING" | "RESIZING" | "SIGNALING" | "STAGE_OUT" => JobState::Running,
        "SUSPENDED" | "STOPPED" => JobState::Stopped,
        "COMPLETED" => JobState::Terminated(Outcome::Ok),
        "FAILED" | "CANCELLED" | "TIMEOUT" | "NODE_FAIL" | "OUT_OF_MEMORY" | "PREEMPTED"
        | "BOOT_FAIL" | "DEADLINE" | "REVOKED" | "SPECIAL_EXIT" => {
            JobState::Terminated(Outcome::Failed)
        }
        _ => return None,
    };
    Some(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobctl_core::domain::job::JobRequest;
    use std::path::Path;
    use std::sync::Mutex;

    /// Fake Slurm: jobs finish on the poll after submission
    #[derive(Default)]
    struct FakeSlurm {
        submitted: Mutex<Vec<String>>,
        failing_names: Vec<String>,
        rejected_names: Vec<String>,
    }

    impl FakeSlurm {
        fn job_name(args: &[String]) -> String {
            let pos = args.iter().position(|a| a == "--job-name").unwrap();
            args[pos + 1].clone()
        }
    }

    #[async_trait]
    impl SlurmClient for FakeSlurm {
        async fn submit(
            &self,
            args: &[String],
            _environment: &BTreeMap<String, String>,
        ) -> Result<String> {
            let name = Self::job_name(args);
            if self.rejected_names.contains(&name) {
                anyhow::bail!("sbatch: error: invalid partition");
            }
            let mut submitted = self.submitted.lock().unwrap();
            submitted.push(name);
            Ok(format!("{}", 1000 + submitted.len()))
        }

        async fn query(&self, ids: &[String]) -> Result<HashMap<String, JobState>> {
            let submitted = self.submitted.lock().unwrap();
            Ok(ids
                .iter()
                .map(|id| {
                    let n: usize = id.parse::<usize>().unwrap() - 1001;
                    let outcome = if self.failing_names.contains(&submitted[n]) {
                        Outcome::Failed
                    } else {
                        Outcome::Ok
                    };
                    (id.clone(), JobState::Terminated(outcome))
                })
                .collect())
        }
    }

    /// Slurm without accounting: jobs leave the queue as soon as they are submitted
    struct ForgetfulSlurm;

    #[async_trait]
    impl SlurmClient for ForgetfulSlurm {
        async fn submit(
            &self,
            _args: &[String],
            _environment: &BTreeMap<String, String>,
        ) -> Result<String> {
            Ok("42".to_string())
        }

        async fn query(&self, _ids: &[String]) -> Result<HashMap<String, JobState>> {
            Ok(HashMap::new())
        }
    }

    fn handle(dir: &Path, name: &str) -> JobHandle {
        JobHandle::from_request(&JobRequest::new(name, "echo hi"), dir)
    }

    #[test]
    fn test_sbatch_args_minimal() {
        let handle = handle(Path::new("/work/easybuild-jobs"), "zlib");
        let args = sbatch_args(&handle, &SlurmSettings::default());

        assert_eq!(
            args,
            vec![
                "--parsable",
                "--job-name",
                "zlib",
                "--chdir",
                "/work/easybuild-jobs/zlib",
                "--output",
                "/work/easybuild-jobs/zlib/stdout.log",
                "--export=ALL",
                "--wrap",
                "'/bin/sh' '-c' 'echo hi'; rc=$?; echo \"__JOBCTL_EXIT_CODE=$rc\"; exit $rc",
            ]
        );
    }

    #[test]
    fn test_sbatch_args_with_hints() {
        let request = JobRequest::new("gcc", "eb gcc.eb").with_hours(30).with_cores(4);
        let handle = JobHandle::from_request(&request, Path::new("/w"));
        let settings = SlurmSettings {
            partition: Some("batch".to_string()),
            account: Some("hpc".to_string()),
        };
        let args = sbatch_args(&handle, &settings);

        let joined = args.join(" ");
        assert!(joined.contains("--time 1-06:00:00"));
        assert!(joined.contains("--cpus-per-task 4"));
        assert!(joined.contains("--partition batch"));
        assert!(joined.contains("--account hpc"));
        assert!(!joined.contains("--error"));
    }

    #[test]
    fn test_shell_quote_single_quotes() {
        assert_eq!(shell_quote("echo 'a b'"), r"'echo '\''a b'\'''");
    }

    #[test]
    fn test_format_walltime() {
        assert_eq!(format_walltime(Duration::from_secs(3600)), "0-01:00:00");
        assert_eq!(format_walltime(Duration::from_secs(48 * 3600)), "2-00:00:00");
        assert_eq!(format_walltime(Duration::from_secs(90)), "0-00:01:30");
    }

    #[test]
    fn test_parse_sbatch_id() {
        assert_eq!(parse_sbatch_id("12345\n").unwrap(), "12345");
        assert_eq!(parse_sbatch_id("678;cluster-a\n").unwrap(), "678");
        assert!(parse_sbatch_id("\n").is_err());
    }

    #[test]
    fn test_parse_squeue() {
        let states = parse_squeue("101 PENDING\n102 RUNNING\n103 COMPLETING\n104 WEIRD\n");
        assert_eq!(states.get("101"), Some(&JobState::Submitted));
        assert_eq!(states.get("102"), Some(&JobState::Running));
        assert_eq!(states.get("103"), Some(&JobState::Running));
        assert_eq!(states.get("104"), None);
    }

    #[test]
    fn test_parse_sacct() {
        let out = "200|COMPLETED\n201|CANCELLED by 1000\n";
        assert_eq!(
            parse_sacct(out, "200"),
            Some(JobState::Terminated(Outcome::Ok))
        );
        assert_eq!(
            parse_sacct(out, "201"),
            Some(JobState::Terminated(Outcome::Failed))
        );
        assert_eq!(parse_sacct(out, "202"), None);
        assert_eq!(parse_sacct("", "200"), None);
    }

    #[tokio::test]
    async fn test_dependent_waits_for_dependency() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("easybuild-jobs");
        let a = handle(&root, "a");
        let b = handle(&root, "b");
        let mut collection = JobCollection::new(&root);
        collection.add(a.clone(), &[]).unwrap();
        collection.add(b.clone(), &[&a]).unwrap();

        let mut engine = SlurmEngine::new(SlurmSettings::default(), FakeSlurm::default());
        engine.add(collection).unwrap();
        assert_eq!(engine.state(), CollectionState::New);

        engine.progress().await.unwrap();
        assert_eq!(*engine.client.submitted.lock().unwrap(), vec!["a"]);
        assert_eq!(engine.state_of(b.id()), Some(JobState::New));
        assert!(root.join("a").is_dir());

        engine.progress().await.unwrap();
        assert_eq!(*engine.client.submitted.lock().unwrap(), vec!["a", "b"]);

        engine.progress().await.unwrap();
        assert_eq!(engine.state(), CollectionState::Terminated);
        assert_eq!(engine.stats().ok(), 2);
    }

    #[tokio::test]
    async fn test_failed_dependency_does_not_block() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("easybuild-jobs");
        let a = handle(&root, "a");
        let b = handle(&root, "b");
        let mut collection = JobCollection::new(&root);
        collection.add(a.clone(), &[]).unwrap();
        collection.add(b.clone(), &[&a]).unwrap();

        let client = FakeSlurm {
            failing_names: vec!["a".to_string()],
            ..Default::default()
        };
        let mut engine = SlurmEngine::new(SlurmSettings::default(), client);
        engine.add(collection).unwrap();

        for _ in 0..3 {
            engine.progress().await.unwrap();
        }

        let stats = engine.stats();
        assert_eq!(stats.failed(), 1);
        assert_eq!(stats.ok(), 1);
        assert_eq!(engine.state(), CollectionState::Terminated);
    }

    #[tokio::test]
    async fn test_rejected_submission_counts_as_failed() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("easybuild-jobs");
        let mut collection = JobCollection::new(&root);
        collection.add(handle(&root, "bad"), &[]).unwrap();

        let client = FakeSlurm {
            rejected_names: vec!["bad".to_string()],
            ..Default::default()
        };
        let mut engine = SlurmEngine::new(SlurmSettings::default(), client);
        engine.add(collection).unwrap();
        engine.progress().await.unwrap();

        assert_eq!(engine.state(), CollectionState::Terminated);
        assert_eq!(engine.stats().failed(), 1);
    }

    #[test]
    fn test_parse_exit_code() {
        assert_eq!(parse_exit_code("building\n__JOBCTL_EXIT_CODE=0\n"), Some(0));
        assert_eq!(
            parse_exit_code("__JOBCTL_EXIT_CODE=0\nretry\n__JOBCTL_EXIT_CODE=2\n"),
            Some(2)
        );
        assert_eq!(parse_exit_code("no marker here\n"), None);
        assert_eq!(parse_exit_code("__JOBCTL_EXIT_CODE=\n"), None);
    }

    #[tokio::test]
    async fn test_unseen_job_without_exit_code_fails_eventually() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("easybuild-jobs");
        let mut collection = JobCollection::new(&root);
        collection.add(handle(&root, "lost"), &[]).unwrap();

        let mut engine = SlurmEngine::new(SlurmSettings::default(), ForgetfulSlurm);
        engine.add(collection).unwrap();

        // One step submits, the following ones miss the job
        for _ in 0..MAX_MISSING_POLLS {
            engine.progress().await.unwrap();
        }
        assert_eq!(engine.state(), CollectionState::Submitted);

        engine.progress().await.unwrap();
        assert_eq!(engine.state(), CollectionState::Terminated);
        assert_eq!(engine.stats().failed(), 1);
    }

    #[tokio::test]
    async fn test_unseen_job_resolved_from_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("easybuild-jobs");
        let ok = handle(&root, "ok");
        let broken = handle(&root, "broken");
        let mut collection = JobCollection::new(&root);
        collection.add(ok.clone(), &[]).unwrap();
        collection.add(broken.clone(), &[]).unwrap();

        let mut engine = SlurmEngine::new(SlurmSettings::default(), ForgetfulSlurm);
        engine.add(collection).unwrap();
        engine.progress().await.unwrap();

        std::fs::write(ok.stdout_path(), "done\n__JOBCTL_EXIT_CODE=0\n").unwrap();
        std::fs::write(broken.stdout_path(), "error\n__JOBCTL_EXIT_CODE=1\n").unwrap();
        engine.progress().await.unwrap();

        assert_eq!(engine.state(), CollectionState::Terminated);
        assert_eq!(engine.stats().ok(), 1);
        assert_eq!(engine.stats().failed(), 1);
    }

    #[test]
    fn test_adding_twice_rejected() {
        let root = Path::new("/tmp/jobs");
        let mut collection = JobCollection::new(root);
        collection.add(handle(root, "a"), &[]).unwrap();

        let mut engine = SlurmEngine::new(SlurmSettings::default(), FakeSlurm::default());
        engine.add(collection.clone()).unwrap();
        assert!(engine.add(collection).is_err());
    }
}
