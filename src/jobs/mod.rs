//! Asynchronous conversion jobs.
//!
//! The [`Orchestrator`] accepts submissions, hands them to a bounded pool of
//! worker threads and answers status, listing, dashboard and download
//! queries. Submission never blocks on conversion; callers poll.
//!
//! # Example
//!
//! ```no_run
//! use docxbook::jobs::{JobInput, JobOptions, Orchestrator, OrchestratorConfig};
//!
//! fn main() -> docxbook::Result<()> {
//!     let orchestrator = Orchestrator::new(OrchestratorConfig::new("./output"))?;
//!     let input = JobInput::from_path("manual.docx")?;
//!     let id = orchestrator.submit(input, JobOptions::default())?;
//!     println!("{}", orchestrator.get(&id)?.status);
//!     Ok(())
//! }
//! ```

mod dashboard;
mod job;
mod store;
mod worker;

pub use dashboard::{Dashboard, RecentConversion, RECENT_LIMIT};
pub use job::{
    Artifact, ArtifactInfo, InputInfo, Job, JobError, JobInput, JobMetrics, JobOptions,
    JobSnapshot, JobStatus,
};
pub use store::JobStore;

use crate::convert::{ConvertOptions, ConverterRegistry};
use crate::error::{Error, Result};
use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use worker::{Task, WorkerContext};

/// Default number of concurrently running jobs.
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 5;

/// Default maximum job duration in seconds.
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 300;

/// Orchestrator settings.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Directory holding one sub-directory per job
    pub output_root: PathBuf,

    /// Size of the worker pool
    pub max_concurrent_jobs: usize,

    /// Maximum duration of one job
    pub job_timeout: Duration,

    /// Service-wide conversion options; job options are applied on top
    pub convert: ConvertOptions,
}

impl OrchestratorConfig {
    /// Default settings writing below `output_root`.
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
            job_timeout: Duration::from_secs(DEFAULT_JOB_TIMEOUT_SECS),
            convert: ConvertOptions::default(),
        }
    }

    /// Set the worker pool size (at least one).
    pub fn with_max_concurrent_jobs(mut self, count: usize) -> Self {
        self.max_concurrent_jobs = count.max(1);
        self
    }

    /// Set the maximum job duration.
    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = timeout;
        self
    }

    /// Set the service-wide conversion options.
    pub fn with_convert_options(mut self, options: ConvertOptions) -> Self {
        self.convert = options;
        self
    }
}

/// Job orchestrator over a bounded worker pool.
pub struct Orchestrator {
    config: OrchestratorConfig,
    store: Arc<JobStore>,
    registry: Arc<ConverterRegistry>,
    sender: Option<Sender<Task>>,
    workers: Vec<JoinHandle<()>>,
}

impl Orchestrator {
    /// Start an orchestrator with a fresh store and the default converters.
    pub fn new(config: OrchestratorConfig) -> Result<Self> {
        Self::with_store(config, Arc::new(JobStore::new()))
    }

    /// Start an orchestrator over an existing store.
    pub fn with_store(config: OrchestratorConfig, store: Arc<JobStore>) -> Result<Self> {
        Self::with_registry(config, store, Arc::new(ConverterRegistry::with_defaults()))
    }

    /// Start an orchestrator with an explicit store and converter registry.
    pub fn with_registry(
        config: OrchestratorConfig,
        store: Arc<JobStore>,
        registry: Arc<ConverterRegistry>,
    ) -> Result<Self> {
        std::fs::create_dir_all(&config.output_root)?;
        let (sender, receiver) = crossbeam_channel::unbounded();
        let context = Arc::new(WorkerContext {
            store: Arc::clone(&store),
            registry: Arc::clone(&registry),
            output_root: config.output_root.clone(),
            timeout: config.job_timeout,
        });
        let workers = worker::spawn_workers(config.max_concurrent_jobs, receiver, context)?;
        log::info!(
            "Orchestrator started: {} worker(s), output in {}",
            workers.len(),
            config.output_root.display()
        );

        Ok(Self {
            config,
            store,
            registry,
            sender: Some(sender),
            workers,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Get the job store.
    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Directory holding a job's artifacts.
    pub fn job_dir(&self, id: &str) -> PathBuf {
        self.config.output_root.join(id)
    }

    /// Submit a document. Returns the new job id immediately.
    ///
    /// Fails with an input error, without creating a job, when no converter
    /// is registered for the file extension.
    pub fn submit(&self, input: JobInput, options: JobOptions) -> Result<String> {
        self.registry.for_filename(&input.filename)?;

        let id = uuid::Uuid::new_v4().to_string();
        self.store.insert(Job::new(id.clone(), &input, options))?;
        log::info!(
            "Job {} queued ({}, {} bytes)",
            id,
            input.filename,
            input.bytes.len()
        );

        let task = Task {
            job_id: id.clone(),
            options: options.apply(&self.config.convert),
            input,
        };
        self.sender
            .as_ref()
            .ok_or_else(|| Error::Internal("job queue is closed".into()))?
            .send(task)
            .map_err(|_| Error::Internal("job queue is closed".into()))?;
        Ok(id)
    }

    /// Snapshot of a job.
    pub fn get(&self, id: &str) -> Result<JobSnapshot> {
        self.store
            .get(id)
            .ok_or_else(|| Error::JobNotFound(id.to_string()))
    }

    /// Snapshots in creation order, optionally filtered by status.
    pub fn list(&self, filter: Option<JobStatus>) -> Vec<JobSnapshot> {
        self.store.list(filter)
    }

    /// Aggregate statistics over all jobs.
    pub fn dashboard(&self) -> Dashboard {
        Dashboard::from_jobs(&self.store.list(None))
    }

    /// Artifacts of a completed job.
    pub fn list_files(&self, id: &str) -> Result<Vec<ArtifactInfo>> {
        let job = self.completed(id)?;
        Ok(job
            .artifacts
            .iter()
            .map(|artifact| ArtifactInfo::new(&job.id, artifact))
            .collect())
    }

    /// Location of one artifact of a completed job.
    pub fn artifact_path(&self, id: &str, name: &str) -> Result<PathBuf> {
        let job = self.completed(id)?;
        job.artifact(name)
            .map(|artifact| artifact.path.clone())
            .ok_or_else(|| Error::FileNotFound(name.to_string()))
    }

    /// Bytes of one artifact of a completed job.
    pub fn download_file(&self, id: &str, name: &str) -> Result<Vec<u8>> {
        let path = self.artifact_path(id, name)?;
        Ok(std::fs::read(path)?)
    }

    /// Poll until the job reaches a terminal state.
    pub fn wait(&self, id: &str, timeout: Duration) -> Result<JobSnapshot> {
        let deadline = Instant::now() + timeout;
        loop {
            let job = self.get(id)?;
            if job.status.is_terminal() {
                return Ok(job);
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout(timeout.as_secs()));
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    /// Output root directory.
    pub fn output_root(&self) -> &Path {
        &self.config.output_root
    }

    fn completed(&self, id: &str) -> Result<JobSnapshot> {
        let job = self.get(id)?;
        if job.status != JobStatus::Completed {
            return Err(Error::JobNotCompleted(id.to_string()));
        }
        Ok(job)
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        // closing the queue lets workers drain and exit
        self.sender.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("A worker thread panicked");
            }
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("jobs", &self.store.len())
            .field("workers", &self.workers.len())
            .finish()
    }
}
