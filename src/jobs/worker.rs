//! Worker pool executing conversion jobs.

use super::job::{Artifact, Job, JobError, JobInput, JobMetrics};
use super::store::JobStore;
use crate::convert::{ConvertOptions, ConvertResult, ConverterRegistry};
use crate::error::{Error, ErrorKind, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A queued unit of work.
pub(crate) struct Task {
    pub job_id: String,
    pub input: JobInput,
    pub options: ConvertOptions,
}

/// State shared by all workers.
pub(crate) struct WorkerContext {
    pub store: Arc<JobStore>,
    pub registry: Arc<ConverterRegistry>,
    pub output_root: PathBuf,
    pub timeout: Duration,
}

impl WorkerContext {
    /// Final directory of a job's artifacts.
    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        self.output_root.join(job_id)
    }

    fn staging_dir(&self, job_id: &str) -> PathBuf {
        self.output_root.join(format!(".staging-{}", job_id))
    }
}

/// Spawn `count` workers draining `tasks` until the channel closes.
pub(crate) fn spawn_workers(
    count: usize,
    tasks: Receiver<Task>,
    context: Arc<WorkerContext>,
) -> Result<Vec<JoinHandle<()>>> {
    (0..count.max(1))
        .map(|index| {
            let tasks = tasks.clone();
            let context = Arc::clone(&context);
            thread::Builder::new()
                .name(format!("docxbook-worker-{}", index))
                .spawn(move || {
                    for task in tasks.iter() {
                        run_task(&context, task);
                    }
                    log::debug!("Worker {} stopped", index);
                })
                .map_err(Error::from)
        })
        .collect()
}

/// Claim, execute and finish one job. Never panics on job failure.
fn run_task(context: &WorkerContext, task: Task) {
    let job_id = task.job_id.clone();
    if let Err(e) = context.store.update(&job_id, Job::start) {
        log::error!("Cannot claim job {}: {}", job_id, e);
        return;
    }
    log::info!("Job {} running ({})", job_id, task.input.filename);

    let outcome = execute(context, task).and_then(|(artifacts, metrics)| {
        context
            .store
            .update(&job_id, |job| job.complete(artifacts, metrics))
    });

    match outcome {
        Ok(job) => log::info!(
            "Job {} completed with {} artifact(s)",
            job_id,
            job.artifacts.len()
        ),
        Err(e) => {
            if e.kind() == ErrorKind::InternalError {
                log::error!("Job {} failed: {}", job_id, e);
            } else {
                log::info!("Job {} failed: {}", job_id, e);
            }
            if let Err(update) = context
                .store
                .update(&job_id, |job| job.fail(JobError::from(&e)))
            {
                log::error!("Cannot record failure of job {}: {}", job_id, update);
            }
        }
    }
}

/// Convert on a dedicated thread bounded by the job timeout, then persist.
///
/// A conversion that outlives the timeout keeps running on its thread; its
/// result is dropped when it finally arrives.
fn execute(context: &WorkerContext, task: Task) -> Result<(Vec<Artifact>, JobMetrics)> {
    let converter = context.registry.for_filename(&task.input.filename)?;
    let stem = task.input.stem();
    let (sender, receiver) = crossbeam_channel::bounded::<Result<ConvertResult>>(1);

    let Task {
        job_id,
        input,
        mut options,
    } = task;
    if options.extract.fallback_title.is_none() {
        options.extract.fallback_title = Some(stem.clone());
    }

    thread::Builder::new()
        .name(format!("docxbook-convert-{}", &job_id[..job_id.len().min(8)]))
        .spawn(move || {
            let result = converter.convert_bytes(&input.bytes, &options);
            // the receiver is gone after a timeout
            let _ = sender.send(result);
        })?;

    let result = match receiver.recv_timeout(context.timeout) {
        Ok(result) => result?,
        Err(RecvTimeoutError::Timeout) => return Err(Error::Timeout(context.timeout.as_secs())),
        Err(RecvTimeoutError::Disconnected) => {
            return Err(Error::Internal("conversion thread panicked".into()))
        }
    };

    let artifacts = persist(context, &job_id, &stem, &result)?;
    Ok((artifacts, metrics_of(&result)))
}

/// Write artifacts to a staging directory, then move it into place.
fn persist(
    context: &WorkerContext,
    job_id: &str,
    stem: &str,
    result: &ConvertResult,
) -> Result<Vec<Artifact>> {
    let staging = context.staging_dir(job_id);
    let target = context.job_dir(job_id);

    let written = result
        .write_to(&staging, stem)
        .and_then(|artifacts| {
            fs::rename(&staging, &target)?;
            Ok(artifacts)
        });

    match written {
        Ok(artifacts) => Ok(relocate(artifacts, &target)),
        Err(e) => {
            if staging.exists() {
                if let Err(cleanup) = fs::remove_dir_all(&staging) {
                    log::warn!("Cannot remove {}: {}", staging.display(), cleanup);
                }
            }
            Err(e)
        }
    }
}

fn relocate(artifacts: Vec<Artifact>, dir: &Path) -> Vec<Artifact> {
    artifacts
        .into_iter()
        .map(|artifact| Artifact {
            path: dir.join(&artifact.name),
            ..artifact
        })
        .collect()
}

fn metrics_of(result: &ConvertResult) -> JobMetrics {
    let (validation_errors, validation_warnings) = result
        .report
        .as_ref()
        .map(|r| (r.total_errors as u32, r.total_warnings as u32))
        .unwrap_or_default();
    JobMetrics {
        images: result.image_count() as u32,
        tables: result.table_count() as u32,
        chapters: result.stats.chapter_count,
        words: result.stats.word_count,
        validation_errors,
        validation_warnings,
    }
}
