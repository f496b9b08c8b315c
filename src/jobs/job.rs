//! Job records and their state machine.

use crate::convert::ConvertOptions;
use crate::error::{Error, ErrorKind, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Lifecycle state of a job.
///
/// `queued → running → completed | failed`. No transition skips `running`
/// and terminal states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, waiting for a worker
    Queued,
    /// Claimed by a worker
    Running,
    /// Finished with artifacts
    Completed,
    /// Finished with an error
    Failed,
}

impl JobStatus {
    /// Whether the state is final.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }

    /// Lowercase name, identical to the serialized value.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(Error::Input(format!("invalid status filter: {}", other))),
        }
    }
}

/// Source document submitted for conversion.
#[derive(Debug, Clone)]
pub struct JobInput {
    /// Original file name; its extension selects the converter
    pub filename: String,

    /// Document bytes
    pub bytes: Vec<u8>,
}

impl JobInput {
    /// Create a job input.
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Read a job input from a file.
    pub fn from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(filename, bytes))
    }

    /// File stem used to name artifacts.
    ///
    /// Directory components are dropped and characters outside
    /// `[A-Za-z0-9._-]` are replaced so the stem is safe as a file name.
    pub fn stem(&self) -> String {
        let name = self
            .filename
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default();
        let stem = match name.rfind('.') {
            Some(idx) if idx > 0 => &name[..idx],
            _ => name,
        };
        let cleaned: String = stem
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let cleaned = cleaned.trim_matches('.').to_string();
        if cleaned.is_empty() {
            "document".to_string()
        } else {
            cleaned
        }
    }
}

/// Reference to the submitted input kept on the job record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputInfo {
    /// Original file name
    pub filename: String,

    /// Size in bytes
    pub size: u64,
}

/// Per-job conversion switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobOptions {
    /// Extract embedded images
    pub extract_images: bool,

    /// Extract tables as tables
    pub extract_tables: bool,

    /// Build the zip package
    pub create_package: bool,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            extract_images: true,
            extract_tables: true,
            create_package: true,
        }
    }
}

impl JobOptions {
    /// Create default job options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable image extraction.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }

    /// Enable or disable table extraction.
    pub fn with_tables(mut self, extract: bool) -> Self {
        self.extract_tables = extract;
        self
    }

    /// Enable or disable packaging.
    pub fn with_package(mut self, create: bool) -> Self {
        self.create_package = create;
        self
    }

    /// Apply the switches on top of service-wide conversion options.
    pub fn apply(&self, base: &ConvertOptions) -> ConvertOptions {
        let mut options = base.clone();
        options.extract.extract_images = self.extract_images;
        options.extract.extract_tables = self.extract_tables;
        options.create_package = self.create_package;
        options
    }
}

/// A file produced by a completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// File name inside the job directory
    pub name: String,

    /// Absolute location on disk
    pub path: PathBuf,

    /// Size in bytes
    pub size: u64,
}

/// Artifact listing entry for API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactInfo {
    /// File name
    pub name: String,

    /// Size in bytes
    pub size: u64,

    /// Relative download URL
    pub download_url: String,
}

impl ArtifactInfo {
    /// Listing entry for an artifact of the given job.
    pub fn new(job_id: &str, artifact: &Artifact) -> Self {
        Self {
            name: artifact.name.clone(),
            size: artifact.size,
            download_url: format!("/api/v1/jobs/{}/files/{}", job_id, artifact.name),
        }
    }
}

/// Error recorded on a failed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    /// Error classification
    pub kind: ErrorKind,

    /// Human-readable message
    pub message: String,
}

impl From<&Error> for JobError {
    fn from(err: &Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Counters recorded on a completed job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMetrics {
    /// Retained images
    pub images: u32,

    /// Tables
    pub tables: u32,

    /// Level-1 headings
    pub chapters: u32,

    /// Words in the extracted text
    pub words: u32,

    /// Validator errors
    pub validation_errors: u32,

    /// Validator warnings
    pub validation_warnings: u32,
}

/// A conversion job.
///
/// Snapshots returned by the orchestrator are clones of this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique id (uuid v4)
    pub id: String,

    /// Current state
    pub status: JobStatus,

    /// Submission time
    pub created_at: DateTime<Utc>,

    /// Time a worker claimed the job
    pub started_at: Option<DateTime<Utc>>,

    /// Time the job reached a terminal state
    pub finished_at: Option<DateTime<Utc>>,

    /// Submitted input
    pub input: InputInfo,

    /// Conversion switches
    pub options: JobOptions,

    /// Produced files; set only on completion
    pub artifacts: Vec<Artifact>,

    /// Failure; set only on failure
    pub error: Option<JobError>,

    /// Counters; set only on completion
    pub metrics: Option<JobMetrics>,
}

/// Point-in-time copy of a job record.
pub type JobSnapshot = Job;

impl Job {
    /// Create a queued job.
    pub fn new(id: impl Into<String>, input: &JobInput, options: JobOptions) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Queued,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            input: InputInfo {
                filename: input.filename.clone(),
                size: input.bytes.len() as u64,
            },
            options,
            artifacts: Vec::new(),
            error: None,
            metrics: None,
        }
    }

    /// Seconds from submission to the terminal state.
    pub fn duration_seconds(&self) -> Option<f64> {
        self.finished_at
            .map(|end| (end - self.created_at).num_milliseconds() as f64 / 1000.0)
    }

    /// Find an artifact by name.
    pub fn artifact(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.name == name)
    }

    /// Move to `running`.
    pub fn start(&mut self) -> Result<()> {
        self.transition(JobStatus::Running)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Move to `completed`, recording artifacts and metrics.
    pub fn complete(&mut self, artifacts: Vec<Artifact>, metrics: JobMetrics) -> Result<()> {
        self.transition(JobStatus::Completed)?;
        self.finished_at = Some(Utc::now());
        self.artifacts = artifacts;
        self.metrics = Some(metrics);
        Ok(())
    }

    /// Move to `failed`, recording the error.
    pub fn fail(&mut self, error: JobError) -> Result<()> {
        self.transition(JobStatus::Failed)?;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
        Ok(())
    }

    fn transition(&mut self, next: JobStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(Error::Internal(format!(
                "job {}: invalid transition {} -> {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }
}
