//! Error types for docxbook library.

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Result type alias for docxbook operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during conversion and job handling.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source bytes are not a readable DOCX container.
    #[error("Invalid input: {0}")]
    Input(String),

    /// A required document part is missing or uses an unsupported schema.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// The content model cannot be rendered to a schema-conformant document.
    #[error("Generation error: {0}")]
    Generation(String),

    /// The package archive cannot be assembled.
    #[error("Packaging error: {0}")]
    Packaging(String),

    /// No job is registered under the given id.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// The job exists but has not reached the completed state.
    #[error("Job {0} has not completed")]
    JobNotCompleted(String),

    /// The job has no artifact with the given name.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// The job exceeded its maximum duration.
    #[error("Job timed out after {0} seconds")]
    Timeout(u64),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unexpected failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Classify the error for reporting on jobs and API responses.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Input(_) => ErrorKind::InputError,
            Error::Extraction(_) => ErrorKind::ExtractionError,
            Error::Generation(_) => ErrorKind::GenerationError,
            Error::Packaging(_) => ErrorKind::PackagingError,
            Error::JobNotFound(_) => ErrorKind::JobNotFound,
            Error::JobNotCompleted(_) => ErrorKind::JobNotCompleted,
            Error::FileNotFound(_) => ErrorKind::FileNotFound,
            Error::Timeout(_) => ErrorKind::TimeoutError,
            Error::Io(_) | Error::Json(_) | Error::Internal(_) => ErrorKind::InternalError,
        }
    }
}

/// Error classification exposed on failed jobs and service responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or unreadable source container
    InputError,
    /// Missing or unsupported internal document part
    ExtractionError,
    /// Structural requirement of the target schema not met
    GenerationError,
    /// Dangling image reference or filename collision
    PackagingError,
    /// Unknown job id
    JobNotFound,
    /// Job not completed yet
    JobNotCompleted,
    /// Unknown artifact name
    FileNotFound,
    /// Job exceeded its maximum duration
    TimeoutError,
    /// Unexpected failure
    InternalError,
}

impl ErrorKind {
    /// Whether the failure was caused by the caller rather than the service.
    pub fn is_client_error(self) -> bool {
        matches!(
            self,
            ErrorKind::InputError
                | ErrorKind::ExtractionError
                | ErrorKind::JobNotFound
                | ErrorKind::JobNotCompleted
                | ErrorKind::FileNotFound
        )
    }

    /// Stable string form, identical to the serialized value.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InputError => "input_error",
            ErrorKind::ExtractionError => "extraction_error",
            ErrorKind::GenerationError => "generation_error",
            ErrorKind::PackagingError => "packaging_error",
            ErrorKind::JobNotFound => "job_not_found",
            ErrorKind::JobNotCompleted => "job_not_completed",
            ErrorKind::FileNotFound => "file_not_found",
            ErrorKind::TimeoutError => "timeout_error",
            ErrorKind::InternalError => "internal_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            zip::result::ZipError::FileNotFound => {
                Error::Extraction("required part not found in container".into())
            }
            _ => Error::Input(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Extraction(format!("malformed XML: {}", err))
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Packaging(err.to_string())
    }
}
