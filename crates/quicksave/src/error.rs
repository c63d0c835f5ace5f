//! Error types for the download-then-remux pipeline.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pipeline::JobStage;

/// Pipeline result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure raised by one of the pipeline services.
#[derive(Error, Debug)]
pub enum Error {
    /// The URL is not a recognized video link. Raised before any I/O.
    #[error("invalid video URL `{url}`")]
    InvalidUrl { url: String },

    /// The retrieval tool failed or produced no media.
    #[error("retrieval of {url} failed: {reason}")]
    RetrievalFailure { url: String, reason: String },

    /// The multiplexer could not be started or exited non-zero.
    #[error("merge into {} failed: {reason}", output.display())]
    MergeFailure {
        output: PathBuf,
        exit_code: Option<i32>,
        reason: String,
    },

    /// An input could not be removed after a successful merge.
    #[error("cleanup of {} failed: {source}", path.display())]
    CleanupFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    pub fn retrieval(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RetrievalFailure {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Attach an operation label and path to an I/O error.
    pub fn io_path(op: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

/// A job-level failure: the stage that failed and why.
#[derive(Error, Debug)]
#[error("{stage} failed: {source}")]
pub struct JobError {
    pub stage: JobStage,
    #[source]
    pub source: Error,
}

impl JobError {
    pub fn new(stage: JobStage, source: Error) -> Self {
        Self { stage, source }
    }
}
