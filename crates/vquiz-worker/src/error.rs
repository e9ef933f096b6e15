//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Hard failures that abort a pipeline run.
///
/// Soft failures never surface here; they are absorbed inside the stage that
/// produced them (see `stages::StageOutcome`).
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Job queue full, upload rejected: {0}")]
    QueueFull(String),

    #[error("Job timed out: {0}")]
    JobTimeout(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("AI capability error: {0}")]
    Ai(#[from] vquiz_ai::AiError),

    #[error("Store error: {0}")]
    Store(#[from] vquiz_store::StoreError),

    #[error("Media error: {0}")]
    Media(#[from] vquiz_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn queue_full(msg: impl Into<String>) -> Self {
        Self::QueueFull(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
