//! Error types for the job queue system.

use thiserror::Error;

/// Errors that may occur while building a registry or running a job.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobQueueError {
    #[error("job already registered: {0}")]
    DuplicateJob(String),

    #[error("invalid config for job {name}: {reason}")]
    InvalidConfig { name: String, reason: String },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("job execution failed: {0}")]
    ExecutionFailed(String),
}

impl JobQueueError {
    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::ExecutionFailed(message.into())
    }
}
