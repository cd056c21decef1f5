//! Core types for job invocation.

use std::time::Duration;

use queuebase_auth::AuthError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// JSON object describing a job's configuration.
pub type JobConfig = Map<String, Value>;

/// Body of a signed invocation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvocationRequest {
    pub name: String,
    #[serde(default)]
    pub payload: Value,
}

impl InvocationRequest {
    #[inline]
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// Status of a job run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Returns true if this status represents a terminal state.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        })
    }
}

/// A record of a single job execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRun {
    pub id: Uuid,
    pub job_name: String,
    pub status: JobStatus,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
    pub error_message: Option<String>,
}

impl JobRun {
    /// Create a new pending job run.
    #[inline]
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_name: job_name.into(),
            status: JobStatus::Pending,
            started_at: chrono::Utc::now(),
            finished_at: None,
            error_message: None,
        }
    }

    /// Mark the job as running.
    #[inline]
    pub fn start(&mut self) {
        self.status = JobStatus::Running;
        self.started_at = chrono::Utc::now();
    }

    /// Mark the job as completed.
    #[inline]
    pub fn complete(&mut self) {
        self.status = JobStatus::Completed;
        self.finished_at = Some(chrono::Utc::now());
    }

    /// Mark the job as failed with an error message.
    #[inline]
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.finished_at = Some(chrono::Utc::now());
        self.error_message = Some(message.into());
    }

    /// Wall-clock duration in milliseconds, once the run has finished.
    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_milliseconds())
    }
}

/// Why an invocation did not succeed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvocationFailure {
    #[error("authentication failed: {0}")]
    Unauthenticated(#[from] AuthError),
    #[error("malformed invocation request: {0}")]
    MalformedRequest(String),
    #[error("job not registered: {0}")]
    JobNotFound(String),
    #[error("job handler failed: {0}")]
    HandlerFailed(String),
    #[error("job handler panicked")]
    HandlerPanicked,
    #[error("job handler timed out after {0:?}")]
    TimedOut(Duration),
}

/// Outcome of running one invocation through the pipeline.
///
/// `success` is the only field the HTTP layer branches on; the rest is
/// context for operators.
#[derive(Debug, Clone)]
pub struct InvocationResult {
    pub success: bool,
    pub job_name: Option<String>,
    pub run: Option<JobRun>,
    pub failure: Option<InvocationFailure>,
}

impl InvocationResult {
    pub(crate) fn completed(run: JobRun) -> Self {
        Self {
            success: true,
            job_name: Some(run.job_name.clone()),
            run: Some(run),
            failure: None,
        }
    }

    pub(crate) fn failed(run: JobRun, failure: InvocationFailure) -> Self {
        Self {
            success: false,
            job_name: Some(run.job_name.clone()),
            run: Some(run),
            failure: Some(failure),
        }
    }

    /// Rejected before any handler ran.
    pub fn rejected(job_name: Option<String>, failure: InvocationFailure) -> Self {
        Self {
            success: false,
            job_name,
            run: None,
            failure: Some(failure),
        }
    }
}
