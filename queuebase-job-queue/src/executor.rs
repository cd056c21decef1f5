//! Job executor trait for implementing job handlers.

use std::future::Future;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::JobQueueError;

/// Capability implemented by every registered job handler.
///
/// The gateway never inspects what a handler does; it only awaits the
/// outcome. Handlers are shared across concurrent invocations, so any
/// mutable state they hold must be synchronised internally.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    /// Execute the job with the given payload.
    ///
    /// Returns `Ok(())` on success, or an error describing the failure.
    async fn execute(&self, payload: Value) -> Result<(), JobQueueError>;
}

/// A no-op executor that immediately completes jobs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpExecutor;

#[async_trait]
impl JobExecutor for NoOpExecutor {
    async fn execute(&self, _payload: Value) -> Result<(), JobQueueError> {
        Ok(())
    }
}

/// Adapts an async closure into a [`JobExecutor`].
#[derive(Debug, Clone)]
pub struct FnExecutor<F>(F);

/// Build an executor from an async closure.
///
/// ```rust
/// use queuebase_job_queue::{executor_fn, JobQueueError};
///
/// let handler = executor_fn(|payload| async move {
///     if payload.is_null() {
///         return Err(JobQueueError::InvalidPayload("payload required".into()));
///     }
///     Ok(())
/// });
/// # let _ = handler;
/// ```
pub fn executor_fn<F, Fut>(f: F) -> FnExecutor<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), JobQueueError>> + Send,
{
    FnExecutor(f)
}

#[async_trait]
impl<F, Fut> JobExecutor for FnExecutor<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), JobQueueError>> + Send,
{
    async fn execute(&self, payload: Value) -> Result<(), JobQueueError> {
        (self.0)(payload).await
    }
}
