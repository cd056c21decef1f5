//! Signed invocation pipeline.

use std::time::Duration;

use http::HeaderMap;
use queuebase_auth::RequestAuthenticator;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::JobQueueError;
use crate::registry::JobRegistry;
use crate::types::{InvocationFailure, InvocationRequest, InvocationResult, JobRun};

/// Turns an authenticated invocation request into a single job run.
///
/// Built once from a [`JobRegistry`] and shared by every in-flight request;
/// cloning is cheap. The pipeline never retries and never propagates a
/// handler failure: every outcome is folded into an [`InvocationResult`].
#[derive(Debug, Clone)]
pub struct RequestHandlerPipeline {
    registry: JobRegistry,
    authenticator: RequestAuthenticator,
    timeout: Option<Duration>,
}

impl RequestHandlerPipeline {
    pub fn build(registry: JobRegistry, authenticator: RequestAuthenticator) -> Self {
        Self {
            registry,
            authenticator,
            timeout: None,
        }
    }

    /// Abort handlers that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[inline]
    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Authenticate `body` against the signature in `headers`, then run the
    /// job the body names.
    pub async fn run(&self, headers: &HeaderMap, body: &[u8]) -> InvocationResult {
        if let Err(err) = self.authenticator.authenticate(headers, body) {
            return InvocationResult::rejected(None, err.into());
        }

        let request: InvocationRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(err) => {
                return InvocationResult::rejected(
                    None,
                    InvocationFailure::MalformedRequest(err.to_string()),
                )
            }
        };

        self.dispatch(request).await
    }

    async fn dispatch(&self, request: InvocationRequest) -> InvocationResult {
        let InvocationRequest { name, payload } = request;

        let Some(definition) = self.registry.get(&name) else {
            return InvocationResult::rejected(
                Some(name.clone()),
                InvocationFailure::JobNotFound(name),
            );
        };

        let mut run = JobRun::new(&name);
        run.start();
        debug!(job = %name, run_id = %run.id, "dispatching job");

        // Run on its own task so a panicking handler surfaces as a JoinError
        // instead of unwinding through the request.
        let handler = definition.handler();
        let mut task = JobTask(tokio::spawn(async move { handler.execute(payload).await }));

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task.0).await {
                Ok(joined) => joined,
                Err(_) => {
                    drop(task);
                    run.fail(format!("timed out after {}ms", limit.as_millis()));
                    return InvocationResult::failed(run, InvocationFailure::TimedOut(limit));
                }
            },
            None => (&mut task.0).await,
        };

        match joined {
            Ok(Ok(())) => {
                run.complete();
                InvocationResult::completed(run)
            }
            Ok(Err(err)) => {
                let message = err.to_string();
                run.fail(message.clone());
                InvocationResult::failed(run, InvocationFailure::HandlerFailed(message))
            }
            Err(_) => {
                run.fail("job handler panicked");
                InvocationResult::failed(run, InvocationFailure::HandlerPanicked)
            }
        }
    }
}

/// Spawned handler that is aborted if dropped before it finishes.
struct JobTask(JoinHandle<Result<(), JobQueueError>>);

impl Drop for JobTask {
    fn drop(&mut self) {
        if !self.0.is_finished() {
            debug!("aborting unfinished job task");
            self.0.abort();
        }
    }
}
