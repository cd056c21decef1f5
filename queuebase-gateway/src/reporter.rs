//! Operator-facing reporting of gateway outcomes.

use std::fmt;

use queuebase_auth::AuthError;
use queuebase_job_queue::InvocationResult;
use tracing::{error, info, warn};

/// Which gateway operation produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Invoke,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::List => "list",
            Self::Invoke => "invoke",
        })
    }
}

/// Side channel for request outcomes. Nothing reported here reaches the
/// caller.
pub trait GatewayReporter: Send + Sync + 'static {
    fn report_auth_failure(&self, operation: Operation, error: &AuthError);
    fn report_execution_failure(&self, result: &InvocationResult);
    fn report_success(&self, result: &InvocationResult);
}

/// Default reporter writing structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl GatewayReporter for TracingReporter {
    fn report_auth_failure(&self, operation: Operation, error: &AuthError) {
        warn!(%operation, %error, "invalid signature");
    }

    fn report_execution_failure(&self, result: &InvocationResult) {
        let run = result.run.as_ref();
        error!(
            operation = %Operation::Invoke,
            job = result.job_name.as_deref().unwrap_or("-"),
            run_id = ?run.map(|r| r.id),
            duration_ms = ?run.and_then(|r| r.duration_ms()),
            failure = %result
                .failure
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            "failed to run job"
        );
    }

    fn report_success(&self, result: &InvocationResult) {
        let run = result.run.as_ref();
        info!(
            operation = %Operation::Invoke,
            job = result.job_name.as_deref().unwrap_or("-"),
            run_id = ?run.map(|r| r.id),
            duration_ms = ?run.and_then(|r| r.duration_ms()),
            "job ran successfully"
        );
    }
}
