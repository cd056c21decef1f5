//! Email job implementation.

use queuebase_job_queue::{async_trait, JobExecutor, JobQueueError};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

/// Payload for the sendEmail job.
#[derive(Debug, Deserialize)]
pub struct SendEmailPayload {
    pub to: String,
    pub subject: String,
    #[serde(default)]
    pub body: Option<String>,
}

/// Executor for sendEmail jobs.
///
/// Validates the message and logs the delivery. No mail transport is wired
/// in; applications swap in their own executor under the same name.
#[derive(Debug, Default)]
pub struct SendEmailExecutor;

impl SendEmailExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl JobExecutor for SendEmailExecutor {
    async fn execute(&self, payload: Value) -> Result<(), JobQueueError> {
        let parsed: SendEmailPayload = serde_json::from_value(payload)
            .map_err(|e| JobQueueError::InvalidPayload(e.to_string()))?;

        if !is_plausible_address(&parsed.to) {
            return Err(JobQueueError::InvalidPayload(format!(
                "invalid recipient: {}",
                parsed.to
            )));
        }

        info!(
            to = %parsed.to,
            subject = %parsed.subject,
            body_len = parsed.body.as_deref().map_or(0, str::len),
            "email queued for delivery"
        );
        Ok(())
    }
}

fn is_plausible_address(addr: &str) -> bool {
    match addr.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.contains('@')
        }
        None => false,
    }
}
