//! Job registry and invocation pipeline used by the Queuebase gateway.
//!
//! The embedding application describes its jobs once, at startup, as a
//! [`JobRegistry`]. The gateway reads that registry to list jobs and hands it
//! to a [`RequestHandlerPipeline`] to execute them.
//!
//! # Architecture
//!
//! - [`JobExecutor`] - Capability implemented by job handlers
//! - [`JobRegistry`] - Immutable name to [`JobDefinition`] mapping
//! - [`RequestHandlerPipeline`] - Authenticates and dispatches invocation requests
//! - [`InvocationResult`] - Outcome of one invocation, with its [`JobRun`] record
//!
//! # Example
//!
//! ```rust,no_run
//! use queuebase_auth::RequestAuthenticator;
//! use queuebase_job_queue::{async_trait, JobExecutor, JobQueueError, JobRegistry, RequestHandlerPipeline};
//! use serde_json::json;
//!
//! struct SendEmail;
//!
//! #[async_trait]
//! impl JobExecutor for SendEmail {
//!     async fn execute(&self, payload: serde_json::Value) -> Result<(), JobQueueError> {
//!         println!("sending email: {}", payload);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = JobRegistry::builder()
//!         .job("sendEmail", json!({ "retries": 3 }), SendEmail)
//!         .build()
//!         .unwrap();
//!
//!     let pipeline = RequestHandlerPipeline::build(
//!         registry,
//!         RequestAuthenticator::from_secret("secret"),
//!     );
//!     let body = br#"{"name":"sendEmail"}"#;
//!     let result = pipeline.run(&http::HeaderMap::new(), body).await;
//!     assert!(!result.success); // unsigned
//! }
//! ```

mod error;
mod executor;
mod pipeline;
mod registry;
mod types;

pub use error::JobQueueError;
pub use executor::{executor_fn, FnExecutor, JobExecutor, NoOpExecutor};
pub use pipeline::RequestHandlerPipeline;
pub use registry::{JobDefinition, JobListingEntry, JobRegistry, JobRegistryBuilder};
pub use types::{
    InvocationFailure, InvocationRequest, InvocationResult, JobConfig, JobRun, JobStatus,
};

// Re-export async_trait for convenience when implementing JobExecutor
pub use async_trait::async_trait;
