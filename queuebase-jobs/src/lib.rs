//! Built-in jobs for the Queuebase gateway.
//!
//! The server binary registers these so a fresh deployment has something to
//! list and invoke. Embedding applications usually build their own
//! [`JobRegistry`](queuebase_job_queue::JobRegistry) instead.
//!
//! # Job Types
//!
//! - `sendEmail` - Validate and log an outbound email (default config `{ "retries": 3 }`)
//! - `noop` - Complete immediately
//!
//! # Usage
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use queuebase_job_queue::JobRegistry;
//! use queuebase_jobs::register_builtin_jobs;
//!
//! let registry = register_builtin_jobs(JobRegistry::builder(), &BTreeMap::new())
//!     .build()
//!     .unwrap();
//! assert!(registry.contains("sendEmail"));
//! ```

mod email;

pub use email::{SendEmailExecutor, SendEmailPayload};

use std::collections::BTreeMap;

use queuebase_job_queue::{JobRegistryBuilder, NoOpExecutor};
use serde_json::{json, Value};

/// Job name constants for type-safe job references.
pub mod job_names {
    pub const SEND_EMAIL: &str = "sendEmail";
    pub const NOOP: &str = "noop";
}

/// Register every built-in job with `builder`.
///
/// `overrides` maps job names to config objects whose keys are layered over
/// the built-in defaults. Entries for unknown jobs are ignored.
pub fn register_builtin_jobs(
    builder: JobRegistryBuilder,
    overrides: &BTreeMap<String, Value>,
) -> JobRegistryBuilder {
    builder
        .job(
            job_names::SEND_EMAIL,
            merged_config(json!({ "retries": 3 }), overrides.get(job_names::SEND_EMAIL)),
            SendEmailExecutor::new(),
        )
        .job(
            job_names::NOOP,
            merged_config(json!({}), overrides.get(job_names::NOOP)),
            NoOpExecutor,
        )
}

fn merged_config(mut base: Value, overlay: Option<&Value>) -> Value {
    if let (Value::Object(base_map), Some(Value::Object(extra))) = (&mut base, overlay) {
        for (key, value) in extra {
            base_map.insert(key.clone(), value.clone());
        }
    }
    base
}
