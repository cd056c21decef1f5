//! Signed HTTP gateway for a Queuebase job registry.
//!
//! Two operations share one route: GET lists the registered jobs and POST
//! invokes one. Both authenticate the caller with an HMAC signature in the
//! `X-Queuebase-Signature` header before touching the registry.

pub mod app;
pub mod error;
pub mod handlers;
pub mod reporter;
pub mod request;
pub mod state;

pub use app::build_router;
pub use handlers::jobs::{invoke_job, list_jobs};
pub use reporter::{GatewayReporter, Operation, TracingReporter};
pub use request::{GatewayRequest, WrappedRequest};
pub use state::GatewayState;
