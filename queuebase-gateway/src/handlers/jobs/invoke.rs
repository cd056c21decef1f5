use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use queuebase_job_queue::{InvocationFailure, InvocationResult};

use crate::error::GatewayError;
use crate::reporter::Operation;
use crate::request::GatewayRequest;
use crate::state::GatewayState;

/// POST {gateway.path}
/// Authenticate the body and run the job it names.
///
/// Every failure, authentication included, answers `500` with an empty body.
pub async fn invoke_job(state: &GatewayState, request: impl Into<GatewayRequest>) -> Response {
    let (parts, body) = request.into().into_request().into_parts();

    let result = match axum::body::to_bytes(body, state.body_limit()).await {
        Ok(bytes) => state.pipeline().run(&parts.headers, &bytes).await,
        Err(err) => InvocationResult::rejected(
            None,
            InvocationFailure::MalformedRequest(format!("unreadable body: {err}")),
        ),
    };

    if result.success {
        state.reporter().report_success(&result);
        return StatusCode::NO_CONTENT.into_response();
    }

    match &result.failure {
        Some(InvocationFailure::Unauthenticated(err)) => {
            state.reporter().report_auth_failure(Operation::Invoke, err)
        }
        _ => state.reporter().report_execution_failure(&result),
    }
    GatewayError::InvocationFailed.into_response()
}
