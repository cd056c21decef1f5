use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::GatewayError;
use crate::reporter::Operation;
use crate::request::GatewayRequest;
use crate::state::GatewayState;

/// GET {gateway.path}
/// List every registered job as `{ name, ...config }`.
///
/// The request carries no body, so the signature covers an empty payload.
pub async fn list_jobs(state: &GatewayState, request: impl Into<GatewayRequest>) -> Response {
    let request = request.into().into_request();

    if let Err(err) = state.authenticator().authenticate(request.headers(), b"") {
        state.reporter().report_auth_failure(Operation::List, &err);
        return GatewayError::Unauthorized.into_response();
    }

    match serde_json::to_vec(&state.registry().listing()) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(err) => {
            tracing::error!(%err, "failed to serialize job listing");
            GatewayError::Internal.into_response()
        }
    }
}
