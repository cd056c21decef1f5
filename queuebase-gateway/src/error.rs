use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

/// Gateway failures as seen by the caller.
///
/// Responses carry a status code and nothing else; details go to the
/// reporter.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GatewayError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("job invocation failed")]
    InvocationFailed,
    #[error("internal error")]
    Internal,
}

impl GatewayError {
    pub fn status(self) -> StatusCode {
        match self {
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::InvocationFailed => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        self.status().into_response()
    }
}
