//! Inbound request normalization.

use axum::extract::Request;

/// A transport request wrapped in an envelope, as some hosting platforms
/// deliver it (`{ request }`).
#[derive(Debug)]
pub struct WrappedRequest {
    pub request: Request,
}

impl WrappedRequest {
    pub fn new(request: Request) -> Self {
        Self { request }
    }
}

/// Either shape a gateway operation accepts. Normalized exactly once, at the
/// start of each operation, via [`GatewayRequest::into_request`].
#[derive(Debug)]
pub enum GatewayRequest {
    Raw(Request),
    Wrapped(WrappedRequest),
}

impl GatewayRequest {
    pub fn into_request(self) -> Request {
        match self {
            Self::Raw(request) => request,
            Self::Wrapped(wrapped) => wrapped.request,
        }
    }
}

impl From<Request> for GatewayRequest {
    fn from(request: Request) -> Self {
        Self::Raw(request)
    }
}

impl From<WrappedRequest> for GatewayRequest {
    fn from(wrapped: WrappedRequest) -> Self {
        Self::Wrapped(wrapped)
    }
}
