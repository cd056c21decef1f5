use std::sync::Arc;

use axum::extract::{Extension, Request};
use axum::response::{IntoResponse, Response};
use axum::{http::StatusCode, routing::get, Router};
use queuebase_config::HEALTH_PATH;
use tower_http::trace::TraceLayer;

use crate::handlers::jobs::{invoke_job, list_jobs};
use crate::state::GatewayState;

/// Build the gateway router.
///
/// `path` serves both operations: GET lists jobs, POST invokes one.
///
/// # Panics
///
/// Panics if `path` is not a route axum accepts or collides with
/// [`HEALTH_PATH`]. `queuebase_config::validate_config` rejects both.
pub fn build_router(state: Arc<GatewayState>, path: &str) -> Router {
    Router::new()
        .route(path, get(list_route).post(invoke_route))
        .route(HEALTH_PATH, get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}

async fn list_route(Extension(state): Extension<Arc<GatewayState>>, request: Request) -> Response {
    list_jobs(&state, request).await
}

async fn invoke_route(
    Extension(state): Extension<Arc<GatewayState>>,
    request: Request,
) -> Response {
    invoke_job(&state, request).await
}

async fn health_handler() -> impl IntoResponse {
    // Liveness: always return 200 OK when process is alive.
    (StatusCode::OK, "OK")
}
