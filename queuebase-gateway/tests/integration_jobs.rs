use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use queuebase_auth::{
    sign_payload, AuthError, HmacSha256Verifier, KeyringValidator, RequestAuthenticator,
    SigningSecret, KEY_ID_HEADER, SIGNATURE_HEADER,
};
use queuebase_gateway::{
    build_router, invoke_job, list_jobs, GatewayReporter, GatewayState, Operation,
    WrappedRequest,
};
use queuebase_job_queue::{
    executor_fn, InvocationFailure, InvocationResult, JobQueueError, JobRegistry,
};
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "test-secret";
const PATH: &str = "/api/queuebase";

fn sign(payload: &[u8]) -> String {
    sign_payload(payload, &SigningSecret::from(SECRET))
}

fn counting_registry(counter: Arc<AtomicUsize>) -> JobRegistry {
    JobRegistry::builder()
        .job(
            "sendEmail",
            json!({"retries": 3}),
            executor_fn(move |_payload: Value| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
        )
        .build()
        .unwrap()
}

fn failing_registry() -> JobRegistry {
    JobRegistry::builder()
        .job(
            "broken",
            json!({}),
            executor_fn(|_payload: Value| async move {
                Err(JobQueueError::execution_failed("smtp unavailable"))
            }),
        )
        .build()
        .unwrap()
}

fn router_for(state: GatewayState) -> Router {
    build_router(Arc::new(state), PATH)
}

fn default_router() -> (Router, Arc<AtomicUsize>) {
    let counter = Arc::new(AtomicUsize::new(0));
    let state = GatewayState::new(
        counting_registry(counter.clone()),
        RequestAuthenticator::from_secret(SECRET),
    );
    (router_for(state), counter)
}

fn list_request(signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(PATH);
    if let Some(sig) = signature {
        builder = builder.header(SIGNATURE_HEADER, sig);
    }
    builder.body(Body::empty()).unwrap()
}

fn invoke_request(body: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(PATH)
        .header("content-type", "application/json");
    if let Some(sig) = signature {
        builder = builder.header(SIGNATURE_HEADER, sig);
    }
    builder.body(Body::from(body.to_owned())).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[derive(Clone, Default)]
struct RecordingReporter {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl GatewayReporter for RecordingReporter {
    fn report_auth_failure(&self, operation: Operation, _error: &AuthError) {
        self.events.lock().unwrap().push(format!("auth:{operation}"));
    }

    fn report_execution_failure(&self, result: &InvocationResult) {
        let failure = match &result.failure {
            Some(InvocationFailure::JobNotFound(_)) => "not_found",
            Some(InvocationFailure::HandlerFailed(_)) => "handler",
            Some(InvocationFailure::MalformedRequest(_)) => "malformed",
            Some(InvocationFailure::TimedOut(_)) => "timeout",
            _ => "other",
        };
        self.events.lock().unwrap().push(format!("failure:{failure}"));
    }

    fn report_success(&self, result: &InvocationResult) {
        self.events.lock().unwrap().push(format!(
            "success:{}",
            result.job_name.as_deref().unwrap_or("-")
        ));
    }
}

#[tokio::test]
async fn list_with_valid_signature_returns_registry() {
    let (router, counter) = default_router();

    let response = router.oneshot(list_request(Some(&sign(b"")))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(
        body_string(response).await,
        r#"[{"name":"sendEmail","retries":3}]"#
    );
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn list_rejects_bad_signatures_with_empty_401() {
    let (router, _) = default_router();
    let wrong_secret = sign_payload(b"", &SigningSecret::from("other-secret"));
    let signed_other_payload = sign(b"{}");

    for signature in [
        None,
        Some("not-hex"),
        Some(wrong_secret.as_str()),
        Some(signed_other_payload.as_str()),
    ] {
        let response = router
            .clone()
            .oneshot(list_request(signature))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_string(response).await, "");
    }
}

#[tokio::test]
async fn list_is_stable_across_calls() {
    let (router, _) = default_router();
    let sig = sign(b"");

    let first = body_string(router.clone().oneshot(list_request(Some(&sig))).await.unwrap()).await;
    let second = body_string(router.oneshot(list_request(Some(&sig))).await.unwrap()).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn invoke_runs_job_once_and_returns_204() {
    let (router, counter) = default_router();
    let body = r#"{"name":"sendEmail","payload":{"to":"a@example.com"}}"#;

    let response = router
        .oneshot(invoke_request(body, Some(&sign(body.as_bytes()))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(body_string(response).await, "");
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn invoke_auth_failure_returns_500_without_running() {
    let (router, counter) = default_router();
    let body = r#"{"name":"sendEmail"}"#;
    let tampered_sig = sign(br#"{"name":"noop"}"#);

    for signature in [None, Some(tampered_sig.as_str())] {
        let response = router
            .clone()
            .oneshot(invoke_request(body, signature))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "");
    }
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invoke_unknown_job_returns_500() {
    let (router, counter) = default_router();
    let body = r#"{"name":"doesNotExist"}"#;

    let response = router
        .oneshot(invoke_request(body, Some(&sign(body.as_bytes()))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invoke_handler_failure_returns_500() {
    let state = GatewayState::new(failing_registry(), RequestAuthenticator::from_secret(SECRET));
    let body = r#"{"name":"broken","payload":null}"#;

    let response = router_for(state)
        .oneshot(invoke_request(body, Some(&sign(body.as_bytes()))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, "");
}

#[tokio::test]
async fn invoke_body_over_limit_returns_500() {
    let counter = Arc::new(AtomicUsize::new(0));
    let state = GatewayState::new(
        counting_registry(counter.clone()),
        RequestAuthenticator::from_secret(SECRET),
    )
    .with_body_limit(8);
    let body = r#"{"name":"sendEmail"}"#;

    let response = router_for(state)
        .oneshot(invoke_request(body, Some(&sign(body.as_bytes()))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invoke_slow_handler_times_out() {
    let registry = JobRegistry::builder()
        .job(
            "slow",
            json!({}),
            executor_fn(|_payload: Value| async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            }),
        )
        .build()
        .unwrap();
    let reporter = RecordingReporter::default();
    let state = GatewayState::new(registry, RequestAuthenticator::from_secret(SECRET))
        .with_timeout(Duration::from_millis(50))
        .with_reporter(reporter.clone());
    let body = r#"{"name":"slow"}"#;

    let response = router_for(state)
        .oneshot(invoke_request(body, Some(&sign(body.as_bytes()))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reporter.events(), ["failure:timeout"]);
}

#[tokio::test]
async fn reporter_sees_every_outcome() {
    let counter = Arc::new(AtomicUsize::new(0));
    let reporter = RecordingReporter::default();
    let state = GatewayState::new(
        counting_registry(counter),
        RequestAuthenticator::from_secret(SECRET),
    )
    .with_reporter(reporter.clone());
    let router = router_for(state);

    let ok = r#"{"name":"sendEmail"}"#;
    let missing = r#"{"name":"nope"}"#;
    let malformed = "not json";

    router.clone().oneshot(list_request(None)).await.unwrap();
    router
        .clone()
        .oneshot(invoke_request(ok, Some("deadbeef")))
        .await
        .unwrap();
    router
        .clone()
        .oneshot(invoke_request(ok, Some(&sign(ok.as_bytes()))))
        .await
        .unwrap();
    router
        .clone()
        .oneshot(invoke_request(missing, Some(&sign(missing.as_bytes()))))
        .await
        .unwrap();
    router
        .oneshot(invoke_request(malformed, Some(&sign(malformed.as_bytes()))))
        .await
        .unwrap();

    assert_eq!(
        reporter.events(),
        [
            "auth:list",
            "auth:invoke",
            "success:sendEmail",
            "failure:not_found",
            "failure:malformed",
        ]
    );
}

#[tokio::test]
async fn wrapped_request_is_handled_like_raw() {
    let counter = Arc::new(AtomicUsize::new(0));
    let state = GatewayState::new(
        counting_registry(counter),
        RequestAuthenticator::from_secret(SECRET),
    );

    let raw = list_jobs(&state, list_request(Some(&sign(b"")))).await;
    let wrapped = list_jobs(
        &state,
        WrappedRequest::new(list_request(Some(&sign(b"")))),
    )
    .await;

    assert_eq!(raw.status(), StatusCode::OK);
    assert_eq!(wrapped.status(), StatusCode::OK);
    assert_eq!(body_string(raw).await, body_string(wrapped).await);
}

fn with_key_id(mut request: Request<Body>, key_id: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert(KEY_ID_HEADER, key_id.parse().unwrap());
    request
}

/// Keyring holding only key "a", with no default secret.
fn keyring_router() -> (Router, Arc<AtomicUsize>) {
    let counter = Arc::new(AtomicUsize::new(0));
    let authenticator = RequestAuthenticator::new(
        KeyringValidator::new().with_key("a", SECRET),
        HmacSha256Verifier,
    );
    let state = GatewayState::new(counting_registry(counter.clone()), authenticator);
    (router_for(state), counter)
}

#[tokio::test]
async fn list_with_unresolvable_key_returns_empty_401() {
    let (router, _) = keyring_router();
    let sig = sign(b"");

    let response = router
        .clone()
        .oneshot(with_key_id(list_request(Some(&sig)), "a"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    for request in [
        list_request(Some(&sig)),
        with_key_id(list_request(Some(&sig)), "b"),
    ] {
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_string(response).await, "");
    }
}

#[tokio::test]
async fn invoke_with_unresolvable_key_returns_empty_500() {
    let (router, counter) = keyring_router();
    let body = r#"{"name":"sendEmail"}"#;
    let sig = sign(body.as_bytes());

    for request in [
        invoke_request(body, Some(&sig)),
        with_key_id(invoke_request(body, Some(&sig)), "b"),
    ] {
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "");
    }
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    let response = router
        .oneshot(with_key_id(invoke_request(body, Some(&sig)), "a"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn wrapped_invoke_runs_job_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let state = GatewayState::new(
        counting_registry(counter.clone()),
        RequestAuthenticator::from_secret(SECRET),
    );
    let body = r#"{"name":"sendEmail","payload":{"to":"a@example.com"}}"#;

    let response = invoke_job(
        &state,
        WrappedRequest::new(invoke_request(body, Some(&sign(body.as_bytes())))),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(body_string(response).await, "");
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn router_accepts_validated_gateway_path() {
    let mut cfg = queuebase_config::Config::default();
    cfg.auth.secret_key = Some(SECRET.into());
    cfg.gateway.path = "/hooks/queuebase".into();
    queuebase_config::validate_config(&cfg).unwrap();

    let counter = Arc::new(AtomicUsize::new(0));
    let state = GatewayState::from_config(
        counting_registry(counter),
        RequestAuthenticator::from_secret(SECRET),
        &cfg.gateway,
    );
    let response = build_router(Arc::new(state), &cfg.gateway.path)
        .oneshot(
            Request::get("/hooks/queuebase")
                .header(SIGNATURE_HEADER, sign(b""))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_is_unauthenticated() {
    let (router, _) = default_router();
    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
