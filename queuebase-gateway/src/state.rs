use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use queuebase_auth::RequestAuthenticator;
use queuebase_config::GatewayConfig;
use queuebase_job_queue::{JobRegistry, RequestHandlerPipeline};

use crate::reporter::{GatewayReporter, TracingReporter};

/// Largest invoke body read into memory unless configured otherwise.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Shared state passed to both gateway operations.
///
/// Everything inside is read-only after construction, so a single instance
/// serves any number of concurrent requests.
#[derive(Clone)]
pub struct GatewayState {
    registry: JobRegistry,
    authenticator: RequestAuthenticator,
    pipeline: RequestHandlerPipeline,
    reporter: Arc<dyn GatewayReporter>,
    body_limit: usize,
}

impl fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayState")
            .field("registry", &self.registry)
            .field("pipeline", &self.pipeline)
            .field("reporter", &"<dyn GatewayReporter>")
            .field("body_limit", &self.body_limit)
            .finish()
    }
}

impl GatewayState {
    pub fn new(registry: JobRegistry, authenticator: RequestAuthenticator) -> Self {
        let pipeline = RequestHandlerPipeline::build(registry.clone(), authenticator.clone());
        Self {
            registry,
            authenticator,
            pipeline,
            reporter: Arc::new(TracingReporter),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Build state with limits and timeout taken from configuration.
    pub fn from_config(
        registry: JobRegistry,
        authenticator: RequestAuthenticator,
        cfg: &GatewayConfig,
    ) -> Self {
        let state = Self::new(registry, authenticator).with_body_limit(cfg.body_limit_bytes);
        match cfg.invocation_timeout() {
            Some(timeout) => state.with_timeout(timeout),
            None => state,
        }
    }

    pub fn with_reporter(self, reporter: impl GatewayReporter) -> Self {
        self.with_shared_reporter(Arc::new(reporter))
    }

    pub fn with_shared_reporter(mut self, reporter: Arc<dyn GatewayReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.pipeline = self.pipeline.with_timeout(timeout);
        self
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    #[inline]
    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    #[inline]
    pub fn authenticator(&self) -> &RequestAuthenticator {
        &self.authenticator
    }

    #[inline]
    pub fn pipeline(&self) -> &RequestHandlerPipeline {
        &self.pipeline
    }

    #[inline]
    pub fn reporter(&self) -> &dyn GatewayReporter {
        self.reporter.as_ref()
    }

    #[inline]
    pub fn body_limit(&self) -> usize {
        self.body_limit
    }
}
