//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap the business `Router` with the instrumentation stages
//! - Wire up middleware (tracing, request ID, panic reporting)
//! - Own the metric accumulator and the telemetry flusher
//! - Serve until shutdown, then let the flusher send its last window

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::http::middleware::{
    capture_exchange, ActiveUserStage, AuthAttemptStage, HttpLogStage, Instrumentation,
    OrderStage, PanicReporter, RequestCountStage,
};
use crate::lifecycle::Shutdown;
use crate::observability::{HostSampler, LogShipper, MetricAccumulator, SystemSampler, TelemetryFlusher};
use crate::routing::RouteClassifier;

/// HTTP server for the pizza service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
    metrics: Arc<MetricAccumulator>,
    flusher: TelemetryFlusher,
}

impl HttpServer {
    /// Instrument `api` and sample the local host for system metrics.
    pub fn new(config: ServiceConfig, api: Router) -> Self {
        Self::with_sampler(config, api, Arc::new(HostSampler::new()))
    }

    /// Instrument `api` with an explicit host sampler.
    pub fn with_sampler(config: ServiceConfig, api: Router, sampler: Arc<dyn SystemSampler>) -> Self {
        let metrics = Arc::new(MetricAccumulator::new());
        let timeout = Duration::from_secs(config.telemetry.timeout_secs);
        let shipper = config
            .logging
            .enabled
            .then(|| LogShipper::new(&config.logging, timeout));

        let instrumentation = Arc::new(Self::instrumentation(&config, metrics.clone(), shipper.clone()));
        let flusher = TelemetryFlusher::new(&config.metrics, timeout, metrics.clone(), sampler);
        let router = Self::build_router(api, instrumentation, PanicReporter::new(shipper));

        Self {
            router,
            config,
            metrics,
            flusher,
        }
    }

    /// Register the stages in their fixed order.
    pub fn instrumentation(
        config: &ServiceConfig,
        metrics: Arc<MetricAccumulator>,
        shipper: Option<LogShipper>,
    ) -> Instrumentation {
        Instrumentation::new(
            RouteClassifier::from_config(&config.routes),
            config.listener.max_body_bytes,
        )
        .observe(Arc::new(HttpLogStage::new(shipper)))
        .observe(Arc::new(RequestCountStage::new(metrics.clone())))
        .observe(Arc::new(ActiveUserStage::new(metrics.clone())))
        .observe(Arc::new(AuthAttemptStage::new(metrics.clone())))
        .observe(Arc::new(OrderStage::new(metrics)))
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(api: Router, instrumentation: Arc<Instrumentation>, panics: PanicReporter) -> Router {
        api.route("/health", get(health))
            .layer(CatchPanicLayer::custom(move |payload: Box<dyn Any + Send + 'static>| {
                panics.report(payload)
            }))
            .layer(from_fn_with_state(instrumentation, capture_exchange))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Replace the flush interval (tests, short-lived tools).
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flusher = self.flusher.with_interval(interval);
        self
    }

    /// Run the server until `shutdown` fires, then wait for the final flush.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let Self { router, config, flusher, .. } = self;
        let flusher_task = tokio::spawn(flusher.run(shutdown.subscribe()));

        let mut server_shutdown = shutdown.subscribe();
        let served = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.recv().await;
            })
            .await;

        // Stops the flusher too when serving ended on its own.
        shutdown.trigger();

        let grace = shutdown_grace(config.telemetry.timeout_secs);
        match tokio::time::timeout(grace, flusher_task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Telemetry flusher task failed"),
            Err(_) => tracing::warn!(grace = ?grace, "Final metrics flush did not finish in time"),
        }

        tracing::info!("HTTP server stopped");
        served
    }

    /// Instrumented router, for driving the service without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn metrics(&self) -> Arc<MetricAccumulator> {
        self.metrics.clone()
    }
}

/// How long `run` waits for the final flush: one transmission plus a second.
fn shutdown_grace(timeout_secs: u64) -> Duration {
    Duration::from_secs(timeout_secs.saturating_add(1))
}

async fn health() -> &'static str {
    "ok"
}
