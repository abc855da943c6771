//! HTTP request counting stage.

use std::sync::Arc;

use crate::http::middleware::capture::{CompletedExchange, ExchangeObserver};
use crate::observability::MetricAccumulator;

/// Counts every request by method and records its latency.
pub struct RequestCountStage {
    metrics: Arc<MetricAccumulator>,
}

impl RequestCountStage {
    pub fn new(metrics: Arc<MetricAccumulator>) -> Self {
        Self { metrics }
    }
}

impl ExchangeObserver for RequestCountStage {
    fn on_complete(&self, exchange: &CompletedExchange) {
        self.metrics.increment_http(&exchange.method);
        self.metrics.record_latency(exchange.latency);
    }
}
