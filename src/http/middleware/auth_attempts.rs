//! Authentication attempt stage.

use std::sync::Arc;

use crate::http::middleware::capture::{CompletedExchange, ExchangeObserver};
use crate::observability::{MetricAccumulator, Outcome};
use crate::routing::RouteClass;

/// Classifies login attempts by their final status.
pub struct AuthAttemptStage {
    metrics: Arc<MetricAccumulator>,
}

impl AuthAttemptStage {
    pub fn new(metrics: Arc<MetricAccumulator>) -> Self {
        Self { metrics }
    }
}

impl ExchangeObserver for AuthAttemptStage {
    fn on_complete(&self, exchange: &CompletedExchange) {
        if exchange.route_class != RouteClass::AuthAttempt {
            return;
        }
        let outcome = Outcome::from_status(exchange.status.as_u16());
        tracing::debug!(path = %exchange.path, ?outcome, "Authentication attempt");
        self.metrics.increment_auth(outcome);
    }
}
