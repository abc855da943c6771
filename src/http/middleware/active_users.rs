//! Active user stage.

use std::sync::Arc;

use crate::http::middleware::capture::{CompletedExchange, ExchangeObserver};
use crate::observability::{MetricAccumulator, Outcome};

/// Counts each credential that completes a successful request in the window.
///
/// Rejected credentials (any status of 400 or above) are not users.
pub struct ActiveUserStage {
    metrics: Arc<MetricAccumulator>,
}

impl ActiveUserStage {
    pub fn new(metrics: Arc<MetricAccumulator>) -> Self {
        Self { metrics }
    }
}

impl ExchangeObserver for ActiveUserStage {
    fn on_complete(&self, exchange: &CompletedExchange) {
        let Some(credential) = exchange.credential else {
            return;
        };
        if Outcome::from_status(exchange.status.as_u16()) == Outcome::Success {
            self.metrics.record_active_user(credential);
        }
    }
}
