//! Per-request log stage.

use crate::http::middleware::capture::{CompletedExchange, ExchangeObserver};
use crate::observability::logging::{body_as_json, HttpLogEvent, Severity};
use crate::observability::LogShipper;

/// Turns every completed exchange into an `HttpLogEvent` and ships it.
pub struct HttpLogStage {
    shipper: Option<LogShipper>,
}

impl HttpLogStage {
    /// `None` keeps logging local only.
    pub fn new(shipper: Option<LogShipper>) -> Self {
        Self { shipper }
    }
}

/// Build the log event for a completed exchange.
pub fn log_event(exchange: &CompletedExchange) -> HttpLogEvent {
    let status_code = exchange.status.as_u16();
    HttpLogEvent {
        method: exchange.method.to_string(),
        path: exchange.path.clone(),
        status_code,
        required_authorization: exchange.has_authorization,
        request_body: body_as_json(&exchange.request_body),
        response_body: body_as_json(&exchange.response_body),
        severity: Severity::from_status(status_code),
    }
}

impl ExchangeObserver for HttpLogStage {
    fn on_complete(&self, exchange: &CompletedExchange) {
        let event = log_event(exchange);
        tracing::debug!(
            method = %event.method,
            path = %event.path,
            status = event.status_code,
            level = event.severity.as_str(),
            latency_ms = exchange.latency.as_millis() as u64,
            "Request completed"
        );

        if let Some(shipper) = &self.shipper {
            shipper.ship_http(&event);
        }
    }
}
