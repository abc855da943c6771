//! Pizza order stage.
//!
//! Reads the order echoed back in the *response* body, which carries the
//! persisted line items and their authoritative prices.

use std::sync::Arc;

use serde_json::Value;

use crate::http::middleware::capture::{CompletedExchange, ExchangeObserver};
use crate::observability::{MetricAccumulator, Outcome};
use crate::routing::RouteClass;

/// Counts pizza line items and revenue for order-creation requests.
pub struct OrderStage {
    metrics: Arc<MetricAccumulator>,
}

impl OrderStage {
    pub fn new(metrics: Arc<MetricAccumulator>) -> Self {
        Self { metrics }
    }
}

/// Prices of the line items under `order.items`; empty when the body has no
/// such list. Items without a numeric price count at 0.
pub fn line_item_prices(body: &[u8]) -> Vec<f64> {
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        return Vec::new();
    };
    value
        .pointer("/order/items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| item.get("price").and_then(Value::as_f64).unwrap_or(0.0))
                .collect()
        })
        .unwrap_or_default()
}

impl ExchangeObserver for OrderStage {
    fn on_complete(&self, exchange: &CompletedExchange) {
        if exchange.route_class != RouteClass::OrderCreation {
            return;
        }
        let outcome = Outcome::from_status(exchange.status.as_u16());
        if exchange.response_truncated {
            tracing::warn!(path = %exchange.path, "Order response exceeded the capture limit, items not counted");
        }
        let prices = line_item_prices(&exchange.response_body);
        if prices.is_empty() {
            tracing::debug!(status = exchange.status.as_u16(), "Order response carried no line items");
        }
        self.metrics.accumulate_pizza(outcome, &prices);
        self.metrics.record_pizza_latency(exchange.latency);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_item_prices() {
        let body = br#"{"order":{"franchiseId":1,"items":[{"menuId":1,"price":5.0},{"price":3.5},{"price":2}]},"jwt":"x"}"#;
        assert_eq!(line_item_prices(body), vec![5.0, 3.5, 2.0]);
    }

    #[test]
    fn test_missing_or_malformed_items() {
        assert!(line_item_prices(br#"{"message":"Failed to fulfill order at factory"}"#).is_empty());
        assert!(line_item_prices(br#"{"order":{"items":"none"}}"#).is_empty());
        assert!(line_item_prices(b"not json").is_empty());
        assert!(line_item_prices(b"").is_empty());
        assert_eq!(line_item_prices(br#"{"order":{"items":[{"description":"Veggie"}]}}"#), vec![0.0]);
    }
}
