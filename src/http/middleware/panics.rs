//! Handler panic reporting.
//!
//! Plugged into `CatchPanicLayer::custom`. The panic message goes to the
//! local log and, when log shipping is enabled, to the backend as an
//! `exception` log. The client only sees a generic 500.

use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::observability::{ExceptionLogEvent, LogShipper};

#[derive(Debug, Clone)]
pub struct PanicReporter {
    shipper: Option<LogShipper>,
}

impl PanicReporter {
    pub fn new(shipper: Option<LogShipper>) -> Self {
        Self { shipper }
    }

    /// Report `payload` and build the response sent in place of the handler's.
    pub fn report(&self, payload: Box<dyn Any + Send + 'static>) -> Response {
        let event = ExceptionLogEvent { message: panic_message(payload.as_ref()) };
        tracing::error!(panic = %event.message, "Handler panicked");

        if let Some(shipper) = &self.shipper {
            shipper.ship_exception(&event);
        }

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "internal server error"})),
        )
            .into_response()
    }
}

/// Text of a panic payload; `panic!` produces `&str` or `String`.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
