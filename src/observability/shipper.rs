//! Per-request log dispatch.
//!
//! Each event is serialized, wrapped in a streams envelope, scrubbed by the
//! redactor as a whole and posted on its own task. The caller never waits for
//! the backend.

use std::time::Duration;

use serde::Serialize;

use crate::config::LoggingConfig;
use crate::observability::logging::{ExceptionLogEvent, HttpLogEvent, Severity};
use crate::observability::records::{timestamp_ns, LogEnvelope, StreamLabels};
use crate::observability::redact::redact_passwords;
use crate::observability::transport::TelemetryClient;

/// Stream `type` label of request logs.
pub const HTTP_LOG_TYPE: &str = "http";
/// Stream `type` label of handler panics.
pub const EXCEPTION_LOG_TYPE: &str = "exception";

#[derive(Debug, Clone)]
pub struct LogShipper {
    client: TelemetryClient,
    component: String,
}

impl LogShipper {
    pub fn new(config: &LoggingConfig, timeout: Duration) -> Self {
        Self {
            client: TelemetryClient::new(&config.url, &config.user_id, &config.api_key, timeout),
            component: config.source.clone(),
        }
    }

    /// Build the redacted payload for one log line.
    pub fn render<T: Serialize>(
        &self,
        severity: Severity,
        kind: &str,
        line: &T,
    ) -> Result<String, serde_json::Error> {
        let labels = StreamLabels {
            component: &self.component,
            level: severity.as_str(),
            kind,
        };
        let envelope = LogEnvelope::new(labels, timestamp_ns(), serde_json::to_string(line)?);
        Ok(redact_passwords(&serde_json::to_string(&envelope)?))
    }

    /// Ship a request log without waiting for the backend.
    pub fn ship_http(&self, event: &HttpLogEvent) {
        self.ship(event.severity, HTTP_LOG_TYPE, event);
    }

    /// Ship a handler panic; it surfaces as a 500, so it is logged at `warn`.
    pub fn ship_exception(&self, event: &ExceptionLogEvent) {
        self.ship(Severity::from_status(500), EXCEPTION_LOG_TYPE, event);
    }

    /// Ship any serializable log line without waiting for the backend.
    pub fn ship<T: Serialize>(&self, severity: Severity, kind: &str, line: &T) {
        let payload = match self.render(severity, kind, line) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, kind, "Failed to serialize log event");
                return;
            }
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(kind, "No runtime to send log on, dropped");
            return;
        };
        let client = self.client.clone();
        runtime.spawn(async move {
            if let Err(e) = client.post(payload, "application/json").await {
                tracing::warn!(url = %client.url(), error = %e, "Failed to send log to backend");
            }
        });
    }
}
