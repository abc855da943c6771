//! HTTP transport toward the telemetry backend.
//!
//! Both the metrics pusher and the log shipper post through a
//! `TelemetryClient`. Every request is bounded by the configured timeout and
//! authenticated with `Bearer <user_id>:<api_key>`.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use thiserror::Error;

/// A failed transmission. Never propagated past the instrumentation layer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend rejected payload with status {0}")]
    Status(StatusCode),
}

/// Authenticated poster for one telemetry endpoint.
#[derive(Debug, Clone)]
pub struct TelemetryClient {
    http: reqwest::Client,
    url: String,
    credential: String,
}

impl TelemetryClient {
    pub fn new(url: &str, user_id: &str, api_key: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default telemetry HTTP client");
                reqwest::Client::new()
            });

        Self {
            http,
            url: url.to_string(),
            credential: format!("{user_id}:{api_key}"),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `body`, treating any non-2xx status as a failure.
    pub async fn post(&self, body: String, content_type: &str) -> Result<(), TransportError> {
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.credential)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::Status(status))
        }
    }
}
