//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the local tracing subscriber (the fallback channel for
//!   telemetry failures)
//! - Define the per-request and panic log events shipped to the remote backend
//! - Map HTTP status codes to log severity

use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},tower_http=debug")));

    // A second initialization (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Coarse log level derived from an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
    Warn,
}

impl Severity {
    /// 5xx → warn, 4xx → error, anything else → info.
    pub fn from_status(status: u16) -> Self {
        if status >= 500 {
            Severity::Warn
        } else if status >= 400 {
            Severity::Error
        } else {
            Severity::Info
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Error => "error",
            Severity::Warn => "warn",
        }
    }
}

/// One completed request, as shipped to the log backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpLogEvent {
    pub method: String,
    pub path: String,
    pub status_code: u16,
    pub required_authorization: bool,
    /// Request payload as serialized JSON text.
    pub request_body: String,
    /// Response payload as serialized JSON text.
    pub response_body: String,
    /// Carried as the stream `level` label, not inside the line.
    #[serde(skip)]
    pub severity: Severity,
}

/// A handler panic, as shipped to the log backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExceptionLogEvent {
    pub message: String,
}

/// Render a captured body as JSON text.
///
/// JSON bodies are re-serialized compactly, other text is encoded as a JSON
/// string, and an empty body is logged as `{}`.
pub fn body_as_json(bytes: &[u8]) -> String {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return "{}".to_string();
    }
    match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(value) => value.to_string(),
        Err(_) => serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned()).to_string(),
    }
}
