//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the pizza service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// Remote metrics endpoint and flush cadence.
    pub metrics: MetricsConfig,

    /// Remote log endpoint and local log level.
    pub logging: LoggingConfig,

    /// Outbound transmission settings shared by metrics and logs.
    pub telemetry: TelemetryConfig,

    /// Route classification used by the auth and order stages.
    pub routes: RouteClassConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Largest request body accepted, and the most of each response body kept
    /// for the stages. Responses themselves are never limited.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Remote metrics endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Push metrics to the remote endpoint.
    pub enabled: bool,

    /// Metrics push URL (line protocol).
    pub url: String,

    /// Value of the `source` label on every metric.
    pub source: String,

    /// User identifier half of the bearer credential.
    pub user_id: String,

    /// API key half of the bearer credential.
    pub api_key: String,

    /// Seconds between flush ticks.
    pub flush_interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "http://127.0.0.1:8086/api/v1/push/influx/write".to_string(),
            source: "jwt-pizza-service".to_string(),
            user_id: String::new(),
            api_key: String::new(),
            flush_interval_secs: 10,
        }
    }
}

/// Remote log endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Ship request logs to the remote endpoint.
    pub enabled: bool,

    /// Log push URL (Loki-style streams envelope).
    pub url: String,

    /// Value of the `component` stream label.
    pub source: String,

    /// User identifier half of the bearer credential.
    pub user_id: String,

    /// API key half of the bearer credential.
    pub api_key: String,

    /// Local log level (trace, debug, info, warn, error).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "http://127.0.0.1:3100/loki/api/v1/push".to_string(),
            source: "jwt-pizza-service".to_string(),
            user_id: String::new(),
            api_key: String::new(),
            level: "info".to_string(),
        }
    }
}

/// Outbound transmission settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Upper bound on a single transmission, in seconds.
    pub timeout_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { timeout_secs: 5 }
    }
}

/// Suffix rules applied to routes that were not tagged at registration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouteClassConfig {
    /// Path suffix of the login endpoint (matched with PUT).
    pub auth_suffix: String,

    /// Path suffix of the order-creation endpoint (matched with POST).
    pub order_suffix: String,

    /// Classify untagged routes by method and path suffix.
    pub suffix_fallback: bool,
}

impl Default for RouteClassConfig {
    fn default() -> Self {
        Self {
            auth_suffix: "/api/auth".to_string(),
            order_suffix: "/api/order".to_string(),
            suffix_fallback: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [metrics]
            url = "https://metrics.example.com/push"
            user_id = "1234"
            api_key = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.metrics.url, "https://metrics.example.com/push");
        assert_eq!(config.metrics.flush_interval_secs, 10);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.routes.auth_suffix, "/api/auth");
        assert_eq!(config.telemetry.timeout_secs, 5);
    }
}
