//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. Validation is a pure
//! function that reports every problem, not just the first.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid bind address {value:?}")]
    BindAddress { field: &'static str, value: String },

    #[error("{field}: {value:?} is not an absolute http(s) URL")]
    Endpoint { field: &'static str, value: String },

    #[error("{field}: must not be empty")]
    Empty { field: &'static str },

    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field}: {value:?} must start with '/'")]
    Suffix { field: &'static str, value: String },
}

/// Validate a configuration, collecting all errors.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::Zero { field: "listener.max_body_bytes" });
    }

    if config.metrics.enabled {
        check_endpoint(&mut errors, "metrics.url", &config.metrics.url);
        check_non_empty(&mut errors, "metrics.source", &config.metrics.source);
    }
    if config.metrics.flush_interval_secs == 0 {
        errors.push(ValidationError::Zero { field: "metrics.flush_interval_secs" });
    }

    if config.logging.enabled {
        check_endpoint(&mut errors, "logging.url", &config.logging.url);
        check_non_empty(&mut errors, "logging.source", &config.logging.source);
    }

    if config.telemetry.timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "telemetry.timeout_secs" });
    }

    check_suffix(&mut errors, "routes.auth_suffix", &config.routes.auth_suffix);
    check_suffix(&mut errors, "routes.order_suffix", &config.routes.order_suffix);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_endpoint(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::Endpoint { field, value: value.to_string() });
    }
}

fn check_non_empty(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::Empty { field });
    }
}

fn check_suffix(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if !value.starts_with('/') {
        errors.push(ValidationError::Suffix { field, value: value.to_string() });
    }
}
