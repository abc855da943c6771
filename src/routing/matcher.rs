//! Route class matching for untagged routes.
//!
//! # Responsibilities
//! - Match request method (exact)
//! - Match path suffix (case-sensitive)
//! - Combine both with AND semantics
//!
//! # Design Decisions
//! - Only consulted when a route carries no tag
//! - Suffix matching ignores a single trailing slash
//! - No regex; `ends_with` on the raw path

use axum::http::Method;

use crate::config::RouteClassConfig;
use crate::routing::RouteClass;

/// Matches a method plus a path suffix.
#[derive(Debug, Clone)]
pub struct SuffixMatcher {
    method: Method,
    suffix: String,
}

impl SuffixMatcher {
    pub fn new(method: Method, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        Self {
            method,
            suffix: suffix.trim_end_matches('/').to_string(),
        }
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        *method == self.method && path.trim_end_matches('/').ends_with(&self.suffix)
    }
}

/// Resolves the class of a completed request.
#[derive(Debug, Clone)]
pub struct RouteClassifier {
    auth: SuffixMatcher,
    order: SuffixMatcher,
    suffix_fallback: bool,
}

impl RouteClassifier {
    pub fn from_config(config: &RouteClassConfig) -> Self {
        Self {
            auth: SuffixMatcher::new(Method::PUT, config.auth_suffix.as_str()),
            order: SuffixMatcher::new(Method::POST, config.order_suffix.as_str()),
            suffix_fallback: config.suffix_fallback,
        }
    }

    /// A registration tag wins; otherwise fall back to suffix rules if enabled.
    pub fn resolve(&self, tag: Option<RouteClass>, method: &Method, path: &str) -> RouteClass {
        if let Some(class) = tag {
            return class;
        }
        if !self.suffix_fallback {
            return RouteClass::Other;
        }
        if self.auth.matches(method, path) {
            RouteClass::AuthAttempt
        } else if self.order.matches(method, path) {
            RouteClass::OrderCreation
        } else {
            RouteClass::Other
        }
    }
}

impl Default for RouteClassifier {
    fn default() -> Self {
        Self::from_config(&RouteClassConfig::default())
    }
}
