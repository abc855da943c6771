//! In-process metric accumulation.
//!
//! # Responsibilities
//! - Count HTTP requests by method
//! - Count authentication outcomes
//! - Count pizza line items and sum revenue by order outcome
//! - Accumulate request and order-creation latency
//! - Track the distinct credentials seen in the window (active users)
//! - Hand the whole window to the flusher and start a new one
//!
//! # Design Decisions
//! - One mutex around the whole counter set, so `total` and the per-method
//!   counters can never be observed out of step
//! - `snapshot_and_reset` swaps the set for a zeroed one under the lock:
//!   every increment lands in exactly one snapshot

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::http::Method;

/// HTTP request counters for one flush window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HttpCounters {
    pub total: u64,
    pub get: u64,
    pub put: u64,
    pub post: u64,
    pub delete: u64,
    pub unknown: u64,
}

impl HttpCounters {
    /// Sum of the per-method counters; equals `total` in every snapshot.
    pub fn classified(&self) -> u64 {
        self.get + self.put + self.post + self.delete + self.unknown
    }
}

/// Authentication attempt counters for one flush window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthCounters {
    pub successes: u64,
    pub failures: u64,
}

/// Pizza line-item counters for one flush window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PizzaCounters {
    /// Line items in orders that succeeded.
    pub creation_successes: u64,
    /// Line items in orders that failed.
    pub creation_failures: u64,
    /// Sum of line-item prices in orders that succeeded.
    pub revenue: f64,
}

/// Latency sums for one flush window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencyCounters {
    pub service_ms_total: f64,
    pub service_samples: u64,
    pub pizza_creation_ms_total: f64,
    pub pizza_creation_samples: u64,
}

impl LatencyCounters {
    /// Mean request latency in milliseconds, 0 without samples.
    pub fn service_avg_ms(&self) -> f64 {
        mean(self.service_ms_total, self.service_samples)
    }

    /// Mean order-creation latency in milliseconds, 0 without samples.
    pub fn pizza_creation_avg_ms(&self) -> f64 {
        mean(self.pizza_creation_ms_total, self.pizza_creation_samples)
    }
}

fn mean(total: f64, samples: u64) -> f64 {
    if samples == 0 {
        0.0
    } else {
        total / samples as f64
    }
}

/// Credentials that made at least one successful request in the window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveUsers {
    seen: HashSet<u64>,
}

impl ActiveUsers {
    pub fn count(&self) -> u64 {
        self.seen.len() as u64
    }
}

/// Every counter of one flush window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricCounterSet {
    pub http: HttpCounters,
    pub auth: AuthCounters,
    pub pizza: PizzaCounters,
    pub latency: LatencyCounters,
    pub users: ActiveUsers,
}

/// Outcome of a request as seen by the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    /// Any status of 400 or above is a failure.
    pub fn from_status(status: u16) -> Self {
        if status >= 400 {
            Outcome::Failure
        } else {
            Outcome::Success
        }
    }
}

/// Process-wide metric accumulator, shared through an `Arc`.
#[derive(Debug, Default)]
pub struct MetricAccumulator {
    counters: Mutex<MetricCounterSet>,
}

impl MetricAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MetricCounterSet> {
        // Counters are plain numbers; a panic mid-update cannot leave them torn.
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count one request. `total` always moves; methods outside
    /// GET/PUT/POST/DELETE land in `unknown`.
    pub fn increment_http(&self, method: &Method) {
        let mut counters = self.lock();
        let http = &mut counters.http;
        http.total += 1;
        match *method {
            Method::GET => http.get += 1,
            Method::PUT => http.put += 1,
            Method::POST => http.post += 1,
            Method::DELETE => http.delete += 1,
            _ => http.unknown += 1,
        }
    }

    /// Count one authentication attempt.
    pub fn increment_auth(&self, outcome: Outcome) {
        let mut counters = self.lock();
        match outcome {
            Outcome::Success => counters.auth.successes += 1,
            Outcome::Failure => counters.auth.failures += 1,
        }
    }

    /// Account for the line items of one order-creation attempt.
    ///
    /// Successful orders add every item to `creation_successes` and their
    /// prices to `revenue`; failed orders only add to `creation_failures`.
    pub fn accumulate_pizza(&self, outcome: Outcome, prices: &[f64]) {
        if prices.is_empty() {
            return;
        }
        let mut counters = self.lock();
        let pizza = &mut counters.pizza;
        match outcome {
            Outcome::Success => {
                pizza.creation_successes += prices.len() as u64;
                pizza.revenue += prices.iter().sum::<f64>();
            }
            Outcome::Failure => pizza.creation_failures += prices.len() as u64,
        }
    }

    /// Record the handling time of one request.
    pub fn record_latency(&self, elapsed: Duration) {
        let mut counters = self.lock();
        counters.latency.service_ms_total += elapsed.as_secs_f64() * 1000.0;
        counters.latency.service_samples += 1;
    }

    /// Record the handling time of one order-creation request.
    pub fn record_pizza_latency(&self, elapsed: Duration) {
        let mut counters = self.lock();
        counters.latency.pizza_creation_ms_total += elapsed.as_secs_f64() * 1000.0;
        counters.latency.pizza_creation_samples += 1;
    }

    /// Mark the credential with fingerprint `credential` as active.
    pub fn record_active_user(&self, credential: u64) {
        self.lock().users.seen.insert(credential);
    }

    /// Return the current window and start a fresh one, as one step.
    pub fn snapshot_and_reset(&self) -> MetricCounterSet {
        std::mem::take(&mut *self.lock())
    }

    /// Read the current window without resetting it.
    pub fn peek(&self) -> MetricCounterSet {
        self.lock().clone()
    }
}
