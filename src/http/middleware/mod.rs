//! Instrumentation middleware.
//!
//! `capture.rs` is the single interception point; the other modules are the
//! stages it notifies for every completed request. `panics.rs` reports
//! handler panics before they are turned into a 500.

pub mod active_users;
pub mod auth_attempts;
pub mod capture;
pub mod http_log;
pub mod panics;
pub mod pizza_orders;
pub mod request_count;

pub use active_users::ActiveUserStage;
pub use auth_attempts::AuthAttemptStage;
pub use capture::{capture_exchange, CompletedExchange, ExchangeObserver, Instrumentation};
pub use http_log::HttpLogStage;
pub use panics::PanicReporter;
pub use pizza_orders::OrderStage;
pub use request_count::RequestCountStage;
