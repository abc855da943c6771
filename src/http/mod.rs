//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, trace + request ID layers)
//!     → middleware/capture.rs (buffer request, run handler)
//!     → business routes (supplied by the caller, optionally tagged;
//!       panics reported by middleware/panics.rs)
//!     → response head sent at once, body frames forwarded as they come
//!     → body finished or dropped: stages notified with the completed exchange
//!         http_log, request_count, active_users, auth_attempts, pizza_orders
//! ```

pub mod middleware;
pub mod server;

pub use middleware::{CompletedExchange, ExchangeObserver, Instrumentation};
pub use server::HttpServer;
