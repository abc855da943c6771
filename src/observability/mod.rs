//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request stages (http::stages) produce:
//!     → metrics.rs (counters, swapped out once per flush window)
//!     → logging.rs (one HttpLogEvent per completed request, one
//!       ExceptionLogEvent per handler panic)
//!
//! Exporters:
//!     → flusher.rs  every tick: sampler.rs + metrics.rs → records.rs → transport.rs
//!     → shipper.rs  per event:  records.rs envelope → redact.rs → transport.rs
//! ```
//!
//! # Design Decisions
//! - Nothing here can fail a client request; errors end in a local `tracing` event
//! - Outbound sends are spawned and bounded by a timeout
//! - Redaction runs on the final serialized envelope, right before sending

pub mod flusher;
pub mod logging;
pub mod metrics;
pub mod records;
pub mod redact;
pub mod sampler;
pub mod shipper;
pub mod transport;

pub use flusher::TelemetryFlusher;
pub use logging::{ExceptionLogEvent, HttpLogEvent, Severity};
pub use metrics::{MetricAccumulator, MetricCounterSet, Outcome};
pub use sampler::{HostSampler, SystemSample, SystemSampler};
pub use shipper::LogShipper;
