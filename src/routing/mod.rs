//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (business layer):
//!     MethodRouter
//!     → router.rs tag(route, RouteClass) (stamps class on responses)
//!
//! Completed request:
//!     response extension RouteClass (if tagged)
//!     → matcher.rs RouteClassifier::resolve (tag, else method + path suffix)
//!     → RouteClass consumed by the auth and order stages
//! ```
//!
//! # Design Decisions
//! - Tags are preferred; suffix rules only cover untagged routes
//! - Classification happens after the handler, never alters routing

pub mod matcher;
pub mod router;

pub use matcher::RouteClassifier;
pub use router::{tag, tagged_class};

/// What the instrumentation should treat a route as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// Credential submission (login).
    AuthAttempt,
    /// Pizza order creation.
    OrderCreation,
    Other,
}
