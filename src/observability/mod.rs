//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters)
//!     → tracing.rs (navigation spans with correlation IDs)
//!
//! Consumers:
//!     → Log output (stderr)
//!     → Any `metrics` recorder the host installs
//! ```
//!
//! # Design Decisions
//! - Structured logging with key/value fields
//! - Navigation ID flows through every event of a navigation
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
pub mod tracing;
