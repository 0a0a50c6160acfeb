//! Navigation spans.
//!
//! Every navigation runs inside a `navigation` span carrying a fresh UUID, so
//! all events of one navigation (hooks, spec loads, validation) correlate.

use tracing::Span;
use uuid::Uuid;

/// Span for one navigation operation.
pub fn navigation_span(operation: &'static str, target: &str) -> Span {
    let id = Uuid::new_v4();
    tracing::info_span!("navigation", id = %id, operation, target = %target)
}
