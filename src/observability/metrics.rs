//! Metrics collection.
//!
//! # Responsibilities
//! - Define router metrics (navigations, resolutions, spec loads)
//! - Record them through the `metrics` facade
//!
//! # Metrics
//! - `router_navigations_total` (counter): navigations by outcome
//! - `router_resolutions_total` (counter): URL resolutions by matched=true/false
//! - `router_spec_loads_total` (counter): spec activations by source (cache, loader)
//!
//! # Design Decisions
//! - The library only records; installing an exporter is left to the host
//! - Low-overhead metric updates (no-ops when no recorder is installed)

/// Record the outcome of a navigation (`opened`, `jumped`, `suppressed` or an
/// error label).
pub fn record_navigation(outcome: &'static str) {
    metrics::counter!("router_navigations_total", "outcome" => outcome).increment(1);
}

/// Record a URL resolution.
pub fn record_resolution(matched: bool) {
    let matched = if matched { "true" } else { "false" };
    metrics::counter!("router_resolutions_total", "matched" => matched).increment(1);
}

/// Record a spec activation and where the spec came from.
pub fn record_spec_load(source: &'static str) {
    metrics::counter!("router_spec_loads_total", "source" => source).increment(1);
}
