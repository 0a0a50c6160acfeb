//! Settings overlay for the active spec.
//!
//! # Responsibilities
//! - Deep-merge a spec's settings over the router settings
//! - Produce the effective settings used while that spec is active
//!
//! # Design Decisions
//! - Pure function, recomputed on every spec switch
//! - Objects merge key by key; any other value replaces; `null` is ignored
//! - Keys unknown to `RouterSettings` are kept in `values` for organizers

use serde::Serialize;
use serde_json::Value;

use crate::config::loader::ConfigError;
use crate::config::schema::RouterSettings;

/// Settings in effect for the active spec.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedSettings {
    /// Typed router settings after the overlay.
    pub router: RouterSettings,
    /// The full merged settings document.
    pub values: Value,
}

impl ResolvedSettings {
    /// Settings with no spec applied.
    pub fn base(settings: &RouterSettings) -> Result<Self, ConfigError> {
        resolve_config(settings, &Value::Null)
    }
}

/// Merge `overlay` into `base` in place.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                deep_merge(base.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Effective settings for `base` with a spec's settings applied.
pub fn resolve_config(base: &RouterSettings, overlay: &Value) -> Result<ResolvedSettings, ConfigError> {
    let mut values = serde_json::to_value(base)?;
    deep_merge(&mut values, overlay);
    let router = serde_json::from_value(values.clone())?;
    Ok(ResolvedSettings { router, values })
}
