//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::navigation::spec::Spec;
use crate::pattern::{PathInput, PatternOptions};

/// Root configuration for the navigation router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Navigation behaviour.
    pub settings: RouterSettings,

    /// Pattern compiler options shared by every route.
    pub patterns: PatternOptions,

    /// Route definitions, in registration order.
    pub routes: Vec<RouteConfig>,

    /// Specs available without a load, keyed by spec name.
    pub specs: IndexMap<String, Spec>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Navigation behaviour settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterSettings {
    /// Try to correct invalid query parameters instead of rejecting.
    pub auto_fix_url: bool,

    /// Validation rule set passed to the validation gateway.
    pub validation_name: Option<String>,

    /// Directory or URL prefix spec files are loaded from.
    pub spec_path: String,

    /// Base URL relative navigation targets are joined against.
    pub app_base_url: String,

    /// Query appended when loading specs.
    pub query: Option<String>,

    /// Switch specs without a full page load when the component stays the same.
    pub in_place_spec_switch: bool,

    /// Arm the one-shot flag that ignores the first popstate arriving before
    /// any navigation after `start` completes. Off by default; enable it for
    /// hosts that fire a popstate on page load.
    pub suppress_initial_popstate: bool,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            auto_fix_url: false,
            validation_name: None,
            spec_path: "specs".to_string(),
            app_base_url: "http://localhost/".to_string(),
            query: None,
            in_place_spec_switch: true,
            suppress_initial_popstate: false,
        }
    }
}

/// Path pattern of a route: one pattern or a list matched as alternatives.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PathSpec {
    One(String),
    Many(Vec<String>),
}

impl From<&PathSpec> for PathInput {
    fn from(spec: &PathSpec) -> Self {
        match spec {
            PathSpec::One(pattern) => PathInput::Pattern(pattern.clone()),
            PathSpec::Many(patterns) => {
                PathInput::List(patterns.iter().cloned().map(PathInput::Pattern).collect())
            }
        }
    }
}

/// A route registration record.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RouteConfig {
    /// Only URLs with this origin can match (e.g., "https://example.com").
    pub origin: Option<String>,

    /// Unique route name.
    pub name: String,

    /// Path pattern. A route without one matches every path.
    pub path: Option<PathSpec>,

    /// Spec activated for this route. May embed `{{:param}}` placeholders.
    pub spec_name: Option<String>,

    /// Component that renders this route.
    pub component_name: Option<String>,
}

impl RouteConfig {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: Some(PathSpec::One(path.into())),
            ..Self::default()
        }
    }

    pub fn with_spec(mut self, spec_name: impl Into<String>) -> Self {
        self.spec_name = Some(spec_name.into());
        self
    }

    pub fn with_component(mut self, component_name: impl Into<String>) -> Self {
        self.component_name = Some(component_name.into());
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter, overridden by `RUST_LOG`.
    pub log_level: String,

    /// Multi-line human readable output instead of compact lines.
    pub pretty: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "navigation_router=info".to_string(),
            pretty: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: RouterConfig = toml::from_str("").unwrap();
        assert!(config.routes.is_empty());
        assert_eq!(config.patterns.delimiter, "/#?");
        assert!(config.settings.in_place_spec_switch);
        assert!(!config.settings.suppress_initial_popstate);

        let armed: RouterConfig = toml::from_str("[settings]\nsuppress_initial_popstate = true").unwrap();
        assert!(armed.settings.suppress_initial_popstate);
    }

    #[test]
    fn test_route_path_string_or_list() {
        let config: RouterConfig = toml::from_str(
            r#"
            [[routes]]
            name = "user"
            path = "/users/:id"
            spec_name = "user-{{:id}}"

            [[routes]]
            name = "docs"
            path = ["/docs", "/help"]

            [[routes]]
            name = "fallback"
            "#,
        )
        .unwrap();

        assert_eq!(config.routes[0].path, Some(PathSpec::One("/users/:id".into())));
        assert_eq!(
            config.routes[1].path,
            Some(PathSpec::Many(vec!["/docs".into(), "/help".into()]))
        );
        assert_eq!(config.routes[2].path, None);
    }

    #[test]
    fn test_inline_specs() {
        let config: RouterConfig = toml::from_str(
            r#"
            [specs.home.settings]
            title = "Home"
            "#,
        )
        .unwrap();
        assert_eq!(config.specs["home"].settings["title"], "Home");
    }
}
