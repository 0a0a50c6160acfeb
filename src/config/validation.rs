//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile every route so bad patterns, origins and placeholders surface here
//! - Detect duplicate route names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::config::schema::RouterConfig;
use crate::routing::table::CompiledRoute;
use crate::routing::RoutingError;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("route #{index} has an empty name")]
    EmptyRouteName { index: usize },

    #[error("route name `{0}` is used more than once")]
    DuplicateRouteName(String),

    #[error("route `{route}` has an empty spec name")]
    EmptySpecName { route: String },

    #[error("patterns.delimiter must not be empty")]
    EmptyDelimiter,

    #[error("settings.app_base_url `{0}` is not an absolute URL")]
    InvalidBaseUrl(String),

    #[error("spec key `{0}` is empty")]
    EmptySpecKey(String),

    #[error(transparent)]
    Route(#[from] RoutingError),
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.patterns.delimiter.is_empty() {
        errors.push(ValidationError::EmptyDelimiter);
    }

    match Url::parse(&config.settings.app_base_url) {
        Ok(url) if !url.cannot_be_a_base() => {}
        _ => errors.push(ValidationError::InvalidBaseUrl(config.settings.app_base_url.clone())),
    }

    let mut seen = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        if route.name.trim().is_empty() {
            errors.push(ValidationError::EmptyRouteName { index });
        } else if !seen.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRouteName(route.name.clone()));
        }

        if route.spec_name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            errors.push(ValidationError::EmptySpecName {
                route: route.name.clone(),
            });
        }

        if let Err(e) = CompiledRoute::compile(route, &config.patterns) {
            errors.push(ValidationError::Route(e));
        }
    }

    for key in config.specs.keys() {
        if key.trim().is_empty() {
            errors.push(ValidationError::EmptySpecKey(key.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
