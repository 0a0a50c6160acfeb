//! Navigation errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::navigation::hooks::Hook;
use crate::navigation::validation::InvalidItem;
use crate::routing::RoutingError;

/// Failure reported by a collaborator (history, view host, validator, listener).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The URL still has invalid parameters after validation and auto-fix.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("URL validation failed for `{url}` ({} invalid parameters)", invalids.len())]
pub struct RouteValidationError {
    pub url: String,
    pub invalids: Vec<InvalidItem>,
}

/// A spec could not be loaded.
#[derive(Debug, Error)]
pub enum SpecLoadError {
    #[error("invalid spec name `{0}`")]
    InvalidName(String),

    #[error("spec `{0}` not found")]
    NotFound(String),

    #[error("cannot read spec file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("illegal json in spec file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors returned by navigation operations.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("another navigation is in progress")]
    Busy,

    #[error("the page is unloading")]
    Unloading,

    #[error("the router has not been started")]
    NotStarted,

    #[error("the router has already been started")]
    AlreadyStarted,

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Validation(#[from] RouteValidationError),

    #[error(transparent)]
    SpecLoad(#[from] SpecLoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("host call failed: {0}")]
    Host(#[from] HostError),

    #[error("listener for `{hook}` failed: {source}")]
    Hook {
        hook: Hook,
        #[source]
        source: HostError,
    },
}

impl NavigationError {
    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            NavigationError::Busy => "busy",
            NavigationError::Unloading => "unloading",
            NavigationError::NotStarted | NavigationError::AlreadyStarted => "lifecycle",
            NavigationError::Routing(_) => "routing",
            NavigationError::Validation(_) => "invalid",
            NavigationError::SpecLoad(_) => "spec_load",
            NavigationError::Config(_) => "config",
            NavigationError::Host(_) | NavigationError::Hook { .. } => "host",
        }
    }
}
