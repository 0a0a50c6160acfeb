//! Navigation router library.
//!
//! Compiles path patterns, resolves URLs to named routes, builds URLs back
//! and drives a navigation state machine over injected history, validation,
//! spec loading and view collaborators.

pub mod config;
pub mod navigation;
pub mod observability;
pub mod pattern;
pub mod routing;

pub use config::schema::RouterConfig;
pub use navigation::{NavigationController, NavigationError};
pub use pattern::{path_to_regex, PatternOptions};
pub use routing::{RouteInfo, RouteRequest, RouteTable};
