//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, route compilation)
//!     → RouterConfig (validated, immutable)
//!     → NavigationController::new
//!
//! On reload signal:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → new RouteTable swapped into the controller
//!
//! On spec switch:
//!     overlay.rs merges spec settings over [settings]
//!     → ResolvedSettings for the active spec
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod overlay;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use overlay::{resolve_config, ResolvedSettings};
pub use schema::{ObservabilityConfig, PathSpec, RouteConfig, RouterConfig, RouterSettings};
pub use validation::{validate_config, ValidationError};
