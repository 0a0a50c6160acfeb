//! Navigation subsystem.
//!
//! # Data Flow
//! ```text
//! open_route(RouteRequest)
//!     → routing::UrlBuilder (target URL)
//!     → routing::RouteTable::resolve (target RouteInfo)
//!     → jump?  → HistoryAdapter::assign, UNLOADING
//!     → HistoryAdapter::push_entry
//!     → validation.rs (ValidationGateway, auto-fix via replace)
//!     → spec.rs (SpecLoader) + host.rs (organizers) when the spec changes
//!     → host.rs (RefreshTarget::refresh)
//!     → hooks.rs (normalize listeners)
//!
//! popstate (HistoryAdapter::subscribe)
//!     → controller.rs::handle_pop_state → open_inner without push, under one in-flight guard
//! ```
//!
//! # Design Decisions
//! - Every collaborator is injected; nothing reaches for globals
//! - Hooks are awaited one listener at a time, in registration order
//! - Errors reject the triggering call; there is no automatic retry

pub mod controller;
pub mod error;
pub mod history;
pub mod hooks;
pub mod host;
pub mod spec;
pub mod state;
pub mod validation;

pub use controller::{Collaborators, NavigationController, NavigationOutcome};
pub use error::{HostError, NavigationError, RouteValidationError, SpecLoadError};
pub use history::{HistoryAdapter, HistoryState, MemoryHistory, PopStateEvent};
pub use hooks::{Hook, HookContext, HookListener};
pub use host::{HeadlessHost, RefreshTarget, ViewHost};
pub use spec::{FileSpecLoader, Spec, SpecLoadOptions, SpecLoader};
pub use state::NavigationState;
pub use validation::{
    fix_parameters, FailedRule, InvalidItem, PassThroughValidator, ValidationGateway, ValidationRequest,
    ValidationResult, Validity,
};
