//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming URL (origin, path, query)
//!     → resolver.rs (newest-first route scan)
//!     → table.rs    (origin check, pattern match, spec template)
//!     → Return: RouteInfo (routed or unrouted)
//!
//! Route Compilation (at startup or on registration):
//!     RouteConfig[]
//!     → pattern::path_to_regex
//!     → check {{:param}} placeholders
//!     → RouteTable (shared, replaced as a whole on update)
//!
//! Outgoing navigation:
//!     RouteRequest + current RouteInfo
//!     → url.rs (path, query, encoded parameters)
//! ```
//!
//! # Design Decisions
//! - Routes compiled up front; a bad pattern fails registration, never a match
//! - Later registrations shadow earlier ones
//! - Query parameters are parsed whether or not a route matched

pub mod error;
pub mod info;
pub mod resolver;
pub mod table;
pub mod url;

pub use error::RoutingError;
pub use info::{NavigationOptions, QueryParameters, QueryValue, RouteInfo, RouteParameters, RouteRequest};
pub use table::{CompiledRoute, RouteTable};
pub use url::{encode_query, parse_query, UrlBuilder};
