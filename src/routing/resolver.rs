//! URL resolution.
//!
//! # Responsibilities
//! - Find the route that owns a URL
//! - Extract route parameters in key order
//! - Fill the route's spec-name template
//!
//! # Design Decisions
//! - Scan from the newest route back to the oldest; the first match wins
//! - Routes bound to another origin are skipped before their pattern runs
//! - No match is a valid, unrouted result rather than an error

use url::Url;

use crate::observability::metrics;
use crate::routing::error::RoutingError;
use crate::routing::info::RouteInfo;
use crate::routing::table::RouteTable;
use crate::routing::url::parse_query;

impl RouteTable {
    /// Resolve an absolute URL.
    pub fn resolve(&self, url: &Url) -> RouteInfo {
        let origin = url.origin().ascii_serialization();
        let path = url.path();

        let matched = self
            .routes()
            .iter()
            .rev()
            .filter(|route| route.accepts_origin(&origin))
            .find_map(|route| route.match_path(path).map(|params| (route, params)));

        let mut info = RouteInfo {
            url: url.as_str().to_string(),
            path: path.to_string(),
            query: url.query().unwrap_or_default().to_string(),
            query_parameters: parse_query(url.as_str()),
            ..RouteInfo::default()
        };

        match matched {
            Some((route, params)) => {
                tracing::debug!(url = %url, route = %route.name(), "URL resolved");
                info.name = Some(route.name().to_string());
                info.spec_name = route.spec_name(&params);
                info.component_name = route.component_name().map(str::to_string);
                info.route_parameters = params;
            }
            None => {
                tracing::debug!(url = %url, "URL did not match any route");
            }
        }

        metrics::record_resolution(info.is_routed());
        info
    }

    /// Resolve a possibly relative URL against `base`.
    pub fn resolve_str(&self, input: &str, base: &Url) -> Result<RouteInfo, RoutingError> {
        let url = base.join(input).map_err(|source| RoutingError::InvalidUrl {
            url: input.to_string(),
            source,
        })?;
        Ok(self.resolve(&url))
    }
}
