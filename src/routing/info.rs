//! Route descriptors exchanged at the routing boundary.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    /// The key appeared without `=`.
    Absent,
    Single(String),
    /// Encoded as one comma-joined value.
    List(Vec<String>),
}

impl QueryValue {
    /// The value as a string, lists joined with `,`.
    pub fn as_joined(&self) -> Option<String> {
        match self {
            QueryValue::Absent => None,
            QueryValue::Single(value) => Some(value.clone()),
            QueryValue::List(values) => Some(values.join(",")),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Single(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Single(value)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        QueryValue::List(values)
    }
}

/// Query parameters in the order they were given.
pub type QueryParameters = IndexMap<String, QueryValue>;

/// Route parameters, in key order.
pub type RouteParameters = IndexMap<String, String>;

/// The resolved description of a URL.
///
/// Built fresh on every resolution. An unrouted URL has no `name`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteInfo {
    pub name: Option<String>,
    pub spec_name: Option<String>,
    pub component_name: Option<String>,
    /// Absolute URL.
    pub url: String,
    pub path: String,
    /// Query string without the leading `?`.
    pub query: String,
    pub route_parameters: RouteParameters,
    pub query_parameters: QueryParameters,
}

impl RouteInfo {
    /// True when a route matched this URL.
    pub fn is_routed(&self) -> bool {
        self.name.is_some()
    }
}

/// Target of a navigation, before it is turned into a URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteRequest {
    /// Used verbatim when present.
    pub url: Option<String>,
    /// Defaults to the current path.
    pub path: Option<String>,
    /// Raw query string, without `?`.
    pub query: Option<String>,
    pub query_parameters: Option<QueryParameters>,
    /// Address shown after a successful navigation, in place of the real URL.
    pub display_url: Option<String>,
}

impl RouteRequest {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn query_parameters(params: QueryParameters) -> Self {
        Self {
            query_parameters: Some(params),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query_parameters
            .get_or_insert_with(QueryParameters::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_display_url(mut self, url: impl Into<String>) -> Self {
        self.display_url = Some(url.into());
        self
    }
}

/// Options for a single navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationOptions {
    /// Push a history entry. Defaults to true when a target is given.
    pub push_state: Option<bool>,
    /// Force a full page load.
    pub jump: bool,
    /// Merge the current query parameters under the new ones.
    pub merge_parameters: bool,
    /// Query appended when loading a spec.
    pub query: Option<String>,
}

impl NavigationOptions {
    pub fn jump() -> Self {
        Self {
            jump: true,
            ..Self::default()
        }
    }

    pub fn without_push() -> Self {
        Self {
            push_state: Some(false),
            ..Self::default()
        }
    }
}
