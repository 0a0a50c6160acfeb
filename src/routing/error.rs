//! Routing errors.

use thiserror::Error;

use crate::pattern::PatternError;

/// Errors raised while registering routes or resolving URLs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoutingError {
    #[error("route `{route}` has an invalid path pattern: {source}")]
    Pattern {
        route: String,
        #[source]
        source: PatternError,
    },

    #[error("route `{route}` spec name references unknown parameter `{placeholder}`")]
    UnknownPlaceholder { route: String, placeholder: String },

    #[error("route `{route}` has an invalid origin `{origin}`")]
    InvalidOrigin { route: String, origin: String },

    #[error("cannot parse url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("no route named `{0}`")]
    UnknownRoute(String),

    #[error("route `{route}` requires parameter `{parameter}`")]
    MissingParameter { route: String, parameter: String },

    #[error("value `{value}` does not satisfy parameter `{parameter}` of route `{route}`")]
    InvalidParameter {
        route: String,
        parameter: String,
        value: String,
    },

    #[error("route `{0}` was not compiled from a single pattern and cannot build paths")]
    NotReversible(String),
}
