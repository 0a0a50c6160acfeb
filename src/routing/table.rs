//! Route storage.
//!
//! # Responsibilities
//! - Compile route records into matchers
//! - Check spec-name placeholders against the route's parameters
//! - Keep routes in registration order (append or prepend)
//! - Build paths back from a route name and its parameters
//!
//! # Design Decisions
//! - Routes are compiled once; a `CompiledRoute` never changes afterwards
//! - Routes are shared through `Arc` so copying a table for an update is cheap
//! - The newest route wins; see `resolver.rs` for the scan order

use std::sync::Arc;

use percent_encoding::utf8_percent_encode;
use regex::RegexBuilder;
use url::Url;

use crate::config::schema::{PathSpec, RouteConfig};
use crate::pattern::{parse_str, path_to_regex, Key, Matcher, Modifier, PathInput, PathToken, PatternOptions};
use crate::routing::error::RoutingError;
use crate::routing::info::RouteParameters;
use crate::routing::url::COMPONENT;

const PLACEHOLDER_OPEN: &str = "{{:";
const PLACEHOLDER_CLOSE: &str = "}}";

/// Names referenced by `{{:name}}` placeholders, in order of appearance.
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find(PLACEHOLDER_OPEN) {
        let after = &rest[start + PLACEHOLDER_OPEN.len()..];
        match after.find(PLACEHOLDER_CLOSE) {
            Some(end) => {
                names.push(&after[..end]);
                rest = &after[end + PLACEHOLDER_CLOSE.len()..];
            }
            None => break,
        }
    }
    names
}

/// Replace every `{{:key}}` in `template` with the matching parameter.
pub fn substitute(template: &str, params: &RouteParameters) -> String {
    params.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{}{}{}", PLACEHOLDER_OPEN, key, PLACEHOLDER_CLOSE), value)
    })
}

/// A route ready for matching.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    name: String,
    /// ASCII serialization of the origin, e.g. `https://example.com`.
    origin: Option<String>,
    path: Option<PathSpec>,
    /// Parsed tokens, kept for single-pattern routes only.
    tokens: Option<Vec<PathToken>>,
    matcher: Option<Matcher>,
    spec_name: Option<String>,
    component_name: Option<String>,
    options: PatternOptions,
}

impl CompiledRoute {
    /// Compile a route record.
    pub fn compile(config: &RouteConfig, options: &PatternOptions) -> Result<Self, RoutingError> {
        let pattern_error = |source| RoutingError::Pattern {
            route: config.name.clone(),
            source,
        };

        let origin = config
            .origin
            .as_deref()
            .map(|origin| normalize_origin(&config.name, origin))
            .transpose()?;

        let matcher = config
            .path
            .as_ref()
            .map(|path| path_to_regex(PathInput::from(path), options))
            .transpose()
            .map_err(pattern_error)?;

        let tokens = match &config.path {
            Some(PathSpec::One(pattern)) => Some(parse_str(pattern, options).map_err(pattern_error)?),
            _ => None,
        };

        if let Some(template) = &config.spec_name {
            let keys = matcher.as_ref().map(Matcher::keys).unwrap_or_default();
            for placeholder in placeholders(template) {
                if !keys.iter().any(|key| key.name.to_string() == placeholder) {
                    return Err(RoutingError::UnknownPlaceholder {
                        route: config.name.clone(),
                        placeholder: placeholder.to_string(),
                    });
                }
            }
        }

        Ok(Self {
            name: config.name.clone(),
            origin,
            path: config.path.clone(),
            tokens,
            matcher,
            spec_name: config.spec_name.clone(),
            component_name: config.component_name.clone(),
            options: options.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn path(&self) -> Option<&PathSpec> {
        self.path.as_ref()
    }

    pub fn keys(&self) -> &[Key] {
        self.matcher.as_ref().map(Matcher::keys).unwrap_or_default()
    }

    pub fn matcher(&self) -> Option<&Matcher> {
        self.matcher.as_ref()
    }

    pub fn spec_name_template(&self) -> Option<&str> {
        self.spec_name.as_deref()
    }

    pub fn component_name(&self) -> Option<&str> {
        self.component_name.as_deref()
    }

    /// True when the route accepts URLs of `origin`.
    pub fn accepts_origin(&self, origin: &str) -> bool {
        self.origin.as_deref().map_or(true, |own| own == origin)
    }

    /// Match a path. A route without a pattern matches every path.
    pub fn match_path(&self, path: &str) -> Option<RouteParameters> {
        match &self.matcher {
            Some(matcher) => matcher.match_path(path),
            None => Some(RouteParameters::new()),
        }
    }

    /// Spec name with placeholders filled from `params`.
    pub fn spec_name(&self, params: &RouteParameters) -> Option<String> {
        self.spec_name.as_deref().map(|template| substitute(template, params))
    }

    /// Build a path for this route from parameter values.
    ///
    /// Optional parameters may be omitted. Values are percent-encoded, and the
    /// encoded value must match the parameter's own pattern. Repeated values
    /// keep their joiners, so `a/b` fills `:path+` as two segments.
    pub fn reverse(&self, params: &RouteParameters) -> Result<String, RoutingError> {
        let tokens = self
            .tokens
            .as_ref()
            .ok_or_else(|| RoutingError::NotReversible(self.name.clone()))?;

        let mut path = String::new();
        for token in tokens {
            match token {
                PathToken::Literal(text) => path.push_str(text),
                PathToken::Group {
                    prefix,
                    suffix,
                    modifier,
                } => {
                    if matches!(modifier, Modifier::None | Modifier::OneOrMore) {
                        path.push_str(prefix);
                        path.push_str(suffix);
                    }
                }
                PathToken::Param(key) => {
                    let name = key.name.to_string();
                    let value = match params.get(&name).filter(|v| !v.is_empty()) {
                        Some(value) => value,
                        None if matches!(key.modifier, Modifier::Optional | Modifier::ZeroOrMore) => continue,
                        None => {
                            return Err(RoutingError::MissingParameter {
                                route: self.name.clone(),
                                parameter: name,
                            })
                        }
                    };
                    let encoded = encode_value(key, value);
                    if !self.value_fits(key, &encoded) {
                        return Err(RoutingError::InvalidParameter {
                            route: self.name.clone(),
                            parameter: name,
                            value: value.clone(),
                        });
                    }
                    path.push_str(&key.prefix);
                    path.push_str(&encoded);
                    path.push_str(&key.suffix);
                }
            }
        }
        Ok(path)
    }

    fn value_fits(&self, key: &Key, value: &str) -> bool {
        let source = if key.modifier.is_repeating() {
            format!(
                "^(?:{pat})(?:{s}{p}(?:{pat}))*$",
                pat = key.pattern,
                p = regex::escape(&key.prefix),
                s = regex::escape(&key.suffix)
            )
        } else {
            format!("^(?:{})$", key.pattern)
        };
        RegexBuilder::new(&source)
            .case_insensitive(!self.options.sensitive)
            .build()
            .map(|regex| regex.is_match(value))
            .unwrap_or(false)
    }
}

fn encode_value(key: &Key, value: &str) -> String {
    let joiner = format!("{}{}", key.suffix, key.prefix);
    if key.modifier.is_repeating() && !joiner.is_empty() {
        value
            .split(joiner.as_str())
            .map(|segment| utf8_percent_encode(segment, COMPONENT).to_string())
            .collect::<Vec<_>>()
            .join(joiner.as_str())
    } else {
        utf8_percent_encode(value, COMPONENT).to_string()
    }
}

fn normalize_origin(route: &str, origin: &str) -> Result<String, RoutingError> {
    let invalid = || RoutingError::InvalidOrigin {
        route: route.to_string(),
        origin: origin.to_string(),
    };
    let parsed = Url::parse(origin).map_err(|_| invalid())?.origin();
    if !parsed.is_tuple() {
        return Err(invalid());
    }
    Ok(parsed.ascii_serialization())
}

/// Ordered collection of compiled routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Arc<CompiledRoute>>,
    options: PatternOptions,
}

impl RouteTable {
    /// Create an empty table whose routes compile with `options`.
    pub fn new(options: PatternOptions) -> Self {
        Self {
            routes: Vec::new(),
            options,
        }
    }

    /// Compile every route record, in order.
    pub fn from_config(routes: &[RouteConfig], options: &PatternOptions) -> Result<Self, RoutingError> {
        let mut table = Self::new(options.clone());
        for route in routes {
            table.add_route(route, false)?;
        }
        Ok(table)
    }

    /// Compile and register a route, at the front when `prepend` is set.
    pub fn add_route(&mut self, route: &RouteConfig, prepend: bool) -> Result<(), RoutingError> {
        let compiled = CompiledRoute::compile(route, &self.options)?;
        self.insert(compiled, prepend);
        Ok(())
    }

    pub fn insert(&mut self, route: CompiledRoute, prepend: bool) {
        tracing::debug!(route = %route.name, prepend, "Route registered");
        if prepend {
            self.routes.insert(0, Arc::new(route));
        } else {
            self.routes.push(Arc::new(route));
        }
    }

    pub fn routes(&self) -> &[Arc<CompiledRoute>] {
        &self.routes
    }

    pub fn options(&self) -> &PatternOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find a route by name. With duplicates the newest registration wins.
    pub fn get(&self, name: &str) -> Option<&CompiledRoute> {
        self.routes.iter().rev().find(|route| route.name == name).map(Arc::as_ref)
    }

    /// Build the path of a named route.
    pub fn reverse(&self, name: &str, params: &RouteParameters) -> Result<String, RoutingError> {
        self.get(name)
            .ok_or_else(|| RoutingError::UnknownRoute(name.to_string()))?
            .reverse(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> RouteParameters {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders("user-{{:id}}-{{:tab}}"), vec!["id", "tab"]);
        assert!(placeholders("plain").is_empty());
        assert!(placeholders("broken-{{:id").is_empty());
    }

    #[test]
    fn test_substitute_replaces_every_occurrence() {
        let spec = substitute("{{:id}}/{{:id}}", &params(&[("id", "7")]));
        assert_eq!(spec, "7/7");
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let route = RouteConfig::new("user", "/users/:id").with_spec("user-{{:uid}}");
        let err = CompiledRoute::compile(&route, &PatternOptions::default()).unwrap_err();
        assert_eq!(
            err,
            RoutingError::UnknownPlaceholder {
                route: "user".into(),
                placeholder: "uid".into(),
            }
        );
    }

    #[test]
    fn test_invalid_pattern_names_route() {
        let route = RouteConfig::new("bad", "/(?x)");
        let err = CompiledRoute::compile(&route, &PatternOptions::default()).unwrap_err();
        assert!(matches!(err, RoutingError::Pattern { ref route, .. } if route == "bad"));
    }

    #[test]
    fn test_origin_normalized() {
        let route = RouteConfig::new("home", "/").with_origin("HTTPS://Example.com:443/ignored");
        let compiled = CompiledRoute::compile(&route, &PatternOptions::default()).unwrap();
        assert_eq!(compiled.origin(), Some("https://example.com"));
        assert!(compiled.accepts_origin("https://example.com"));
        assert!(!compiled.accepts_origin("http://example.com"));
    }

    #[test]
    fn test_invalid_origin() {
        let route = RouteConfig::new("home", "/").with_origin("not a url");
        assert!(matches!(
            CompiledRoute::compile(&route, &PatternOptions::default()),
            Err(RoutingError::InvalidOrigin { .. })
        ));
    }

    #[test]
    fn test_prepend_inserts_at_front() {
        let mut table = RouteTable::new(PatternOptions::default());
        table.add_route(&RouteConfig::new("a", "/a"), false).unwrap();
        table.add_route(&RouteConfig::new("b", "/b"), true).unwrap();
        let names: Vec<_> = table.routes().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_reverse_required_and_optional() {
        let table = RouteTable::from_config(
            &[RouteConfig::new("item", "/shop/:category/:id(\\d+)/:tab?")],
            &PatternOptions::default(),
        )
        .unwrap();

        let path = table
            .reverse("item", &params(&[("category", "books"), ("id", "12")]))
            .unwrap();
        assert_eq!(path, "/shop/books/12");

        let err = table.reverse("item", &params(&[("category", "books")])).unwrap_err();
        assert!(matches!(err, RoutingError::MissingParameter { ref parameter, .. } if parameter == "id"));

        let err = table
            .reverse("item", &params(&[("category", "books"), ("id", "x")]))
            .unwrap_err();
        assert!(matches!(err, RoutingError::InvalidParameter { .. }));
    }

    #[test]
    fn test_reverse_repeating() {
        let table =
            RouteTable::from_config(&[RouteConfig::new("files", "/files/:path+")], &PatternOptions::default())
                .unwrap();
        assert_eq!(
            table.reverse("files", &params(&[("path", "a/b/c")])).unwrap(),
            "/files/a/b/c"
        );
    }

    #[test]
    fn test_reverse_encodes_values() {
        let table = RouteTable::from_config(
            &[
                RouteConfig::new("user", "/users/:id"),
                RouteConfig::new("files", "/files/:path+"),
            ],
            &PatternOptions::default(),
        )
        .unwrap();

        assert_eq!(table.reverse("user", &params(&[("id", "a b")])).unwrap(), "/users/a%20b");
        assert_eq!(table.reverse("user", &params(&[("id", "café")])).unwrap(), "/users/caf%C3%A9");
        assert_eq!(table.reverse("user", &params(&[("id", "a%20b")])).unwrap(), "/users/a%2520b");
        assert_eq!(
            table.reverse("files", &params(&[("path", "my docs/a?b")])).unwrap(),
            "/files/my%20docs/a%3Fb"
        );
    }

    #[test]
    fn test_reverse_unknown_or_list() {
        let mut route = RouteConfig::new("docs", "/docs");
        route.path = Some(PathSpec::Many(vec!["/docs".into(), "/help".into()]));
        let table = RouteTable::from_config(&[route], &PatternOptions::default()).unwrap();
        assert_eq!(
            table.reverse("docs", &RouteParameters::new()),
            Err(RoutingError::NotReversible("docs".into()))
        );
        assert_eq!(
            table.reverse("missing", &RouteParameters::new()),
            Err(RoutingError::UnknownRoute("missing".into()))
        );
    }
}
