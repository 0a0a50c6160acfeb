//! Matching, registration and round-trip properties through the public API.

use url::Url;

use navigation_router::config::RouteConfig;
use navigation_router::pattern::{path_to_regex, PatternOptions};
use navigation_router::routing::{
    NavigationOptions, RouteInfo, RouteParameters, RouteRequest, RouteTable, RoutingError, UrlBuilder,
};

fn base() -> Url {
    Url::parse("https://app.test/").unwrap()
}

fn params(pairs: &[(&str, &str)]) -> RouteParameters {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn test_named_parameter_matching() {
    let matcher = path_to_regex("/users/:id", &PatternOptions::default()).unwrap();
    assert_eq!(matcher.match_path("/users/42").unwrap(), params(&[("id", "42")]));
    assert!(matcher.match_path("/users/").is_none());
}

#[test]
fn test_repeating_modifiers() {
    let options = PatternOptions::default();

    let plus = path_to_regex("/files/:path+", &options).unwrap();
    assert_eq!(plus.match_path("/files/a/b").unwrap(), params(&[("path", "a/b")]));
    assert!(plus.match_path("/files").is_none());

    let star = path_to_regex("/files/:path*", &options).unwrap();
    assert_eq!(star.match_path("/files").unwrap(), params(&[("path", "")]));
    assert_eq!(star.match_path("/files/a/b").unwrap(), params(&[("path", "a/b")]));
}

#[test]
fn test_custom_pattern_restricts_values() {
    let matcher = path_to_regex(r"/item/:id(\d+)", &PatternOptions::default()).unwrap();
    assert_eq!(matcher.match_path("/item/9").unwrap(), params(&[("id", "9")]));
    assert!(matcher.match_path("/item/abc").is_none());
}

#[test]
fn test_bad_inline_patterns_fail_registration() {
    let mut table = RouteTable::new(PatternOptions::default());
    for pattern in ["/(?foo)", "/(a(b))", "/()"] {
        match table.add_route(&RouteConfig::new("bad", pattern), false) {
            Err(RoutingError::Pattern { route, source }) => {
                assert_eq!(route, "bad");
                assert!(source.is_syntax(), "{} gave {:?}", pattern, source);
            }
            other => panic!("{} should not register: {:?}", pattern, other),
        }
    }
    assert!(table.is_empty());
}

#[test]
fn test_append_order_and_prepend() {
    let mut table = RouteTable::new(PatternOptions::default());
    table.add_route(&RouteConfig::new("r1", "/a"), false).unwrap();
    table.add_route(&RouteConfig::new("r2", "/a"), false).unwrap();
    assert_eq!(table.resolve_str("/a", &base()).unwrap().name.as_deref(), Some("r2"));

    // Prepended routes are scanned last.
    table.add_route(&RouteConfig::new("r3", "/a"), true).unwrap();
    assert_eq!(table.resolve_str("/a", &base()).unwrap().name.as_deref(), Some("r2"));
}

#[test]
fn test_build_then_resolve_round_trip() {
    let routes = vec![
        RouteConfig::new("user", "/users/:id"),
        RouteConfig::new("files", "/files/:path+"),
        RouteConfig::new("item", r"/item/:id(\d+)"),
        RouteConfig::new("post", r"/blog/:year(\d{4})/:slug?"),
        RouteConfig::new("shop", "/shop{/:category}?/items"),
        RouteConfig::new("archive", "/archive/:section/:page(\\d+)"),
    ];
    let table = RouteTable::from_config(&routes, &PatternOptions::default()).unwrap();

    let cases: Vec<(&str, RouteParameters, RouteParameters)> = vec![
        ("user", params(&[("id", "42")]), params(&[("id", "42")])),
        ("user", params(&[("id", "a b")]), params(&[("id", "a b")])),
        ("user", params(&[("id", "café")]), params(&[("id", "café")])),
        ("user", params(&[("id", "a%20b")]), params(&[("id", "a%20b")])),
        ("files", params(&[("path", "my docs/ü")]), params(&[("path", "my docs/ü")])),
        ("files", params(&[("path", "a/b/c")]), params(&[("path", "a/b/c")])),
        ("item", params(&[("id", "9")]), params(&[("id", "9")])),
        (
            "post",
            params(&[("year", "2024"), ("slug", "hello")]),
            params(&[("year", "2024"), ("slug", "hello")]),
        ),
        ("post", params(&[("year", "2024")]), params(&[("year", "2024"), ("slug", "")])),
        ("shop", params(&[("category", "tools")]), params(&[("category", "tools")])),
        ("shop", params(&[]), params(&[("category", "")])),
        (
            "archive",
            params(&[("section", "news"), ("page", "3")]),
            params(&[("section", "news"), ("page", "3")]),
        ),
    ];

    for (name, assignment, expected) in cases {
        let path = table.reverse(name, &assignment).unwrap();
        let request = RouteRequest::path(path.clone()).with_parameter("ref", "list");
        let url = UrlBuilder::build(&request, &RouteInfo::default(), &NavigationOptions::default());
        assert_eq!(url, format!("{}?ref=list", path));

        let info = table.resolve_str(&url, &base()).unwrap();
        assert_eq!(info.name.as_deref(), Some(name), "{} resolved wrong", url);
        assert_eq!(info.route_parameters, expected, "{} lost parameters", url);
        assert_eq!(info.query, "ref=list");
    }
}

#[test]
fn test_reverse_rejects_bad_assignments() {
    let routes = vec![
        RouteConfig::new("item", r"/item/:id(\d+)"),
        RouteConfig::new("docs", "/docs").with_spec("docs"),
    ];
    let table = RouteTable::from_config(&routes, &PatternOptions::default()).unwrap();

    assert!(matches!(
        table.reverse("item", &params(&[])),
        Err(RoutingError::MissingParameter { .. })
    ));
    assert!(matches!(
        table.reverse("item", &params(&[("id", "x1")])),
        Err(RoutingError::InvalidParameter { .. })
    ));
    assert!(matches!(
        table.reverse("missing", &params(&[])),
        Err(RoutingError::UnknownRoute(_))
    ));
    assert_eq!(table.reverse("docs", &params(&[])).unwrap(), "/docs");
}

#[test]
fn test_spec_name_follows_route_parameters() {
    let routes = vec![RouteConfig::new("user", "/users/:id/:tab?").with_spec("user-{{:id}}-{{:tab}}")];
    let table = RouteTable::from_config(&routes, &PatternOptions::default()).unwrap();

    let info = table.resolve_str("/users/7/posts", &base()).unwrap();
    assert_eq!(info.spec_name.as_deref(), Some("user-7-posts"));

    let info = table.resolve_str("/users/7", &base()).unwrap();
    assert_eq!(info.spec_name.as_deref(), Some("user-7-"));
}
