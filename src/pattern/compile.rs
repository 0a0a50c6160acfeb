//! Regex synthesis from parsed patterns.
//!
//! # Responsibilities
//! - Render path tokens into a single regular expression
//! - Keep the key list aligned with capture groups
//! - Accept strings, lists of patterns and pre-built regexes
//!
//! # Design Decisions
//! - The `regex` crate is linear-time and has no look-around, so end-of-path
//!   terminators are rendered as consuming groups at the very end of the
//!   expression. They never hold a capture, so match success and captured
//!   values are the same as with a look-ahead; only the match span may
//!   include the terminator, and spans are never exposed.
//! - Compiled expressions are size-limited to bound memory.

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use regex::{Regex, RegexBuilder};

use crate::pattern::error::PatternError;
use crate::pattern::parser::{parse_str, Key, KeyName, Modifier, PathToken};
use crate::pattern::PatternOptions;

/// Maximum compiled size of a single route expression (in bytes).
const MAX_REGEX_SIZE: usize = 1 << 20;

/// Input accepted by [`path_to_regex`].
#[derive(Debug, Clone)]
pub enum PathInput {
    /// A pattern in the path grammar.
    Pattern(String),
    /// Several inputs, matched as alternatives.
    List(Vec<PathInput>),
    /// A pre-built expression, used as is.
    Regex(Regex),
}

impl From<&str> for PathInput {
    fn from(pattern: &str) -> Self {
        PathInput::Pattern(pattern.to_string())
    }
}

impl From<String> for PathInput {
    fn from(pattern: String) -> Self {
        PathInput::Pattern(pattern)
    }
}

impl From<Regex> for PathInput {
    fn from(regex: Regex) -> Self {
        PathInput::Regex(regex)
    }
}

impl<T: Into<PathInput>> From<Vec<T>> for PathInput {
    fn from(inputs: Vec<T>) -> Self {
        PathInput::List(inputs.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for PathInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathInput::Pattern(pattern) => f.write_str(pattern),
            PathInput::Regex(regex) => write!(f, "/{}/", regex.as_str()),
            PathInput::List(inputs) => {
                f.write_str("[")?;
                for (i, input) in inputs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", input)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// A compiled path matcher: the expression and its keys in capture order.
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Regex,
    keys: Vec<Key>,
}

impl Matcher {
    /// The parameter keys, in capture-group order.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Source of the synthesized expression.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match a path, returning one entry per key. Groups that did not
    /// participate in the match are `None`.
    pub fn exec<'p>(&self, path: &'p str) -> Option<Vec<Option<&'p str>>> {
        let captures = self.regex.captures(path)?;
        Some(
            (1..captures.len())
                .map(|i| captures.get(i).map(|m| m.as_str()))
                .collect(),
        )
    }

    /// Match a path and name the percent-decoded values by key.
    ///
    /// Non-participating optional groups yield an empty string so that every
    /// key is present in the result.
    pub fn match_path(&self, path: &str) -> Option<IndexMap<String, String>> {
        let values = self.exec(path)?;
        Some(
            self.keys
                .iter()
                .zip(values)
                .map(|(key, value)| (key.name.to_string(), decode(value.unwrap_or_default())))
                .collect(),
        )
    }
}

/// Percent-decode a captured value. Escapes that do not form UTF-8 leave the
/// value as captured.
fn decode(value: &str) -> String {
    percent_decode_str(value)
        .decode_utf8()
        .map(Cow::into_owned)
        .unwrap_or_else(|_| value.to_string())
}

fn encode<'a>(options: &PatternOptions, text: &'a str) -> Cow<'a, str> {
    match options.encode {
        Some(encode) => Cow::Owned(encode(text)),
        None => Cow::Borrowed(text),
    }
}

fn escape_encoded(options: &PatternOptions, text: &str) -> String {
    regex::escape(&encode(options, text))
}

fn char_class(chars: &str) -> Option<String> {
    if chars.is_empty() {
        None
    } else {
        Some(format!("[{}]", regex::escape(chars)))
    }
}

/// Render parsed tokens into an expression source, appending their keys.
pub fn tokens_to_source(tokens: &[PathToken], keys: &mut Vec<Key>, options: &PatternOptions) -> String {
    let delimiter = char_class(&options.delimiter);
    let ends_with = char_class(&options.ends_with);
    let mut route = String::from(if options.start { "^" } else { "" });

    for token in tokens {
        match token {
            PathToken::Literal(text) => route.push_str(&escape_encoded(options, text)),
            PathToken::Group {
                prefix,
                suffix,
                modifier,
            } => {
                route.push_str(&format!(
                    "(?:{}{}){}",
                    escape_encoded(options, prefix),
                    escape_encoded(options, suffix),
                    modifier.as_str()
                ));
            }
            PathToken::Param(key) => {
                let prefix = escape_encoded(options, &key.prefix);
                let suffix = escape_encoded(options, &key.suffix);
                let pattern = &key.pattern;
                keys.push(key.clone());

                if prefix.is_empty() && suffix.is_empty() {
                    route.push_str(&format!("({}){}", pattern, key.modifier.as_str()));
                } else if key.modifier.is_repeating() {
                    let optional = if key.modifier == Modifier::ZeroOrMore { "?" } else { "" };
                    route.push_str(&format!(
                        "(?:{p}((?:{pat})(?:{s}{p}(?:{pat}))*){s}){opt}",
                        p = prefix,
                        s = suffix,
                        pat = pattern,
                        opt = optional
                    ));
                } else {
                    route.push_str(&format!(
                        "(?:{}({}){}){}",
                        prefix,
                        pattern,
                        suffix,
                        key.modifier.as_str()
                    ));
                }
            }
        }
    }

    if options.end {
        if let (false, Some(delimiter)) = (options.strict, &delimiter) {
            route.push_str(delimiter);
            route.push('?');
        }
        match &ends_with {
            Some(ends_with) => route.push_str(&format!("(?:{}|$)", ends_with)),
            None => route.push('$'),
        }
    } else {
        let end_delimited = match tokens.last() {
            None => true,
            Some(PathToken::Literal(text)) => text
                .chars()
                .last()
                .map(|c| options.delimiter.contains(c))
                .unwrap_or(false),
            Some(_) => false,
        };
        if !end_delimited {
            let mut terminators: Vec<&str> = Vec::new();
            if let Some(delimiter) = &delimiter {
                terminators.push(delimiter);
            }
            if let Some(ends_with) = &ends_with {
                terminators.push(ends_with);
            }
            terminators.push("$");
            route.push_str(&format!("(?:{})", terminators.join("|")));
        }
    }

    route
}

fn build_regex(source: &str, options: &PatternOptions) -> Result<Regex, PatternError> {
    RegexBuilder::new(source)
        .case_insensitive(!options.sensitive)
        .size_limit(MAX_REGEX_SIZE)
        .build()
        .map_err(|e| PatternError::InvalidRegex {
            source_text: source.to_string(),
            reason: e.to_string(),
        })
}

fn finish(source: &str, keys: Vec<Key>, options: &PatternOptions) -> Result<Matcher, PatternError> {
    let regex = build_regex(source, options)?;
    let captures = regex.captures_len() - 1;
    if captures != keys.len() {
        return Err(PatternError::CaptureMismatch {
            captures,
            keys: keys.len(),
        });
    }
    Ok(Matcher { regex, keys })
}

/// Compile parsed tokens into a matcher.
pub fn tokens_to_regex(tokens: &[PathToken], options: &PatternOptions) -> Result<Matcher, PatternError> {
    let mut keys = Vec::new();
    let source = tokens_to_source(tokens, &mut keys, options);
    finish(&source, keys, options)
}

/// Keys of a pre-built expression: named groups by name, unnamed groups by
/// ordinal.
fn regex_keys(regex: &Regex) -> Vec<Key> {
    let mut ordinal = 0;
    regex
        .capture_names()
        .skip(1)
        .map(|name| {
            let name = match name {
                Some(name) => KeyName::Named(name.to_string()),
                None => {
                    ordinal += 1;
                    KeyName::Index(ordinal - 1)
                }
            };
            Key {
                name,
                prefix: String::new(),
                suffix: String::new(),
                pattern: String::new(),
                modifier: Modifier::None,
            }
        })
        .collect()
}

fn input_source(input: &PathInput, keys: &mut Vec<Key>, options: &PatternOptions) -> Result<String, PatternError> {
    match input {
        PathInput::Pattern(pattern) => {
            let tokens = parse_str(pattern, options)?;
            Ok(tokens_to_source(&tokens, keys, options))
        }
        PathInput::Regex(regex) => {
            keys.extend(regex_keys(regex));
            Ok(regex.as_str().to_string())
        }
        PathInput::List(inputs) => {
            let parts = inputs
                .iter()
                .map(|input| input_source(input, keys, options))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("(?:{})", parts.join("|")))
        }
    }
}

/// Compile any supported input into a matcher.
///
/// A pre-built [`Regex`] is passed through unchanged (its own flags are kept);
/// strings and lists are compiled with `options`.
pub fn path_to_regex(input: impl Into<PathInput>, options: &PatternOptions) -> Result<Matcher, PatternError> {
    match input.into() {
        PathInput::Regex(regex) => {
            let keys = regex_keys(&regex);
            Ok(Matcher { regex, keys })
        }
        input => {
            let mut keys = Vec::new();
            let source = input_source(&input, &mut keys, options)?;
            finish(&source, keys, options)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(pattern: &str) -> Matcher {
        path_to_regex(pattern, &PatternOptions::default()).unwrap()
    }

    fn params(matcher: &Matcher, path: &str) -> Option<Vec<(String, String)>> {
        matcher
            .match_path(path)
            .map(|m| m.into_iter().collect())
    }

    #[test]
    fn test_named_parameter() {
        let m = compile("/users/:id");
        assert_eq!(params(&m, "/users/42"), Some(vec![("id".into(), "42".into())]));
        assert_eq!(params(&m, "/users/42/"), Some(vec![("id".into(), "42".into())]));
        assert!(!m.is_match("/users/"));
        assert!(!m.is_match("/users/42/posts"));
    }

    #[test]
    fn test_source_shape() {
        let m = compile("/users/:id");
        assert_eq!(m.as_str(), "^/users(?:/([^/\\#\\?]+?))[/\\#\\?]?$");
    }

    #[test]
    fn test_case_sensitivity() {
        assert!(compile("/About").is_match("/about"));
        let sensitive = PatternOptions {
            sensitive: true,
            ..PatternOptions::default()
        };
        let m = path_to_regex("/About", &sensitive).unwrap();
        assert!(!m.is_match("/about"));
        assert!(m.is_match("/About"));
    }

    #[test]
    fn test_strict_trailing_delimiter() {
        let strict = PatternOptions {
            strict: true,
            ..PatternOptions::default()
        };
        let m = path_to_regex("/a", &strict).unwrap();
        assert!(m.is_match("/a"));
        assert!(!m.is_match("/a/"));
    }

    #[test]
    fn test_repeating_parameters() {
        let plus = compile("/files/:path+");
        assert_eq!(params(&plus, "/files/a/b"), Some(vec![("path".into(), "a/b".into())]));
        assert!(!plus.is_match("/files"));

        let star = compile("/files/:path*");
        assert_eq!(params(&star, "/files"), Some(vec![("path".into(), String::new())]));
        assert_eq!(star.exec("/files"), Some(vec![None]));
        assert_eq!(params(&star, "/files/a/b/c"), Some(vec![("path".into(), "a/b/c".into())]));
    }

    #[test]
    fn test_captures_are_decoded() {
        let m = compile("/users/:id");
        assert_eq!(params(&m, "/users/a%20b"), Some(vec![("id".into(), "a b".into())]));
        assert_eq!(params(&m, "/users/caf%C3%A9"), Some(vec![("id".into(), "café".into())]));
        assert_eq!(params(&m, "/users/%FF"), Some(vec![("id".into(), "%FF".into())]));
    }

    #[test]
    fn test_custom_pattern() {
        let m = compile("/item/:id(\\d+)");
        assert_eq!(params(&m, "/item/9"), Some(vec![("id".into(), "9".into())]));
        assert!(!m.is_match("/item/abc"));
    }

    #[test]
    fn test_optional_group_with_suffix() {
        let m = compile("/books{-:slug.html}?");
        assert_eq!(params(&m, "/books-rust.html"), Some(vec![("slug".into(), "rust".into())]));
        assert_eq!(params(&m, "/books"), Some(vec![("slug".into(), String::new())]));
        assert!(!m.is_match("/books-rust"));
    }

    #[test]
    fn test_repeating_group_with_suffix() {
        let m = compile("{/:seg;}+");
        assert_eq!(params(&m, "/a;/b;"), Some(vec![("seg".into(), "a;/b".into())]));
    }

    #[test]
    fn test_literal_group() {
        let m = compile("/docs{/latest}?");
        assert!(m.is_match("/docs"));
        assert!(m.is_match("/docs/latest"));
        assert!(m.keys().is_empty());
    }

    #[test]
    fn test_escaped_characters_are_literal() {
        let m = compile("/price\\:usd");
        assert!(m.is_match("/price:usd"));
        assert!(m.keys().is_empty());
    }

    #[test]
    fn test_non_end_matching() {
        let options = PatternOptions {
            end: false,
            ..PatternOptions::default()
        };
        let m = path_to_regex("/users/:id", &options).unwrap();
        assert_eq!(params(&m, "/users/7/posts"), Some(vec![("id".into(), "7".into())]));
        assert_eq!(params(&m, "/users/7"), Some(vec![("id".into(), "7".into())]));

        let prefix = path_to_regex("/api", &options).unwrap();
        assert!(prefix.is_match("/api/v1"));
        assert!(!prefix.is_match("/apiv1"));

        let delimited = path_to_regex("/api/", &options).unwrap();
        assert!(delimited.is_match("/api/v1"));
    }

    #[test]
    fn test_ends_with() {
        let options = PatternOptions {
            ends_with: "?".into(),
            ..PatternOptions::default()
        };
        let m = path_to_regex("/search/:term", &options).unwrap();
        assert_eq!(
            params(&m, "/search/rust?page=2"),
            Some(vec![("term".into(), "rust".into())])
        );
    }

    #[test]
    fn test_encode_applies_to_literals() {
        fn upper(text: &str) -> String {
            text.to_uppercase()
        }
        let options = PatternOptions {
            sensitive: true,
            encode: Some(upper as fn(&str) -> String),
            ..PatternOptions::default()
        };
        let m = path_to_regex("/home", &options).unwrap();
        assert!(m.is_match("/HOME"));
        assert!(!m.is_match("/home"));
    }

    #[test]
    fn test_list_input_concatenates_keys() {
        let m = path_to_regex(vec!["/a/:x", "/b/:y"], &PatternOptions::default()).unwrap();
        let names: Vec<String> = m.keys().iter().map(|k| k.name.to_string()).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert_eq!(m.exec("/b/2"), Some(vec![None, Some("2")]));
    }

    #[test]
    fn test_regex_input_harvests_keys() {
        let regex = Regex::new(r"^/(?P<lang>[a-z]{2})/(\d+)$").unwrap();
        let m = path_to_regex(regex, &PatternOptions::default()).unwrap();
        assert_eq!(m.keys()[0].name, KeyName::Named("lang".into()));
        assert_eq!(m.keys()[1].name, KeyName::Index(0));
        assert_eq!(
            params(&m, "/en/12"),
            Some(vec![("lang".into(), "en".into()), ("0".into(), "12".into())])
        );
    }

    #[test]
    fn test_nested_named_group_is_rejected() {
        let err = path_to_regex("/:id((?P<x>a))", &PatternOptions::default()).unwrap_err();
        assert!(matches!(err, PatternError::CaptureMismatch { captures: 2, keys: 1 }));
    }

    #[test]
    fn test_lookaround_is_rejected() {
        let err = path_to_regex("/:id((?=a)a)", &PatternOptions::default()).unwrap_err();
        assert!(matches!(err, PatternError::InvalidRegex { .. }));
        assert!(err.is_syntax());
    }
}
