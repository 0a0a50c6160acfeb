//! Pattern parser.
//!
//! # Responsibilities
//! - Turn the token stream into literal segments and parameter keys
//! - Attach implicit prefixes (`/:id`) and explicit `{prefix:name suffix}` groups
//! - Assign ordinals to anonymous `(pattern)` captures

use std::fmt;

use serde::Serialize;

use crate::pattern::error::PatternError;
use crate::pattern::token::{tokenize, Token, TokenKind};
use crate::pattern::PatternOptions;

/// Repetition modifier attached to a parameter or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Modifier {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "?")]
    Optional,
    #[serde(rename = "*")]
    ZeroOrMore,
    #[serde(rename = "+")]
    OneOrMore,
}

impl Modifier {
    fn from_text(text: &str) -> Self {
        match text {
            "?" => Modifier::Optional,
            "*" => Modifier::ZeroOrMore,
            "+" => Modifier::OneOrMore,
            _ => Modifier::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::None => "",
            Modifier::Optional => "?",
            Modifier::ZeroOrMore => "*",
            Modifier::OneOrMore => "+",
        }
    }

    /// True for `*` and `+`.
    pub fn is_repeating(&self) -> bool {
        matches!(self, Modifier::ZeroOrMore | Modifier::OneOrMore)
    }
}

/// Identity of a parameter: its declared name, or its position among the
/// anonymous captures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum KeyName {
    Named(String),
    Index(usize),
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyName::Named(name) => f.write_str(name),
            KeyName::Index(index) => write!(f, "{}", index),
        }
    }
}

/// A parameter descriptor. One key per capture group, in capture order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Key {
    pub name: KeyName,
    pub prefix: String,
    pub suffix: String,
    /// Regex fragment for the parameter body. Empty for keys harvested from a
    /// user supplied regex.
    pub pattern: String,
    pub modifier: Modifier,
}

/// One element of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathToken {
    /// Literal text, matched verbatim.
    Literal(String),
    /// A capturing parameter.
    Param(Key),
    /// A `{...}` group without a name or pattern: literal text with a modifier.
    Group {
        prefix: String,
        suffix: String,
        modifier: Modifier,
    },
}

/// Regex fragment used for a `:name` without an inline pattern.
pub(crate) fn default_pattern(delimiter: &str) -> String {
    if delimiter.is_empty() {
        "(?s:.)+?".to_string()
    } else {
        format!("[^{}]+?", regex::escape(delimiter))
    }
}

struct Cursor<'a> {
    tokens: &'a [Token],
    index: usize,
}

impl<'a> Cursor<'a> {
    fn try_consume(&mut self, kind: TokenKind) -> Option<&'a str> {
        match self.tokens.get(self.index) {
            Some(token) if token.kind == kind => {
                self.index += 1;
                Some(token.text.as_str())
            }
            _ => None,
        }
    }

    fn must_consume(&mut self, kind: TokenKind) -> Result<&'a str, PatternError> {
        if let Some(text) = self.try_consume(kind) {
            return Ok(text);
        }
        // The lexer always terminates the stream with End, so a token exists
        // unless End itself was already consumed.
        let (found, position) = self
            .tokens
            .get(self.index)
            .or_else(|| self.tokens.last())
            .map(|t| (t.kind, t.position))
            .unwrap_or((TokenKind::End, 0));
        Err(PatternError::UnexpectedToken {
            found,
            expected: kind,
            position,
        })
    }

    fn consume_text(&mut self) -> String {
        let mut text = String::new();
        while let Some(value) = self
            .try_consume(TokenKind::Char)
            .or_else(|| self.try_consume(TokenKind::EscapedChar))
        {
            text.push_str(value);
        }
        text
    }

    fn consume_modifier(&mut self) -> Modifier {
        self.try_consume(TokenKind::Modifier)
            .map(Modifier::from_text)
            .unwrap_or_default()
    }

    fn is_done(&self) -> bool {
        self.index >= self.tokens.len()
    }
}

/// Parse a token stream into path tokens.
pub fn parse(tokens: &[Token], options: &PatternOptions) -> Result<Vec<PathToken>, PatternError> {
    let default_pattern = default_pattern(&options.delimiter);
    let mut cursor = Cursor { tokens, index: 0 };
    let mut result = Vec::new();
    let mut ordinal = 0;
    let mut path = String::new();

    while !cursor.is_done() {
        let char = cursor.try_consume(TokenKind::Char);
        let name = cursor.try_consume(TokenKind::Name);
        let pattern = cursor.try_consume(TokenKind::Pattern);

        if name.is_some() || pattern.is_some() {
            let mut prefix = char.unwrap_or_default().to_string();
            if !prefix.is_empty() && !options.prefixes.contains(prefix.as_str()) {
                path.push_str(&prefix);
                prefix.clear();
            }
            if !path.is_empty() {
                result.push(PathToken::Literal(std::mem::take(&mut path)));
            }

            let name = match name {
                Some(name) => KeyName::Named(name.to_string()),
                None => {
                    ordinal += 1;
                    KeyName::Index(ordinal - 1)
                }
            };
            result.push(PathToken::Param(Key {
                name,
                prefix,
                suffix: String::new(),
                pattern: pattern.map(str::to_string).unwrap_or_else(|| default_pattern.clone()),
                modifier: cursor.consume_modifier(),
            }));
            continue;
        }

        if let Some(value) = char.or_else(|| cursor.try_consume(TokenKind::EscapedChar)) {
            path.push_str(value);
            continue;
        }

        if !path.is_empty() {
            result.push(PathToken::Literal(std::mem::take(&mut path)));
        }

        if cursor.try_consume(TokenKind::Open).is_some() {
            let prefix = cursor.consume_text();
            let name = cursor.try_consume(TokenKind::Name);
            let pattern = cursor.try_consume(TokenKind::Pattern);
            let suffix = cursor.consume_text();
            cursor.must_consume(TokenKind::Close)?;
            let modifier = cursor.consume_modifier();

            let token = match (name, pattern) {
                (None, None) => PathToken::Group {
                    prefix,
                    suffix,
                    modifier,
                },
                (name, pattern) => {
                    let name = match name {
                        Some(name) => KeyName::Named(name.to_string()),
                        None => {
                            ordinal += 1;
                            KeyName::Index(ordinal - 1)
                        }
                    };
                    PathToken::Param(Key {
                        name,
                        prefix,
                        suffix,
                        pattern: pattern
                            .map(str::to_string)
                            .unwrap_or_else(|| default_pattern.clone()),
                        modifier,
                    })
                }
            };
            result.push(token);
            continue;
        }

        cursor.must_consume(TokenKind::End)?;
    }

    Ok(result)
}

/// Tokenize and parse a pattern string.
pub fn parse_str(pattern: &str, options: &PatternOptions) -> Result<Vec<PathToken>, PatternError> {
    let tokens = tokenize(pattern)?;
    parse(&tokens, options)
}
