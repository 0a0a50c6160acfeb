//! Path pattern compilation.
//!
//! # Data Flow
//! ```text
//! "/users/:id(\\d+)"
//!     → token.rs    (lexer: MODIFIER, NAME, PATTERN, CHAR, ...)
//!     → parser.rs   (literal segments + parameter keys)
//!     → compile.rs  (regex synthesis, key order == capture order)
//!     → Matcher
//! ```
//!
//! # Grammar
//! - `:name` named parameter, stops at delimiter characters
//! - `(regex)` inline parameter body, no capturing sub-groups
//! - `{prefix:name suffix}` explicit group
//! - `?`, `*`, `+` modifiers on the preceding parameter or group
//! - `\x` literal character
//!
//! # Design Decisions
//! - All errors surface at compile time; matching never fails
//! - Options are plain data, shared by every route of a table

pub mod compile;
pub mod error;
pub mod parser;
pub mod token;

use serde::{Deserialize, Serialize};

pub use compile::{path_to_regex, tokens_to_regex, Matcher, PathInput};
pub use error::PatternError;
pub use parser::{parse, parse_str, Key, KeyName, Modifier, PathToken};
pub use token::{tokenize, Token, TokenKind};

/// Transform applied to literal text before escaping.
pub type Encoder = fn(&str) -> String;

/// Options controlling parsing and regex synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternOptions {
    /// Characters that separate path segments.
    pub delimiter: String,

    /// Characters that may act as an implicit parameter prefix.
    pub prefixes: String,

    /// Match case-sensitively.
    pub sensitive: bool,

    /// Disallow an optional trailing delimiter.
    pub strict: bool,

    /// Anchor at the start of the path.
    pub start: bool,

    /// Anchor at the end of the path. When false, partial (prefix) matches
    /// are allowed as long as they stop on a segment boundary.
    pub end: bool,

    /// Extra characters that terminate a match.
    pub ends_with: String,

    /// Per-segment transform for literal text.
    #[serde(skip)]
    pub encode: Option<Encoder>,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            delimiter: "/#?".to_string(),
            prefixes: "./".to_string(),
            sensitive: false,
            strict: false,
            start: true,
            end: true,
            ends_with: String::new(),
            encode: None,
        }
    }
}
