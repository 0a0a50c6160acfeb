//! Pattern compilation errors.

use thiserror::Error;

use crate::pattern::token::TokenKind;

/// Errors raised while compiling a path pattern.
///
/// Every variant is produced synchronously at compile time; matching a path
/// against an already compiled pattern never fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The pattern text is malformed (bad escape, missing name, illegal group).
    #[error("{message} at {position}")]
    Syntax { message: String, position: usize },

    /// The parser found a token of the wrong kind.
    #[error("Unexpected {found} at {position}, expected {expected}")]
    UnexpectedToken {
        found: TokenKind,
        expected: TokenKind,
        position: usize,
    },

    /// The synthesized expression was rejected by the regex engine.
    #[error("Invalid expression `{source_text}`: {reason}")]
    InvalidRegex { source_text: String, reason: String },

    /// Capture groups and parameter keys disagree.
    #[error("Expression has {captures} capture groups but {keys} keys")]
    CaptureMismatch { captures: usize, keys: usize },
}

impl PatternError {
    pub(crate) fn syntax(message: impl Into<String>, position: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            position,
        }
    }

    /// True for errors raised by the tokenizer or by regex synthesis, as
    /// opposed to grammar (token order) errors.
    pub fn is_syntax(&self) -> bool {
        !matches!(self, Self::UnexpectedToken { .. })
    }
}
