//! Pattern lexer.
//!
//! # Responsibilities
//! - Split a pattern string into typed tokens
//! - Reject malformed names, escapes and inline expressions early
//!
//! # Design Decisions
//! - Positions are character indices, not byte offsets
//! - The token stream always ends with a single `End` token

use std::fmt;

use crate::pattern::error::PatternError;

/// Kind of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `*`, `+` or `?`.
    Modifier,
    /// `\x`, the value is the escaped character.
    EscapedChar,
    /// `{`
    Open,
    /// `}`
    Close,
    /// `:name`, the value is the name without the colon.
    Name,
    /// `(...)`, the value is the body without the outer parentheses.
    Pattern,
    /// Any other character.
    Char,
    /// End of input.
    End,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Modifier => "MODIFIER",
            TokenKind::EscapedChar => "ESCAPED_CHAR",
            TokenKind::Open => "OPEN",
            TokenKind::Close => "CLOSE",
            TokenKind::Name => "NAME",
            TokenKind::Pattern => "PATTERN",
            TokenKind::Char => "CHAR",
            TokenKind::End => "END",
        };
        f.write_str(name)
    }
}

/// A lexed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Character index of the token start.
    pub position: usize,
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, position: usize, text: impl Into<String>) -> Self {
        Self {
            kind,
            position,
            text: text.into(),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Tokenize a path pattern.
pub fn tokenize(pattern: &str) -> Result<Vec<Token>, PatternError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '*' | '+' | '?' => {
                tokens.push(Token::new(TokenKind::Modifier, i, c));
                i += 1;
            }
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .ok_or_else(|| PatternError::syntax("Missing escaped character", i))?;
                tokens.push(Token::new(TokenKind::EscapedChar, i, *escaped));
                i += 2;
            }
            '{' => {
                tokens.push(Token::new(TokenKind::Open, i, c));
                i += 1;
            }
            '}' => {
                tokens.push(Token::new(TokenKind::Close, i, c));
                i += 1;
            }
            ':' => {
                let name: String = chars[i + 1..]
                    .iter()
                    .take_while(|c| is_name_char(**c))
                    .collect();
                if name.is_empty() {
                    return Err(PatternError::syntax("Missing parameter name", i));
                }
                let next = i + 1 + name.chars().count();
                tokens.push(Token::new(TokenKind::Name, i, name));
                i = next;
            }
            '(' => {
                let (body, next) = lex_group(&chars, i)?;
                tokens.push(Token::new(TokenKind::Pattern, i, body));
                i = next;
            }
            _ => {
                tokens.push(Token::new(TokenKind::Char, i, c));
                i += 1;
            }
        }
    }

    tokens.push(Token::new(TokenKind::End, i, ""));
    Ok(tokens)
}

/// Scan a balanced inline expression starting at `start` (an opening
/// parenthesis). Returns the body and the index just past the closing one.
fn lex_group(chars: &[char], start: usize) -> Result<(String, usize), PatternError> {
    let mut depth = 1;
    let mut body = String::new();
    let mut j = start + 1;

    if chars.get(j) == Some(&'?') {
        return Err(PatternError::syntax("Pattern cannot start with \"?\"", j));
    }

    while j < chars.len() {
        match chars[j] {
            '\\' => {
                let escaped = chars
                    .get(j + 1)
                    .ok_or_else(|| PatternError::syntax("Missing escaped character", j))?;
                body.push('\\');
                body.push(*escaped);
                j += 2;
                continue;
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    j += 1;
                    break;
                }
            }
            '(' => {
                depth += 1;
                if chars.get(j + 1) != Some(&'?') {
                    return Err(PatternError::syntax("Capturing groups are not allowed", j));
                }
            }
            _ => {}
        }
        body.push(chars[j]);
        j += 1;
    }

    if depth != 0 {
        return Err(PatternError::syntax("Unbalanced pattern", start));
    }
    if body.is_empty() {
        return Err(PatternError::syntax("Missing pattern", start));
    }

    Ok((body, j))
}
