//! Lexical layer error types.

use std::fmt;

/// What the tokenizer found that it could not classify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizerErrorKind {
    /// No lexical class matches the character at the cursor.
    UnknownCharacter(char),
    /// A string literal is missing its closing quote.
    UnterminatedString,
    /// A literal matched a class but its payload is invalid, e.g.
    /// `datetime'not-a-date'` or `1.5L`.
    MalformedLiteral { class: &'static str, text: String },
}

/// Raised when the input cannot be split into tokens. Carries the absolute
/// character offset of the failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizerError {
    pub position: usize,
    pub kind: TokenizerErrorKind,
}

impl TokenizerError {
    pub fn new(position: usize, kind: TokenizerErrorKind) -> Self {
        Self { position, kind }
    }
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenizerErrorKind::UnknownCharacter(c) => {
                write!(f, "unrecognized character {:?} at position {}", c, self.position)
            }
            TokenizerErrorKind::UnterminatedString => {
                write!(f, "unterminated string literal at position {}", self.position)
            }
            TokenizerErrorKind::MalformedLiteral { class, text } => write!(
                f,
                "malformed {} literal {:?} at position {}",
                class, text, self.position
            ),
        }
    }
}

impl std::error::Error for TokenizerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TokenizerError::new(3, TokenizerErrorKind::UnknownCharacter('#'));
        assert_eq!(err.to_string(), "unrecognized character '#' at position 3");

        let err = TokenizerError::new(0, TokenizerErrorKind::UnterminatedString);
        assert_eq!(err.to_string(), "unterminated string literal at position 0");

        let err = TokenizerError::new(
            5,
            TokenizerErrorKind::MalformedLiteral {
                class: "datetime",
                text: "nope".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "malformed datetime literal \"nope\" at position 5"
        );
    }
}
