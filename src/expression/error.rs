//! Error types for expression parsing.
//!
//! Lexical, syntactic, and semantic failures are distinct categories so
//! callers (and tests) can assert on the precise kind. Every variant
//! carries the absolute character offset of the offending token. A parse
//! either returns a complete, type-checked tree or exactly one of these.

use crate::syntax::TokenizerError;
use thiserror::Error;

/// A structurally required token (e.g. a closing parenthesis) is missing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("expected {expected} at position {position}, found {found}")]
pub struct TokenizerExpectError {
    pub expected: &'static str,
    pub found: String,
    pub position: usize,
}

/// Syntactic or semantic parse failures tied to a token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpressionParserError {
    #[error("unexpected {found} at position {position}")]
    UnexpectedToken { found: String, position: usize },

    #[error("unknown property '{name}' on type {declaring} at position {position}")]
    UnknownProperty {
        name: String,
        declaring: String,
        position: usize,
    },

    #[error("unknown function '{name}' at position {position}")]
    UnknownFunction { name: String, position: usize },

    #[error("unsupported operator '{operator}' at position {position}")]
    UnsupportedOperator { operator: String, position: usize },

    #[error("method '{name}' accepts {expected} arguments, got {actual} at position {position}")]
    InvalidMethodArity {
        name: String,
        /// Human-readable list of the declared arities, e.g. `"2 or 3"`.
        expected: String,
        actual: usize,
        position: usize,
    },

    #[error("{context} is not applicable to {found} at position {position}")]
    IncompatibleType {
        /// What was being applied, e.g. `operator 'add'` or
        /// `argument 2 of 'substring'`.
        context: String,
        /// Offending type name(s).
        found: String,
        position: usize,
    },
}

/// A grammar-table defect: an operator or method signature registered
/// without a usable result rule. This is a library bug, never a
/// data-dependent condition, and must not be caught and retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("expression parser internal error: {message}")]
pub struct ExpressionParserInternalError {
    pub message: String,
}

impl ExpressionParserInternalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Every failure the expression engine can surface.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error(transparent)]
    Tokenizer(#[from] TokenizerError),

    #[error(transparent)]
    TokenizerExpect(#[from] TokenizerExpectError),

    #[error(transparent)]
    Parser(#[from] ExpressionParserError),

    #[error(transparent)]
    Internal(#[from] ExpressionParserInternalError),
}

/// Result type for expression operations.
pub type ExpressionResult<T> = Result<T, ExpressionError>;
