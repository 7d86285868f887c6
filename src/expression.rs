//! Expression engine for query options.
//!
//! This module provides:
//! - The full error taxonomy for expression parsing
//! - Immutable operator and method grammar tables
//! - The precedence-climbing parser with on-the-fly EDM type resolution
//! - The typed, immutable AST node model
//! - The visitor protocol, with two concrete consumers (an in-memory
//!   predicate evaluator and a diagnostic JSON dump)

pub mod error;
pub mod eval;
pub mod json;
pub mod node;
pub mod parser;
pub mod tables;
pub mod visitor;

pub use error::{
    ExpressionError, ExpressionParserError, ExpressionParserInternalError, ExpressionResult,
    TokenizerExpectError,
};
pub use eval::{EvalError, EvalResult, PredicateEvaluator};
pub use json::JsonDumpVisitor;
pub use node::{
    BinaryExpr, Expr, ExprKind, LiteralExpr, MemberExpr, MethodExpr, OrderByExpr, OrderExpr,
    PropertyExpr, SortDirection, UnaryExpr,
};
pub use parser::{parse_filter, parse_order_by, ExpressionParser};
pub use tables::{
    BinaryOpInfo, BinaryOperator, MethodInfo, MethodSignature, MethodTable, OperatorTable,
    ParamKind, UnaryOpInfo, UnaryOperator,
};
pub use visitor::ExpressionVisitor;
