// Expression parser - converts query-option tokens to typed ASTs
//
// Precedence climbing over the injected operator table: parse a primary,
// then consume binary operators whose precedence clears the current
// threshold, re-entering with the threshold raised past the operator's
// precedence so equal-precedence chains nest to the left. Types are
// resolved on the fly: every node is constructed with its final EDM type,
// children first.

use crate::edm::{EdmProperty, EdmProvider, EdmType};
use crate::expression::error::{
    ExpressionParserError, ExpressionParserInternalError, ExpressionResult, TokenizerExpectError,
};
use crate::expression::node::{
    BinaryExpr, Expr, LiteralExpr, MemberExpr, MethodExpr, OrderByExpr, OrderExpr, PropertyExpr,
    SortDirection, UnaryExpr,
};
use crate::expression::tables::{BinaryOpInfo, BinaryOperator, MethodTable, OperatorTable};
use crate::syntax::{Lexer, Token, TokenKind};
use log::debug;

/// Parser for `$filter` and `$orderby` query options.
///
/// The grammar tables and the type-resolution provider are injected; the
/// parser holds no state beyond the token cursor, and parsing is pure:
/// identical input and provider answers always produce an identical tree.
pub struct ExpressionParser<'a> {
    operators: &'a OperatorTable,
    methods: &'a MethodTable,
    provider: &'a dyn EdmProvider,
    /// The resource type bare identifiers resolve against.
    source: EdmType,
    tokens: Vec<Token>,
    position: usize,
}

impl<'a> ExpressionParser<'a> {
    pub fn new(
        operators: &'a OperatorTable,
        methods: &'a MethodTable,
        provider: &'a dyn EdmProvider,
        source: EdmType,
        input: &str,
    ) -> ExpressionResult<Self> {
        let tokens = Lexer::new(input).tokenize()?;
        debug!("tokenized {:?} into {} tokens", input, tokens.len());
        Ok(ExpressionParser {
            operators,
            methods,
            provider,
            source,
            tokens,
            position: 0,
        })
    }

    /// Parse a complete `$filter` expression.
    pub fn parse_filter(mut self) -> ExpressionResult<Expr> {
        let expr = self.parse_expression(0)?;
        self.expect_end()?;
        debug!("parsed filter expression: {}", expr.uri_literal());
        Ok(expr)
    }

    /// Parse a complete `$orderby` option: one or more comma-separated
    /// items, each with an optional trailing `asc`/`desc`.
    pub fn parse_order_by(mut self) -> ExpressionResult<OrderByExpr> {
        let mut orders = Vec::new();

        loop {
            let operand = self.parse_expression(0)?;
            let direction = match &self.current().kind {
                TokenKind::Identifier(name) if name == "asc" => {
                    self.advance();
                    SortDirection::Asc
                }
                TokenKind::Identifier(name) if name == "desc" => {
                    self.advance();
                    SortDirection::Desc
                }
                _ => SortDirection::Asc,
            };
            orders.push(OrderExpr::new(operand, direction));

            if matches!(self.current().kind, TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        self.expect_end()?;
        Ok(OrderByExpr::new(orders))
    }

    fn parse_expression(&mut self, min_precedence: u8) -> ExpressionResult<Expr> {
        let mut left = self.parse_prefix()?;

        loop {
            let (op, op_position) = match self.peek_binary_operator() {
                Some(found) => found,
                None => break,
            };
            let info = self.binary_info(op)?;
            if info.precedence < min_precedence {
                break;
            }
            self.advance();
            let right = self.parse_expression(info.precedence + 1)?;
            left = self.apply_binary(op, info, op_position, left, right)?;
        }

        Ok(left)
    }

    /// Unary operators are a prefix production binding a single operand at
    /// their own precedence, tighter than every binary operator.
    fn parse_prefix(&mut self) -> ExpressionResult<Expr> {
        let token = self.current().clone();
        let op = match &token.kind {
            TokenKind::Minus => match self.operators.unary_operator("-") {
                Some(op) => Some(op),
                None => {
                    return Err(ExpressionParserError::UnsupportedOperator {
                        operator: "-".to_string(),
                        position: token.position,
                    }
                    .into())
                }
            },
            TokenKind::Identifier(name) => self.operators.unary_operator(name),
            _ => None,
        };

        let Some(op) = op else {
            return self.parse_primary();
        };

        let info = match self.operators.unary_info(op) {
            Some(info) => *info,
            None => {
                return Err(ExpressionParserInternalError::new(format!(
                    "unary operator '{}' is registered without a table entry",
                    op.as_str()
                ))
                .into())
            }
        };

        self.advance();
        let operand = self.parse_expression(info.precedence)?;

        if !(info.compat)(operand.edm_type()) {
            return Err(ExpressionParserError::IncompatibleType {
                context: format!("operator '{}'", op.as_str()),
                found: operand.edm_type().name().to_string(),
                position: token.position,
            }
            .into());
        }
        let edm_type = (info.result)(operand.edm_type()).ok_or_else(|| {
            ExpressionParserInternalError::new(format!(
                "unary operator '{}' has no result type for {}",
                op.as_str(),
                operand.edm_type().name()
            ))
        })?;

        Ok(Expr::Unary(UnaryExpr::new(op, operand, edm_type)))
    }

    fn parse_primary(&mut self) -> ExpressionResult<Expr> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Literal(value) => {
                self.advance();
                Ok(Expr::Literal(LiteralExpr::new(value, token.text)))
            }
            TokenKind::OpenParen => {
                self.advance();
                let expr = self.parse_expression(0)?;
                self.expect_close_paren()?;
                Ok(expr)
            }
            TokenKind::Identifier(name) => {
                if matches!(self.peek().kind, TokenKind::OpenParen) {
                    self.parse_method_call(&name, token.position)
                } else {
                    self.parse_member_path(&name, token.position)
                }
            }
            _ => Err(self.unexpected(&token)),
        }
    }

    /// An identifier chain joined by `/`, each segment resolved against the
    /// type the path has reached so far. Member access binds tightest of
    /// all, which falls out of handling it here in the primary production.
    fn parse_member_path(&mut self, first: &str, position: usize) -> ExpressionResult<Expr> {
        let start_type = self.source.clone();
        let property = self.resolve_property(&start_type, first, position)?;
        self.advance();
        let mut expr = Expr::Property(PropertyExpr::new(first, property.edm_type));

        while matches!(self.current().kind, TokenKind::Slash) {
            self.advance();
            let segment_token = self.current().clone();
            let TokenKind::Identifier(segment) = segment_token.kind else {
                return Err(self.unexpected(&segment_token));
            };
            self.advance();

            let declaring = expr.edm_type().clone();
            let property = self.resolve_property(&declaring, &segment, segment_token.position)?;
            let terminal = Expr::Property(PropertyExpr::new(&segment, property.edm_type));
            expr = Expr::Member(MemberExpr::new(expr, terminal));
        }

        Ok(expr)
    }

    fn parse_method_call(&mut self, name: &str, position: usize) -> ExpressionResult<Expr> {
        let info = match self.methods.lookup(name) {
            Some(info) => info.clone(),
            None => {
                return Err(ExpressionParserError::UnknownFunction {
                    name: name.to_string(),
                    position,
                }
                .into())
            }
        };
        self.advance(); // method name
        self.advance(); // opening parenthesis

        let mut args = Vec::new();
        if matches!(self.current().kind, TokenKind::CloseParen) {
            self.advance();
        } else {
            loop {
                // One argument past the widest declared arity can never
                // match; fail before parsing further.
                if args.len() == info.max_arity() {
                    return Err(ExpressionParserError::InvalidMethodArity {
                        name: info.name.clone(),
                        expected: info.describe_arities(),
                        actual: args.len() + 1,
                        position,
                    }
                    .into());
                }
                args.push(self.parse_expression(0)?);
                if matches!(self.current().kind, TokenKind::Comma) {
                    self.advance();
                } else {
                    self.expect_close_paren()?;
                    break;
                }
            }
        }

        let signature = info.signature_for_arity(args.len()).ok_or_else(|| {
            ExpressionParserError::InvalidMethodArity {
                name: info.name.clone(),
                expected: info.describe_arities(),
                actual: args.len(),
                position,
            }
        })?;

        for (index, (param, arg)) in signature.params.iter().zip(&args).enumerate() {
            if !param.accepts(arg.edm_type()) {
                return Err(ExpressionParserError::IncompatibleType {
                    context: format!("argument {} of '{}'", index + 1, info.name),
                    found: arg.edm_type().name().to_string(),
                    position,
                }
                .into());
            }
        }

        let arg_types: Vec<EdmType> = args.iter().map(|a| a.edm_type().clone()).collect();
        let edm_type = (signature.result)(&arg_types).ok_or_else(|| {
            ExpressionParserInternalError::new(format!(
                "method '{}' has no result type for its declared signature",
                info.name
            ))
        })?;

        Ok(Expr::Method(MethodExpr::new(info.name, args, edm_type)))
    }

    fn apply_binary(
        &self,
        op: BinaryOperator,
        info: BinaryOpInfo,
        position: usize,
        left: Expr,
        right: Expr,
    ) -> ExpressionResult<Expr> {
        if !(info.compat)(left.edm_type(), right.edm_type()) {
            return Err(ExpressionParserError::IncompatibleType {
                context: format!("operator '{}'", op.as_str()),
                found: format!(
                    "{} and {}",
                    left.edm_type().name(),
                    right.edm_type().name()
                ),
                position,
            }
            .into());
        }
        let edm_type = (info.result)(left.edm_type(), right.edm_type()).ok_or_else(|| {
            ExpressionParserInternalError::new(format!(
                "binary operator '{}' has no result type for {} and {}",
                op.as_str(),
                left.edm_type().name(),
                right.edm_type().name()
            ))
        })?;
        Ok(Expr::Binary(BinaryExpr::new(op, left, right, edm_type)))
    }

    /// An identifier in operator position, looked up in the injected table.
    fn peek_binary_operator(&self) -> Option<(BinaryOperator, usize)> {
        let token = self.current();
        match &token.kind {
            TokenKind::Identifier(name) => self
                .operators
                .binary_operator(name)
                .map(|op| (op, token.position)),
            _ => None,
        }
    }

    fn binary_info(&self, op: BinaryOperator) -> ExpressionResult<BinaryOpInfo> {
        self.operators.binary_info(op).copied().ok_or_else(|| {
            ExpressionParserInternalError::new(format!(
                "binary operator '{}' is registered without a table entry",
                op.as_str()
            ))
            .into()
        })
    }

    fn resolve_property(
        &self,
        declaring: &EdmType,
        name: &str,
        position: usize,
    ) -> ExpressionResult<EdmProperty> {
        self.provider.property(declaring, name).ok_or_else(|| {
            ExpressionParserError::UnknownProperty {
                name: name.to_string(),
                declaring: declaring.name().to_string(),
                position,
            }
            .into()
        })
    }

    /// Nothing may remain after a complete expression. A leftover
    /// identifier was meant as an operator this catalog does not know.
    fn expect_end(&self) -> ExpressionResult<()> {
        let token = self.current();
        match &token.kind {
            TokenKind::End => Ok(()),
            TokenKind::Identifier(name) => Err(ExpressionParserError::UnsupportedOperator {
                operator: name.clone(),
                position: token.position,
            }
            .into()),
            _ => Err(self.unexpected(token)),
        }
    }

    fn expect_close_paren(&mut self) -> ExpressionResult<()> {
        let token = self.current().clone();
        if matches!(token.kind, TokenKind::CloseParen) {
            self.advance();
            Ok(())
        } else {
            Err(TokenizerExpectError {
                expected: "')'",
                found: token.describe(),
                position: token.position,
            }
            .into())
        }
    }

    fn unexpected(&self, token: &Token) -> crate::expression::error::ExpressionError {
        ExpressionParserError::UnexpectedToken {
            found: token.describe(),
            position: token.position,
        }
        .into()
    }

    fn current(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.position + 1)
            .unwrap_or_else(|| &self.tokens[self.tokens.len() - 1])
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }
}

/// Parse a `$filter` option with the default grammar tables.
pub fn parse_filter(
    input: &str,
    source: &EdmType,
    provider: &dyn EdmProvider,
) -> ExpressionResult<Expr> {
    let operators = OperatorTable::new();
    let methods = MethodTable::new();
    ExpressionParser::new(&operators, &methods, provider, source.clone(), input)?.parse_filter()
}

/// Parse an `$orderby` option with the default grammar tables.
pub fn parse_order_by(
    input: &str,
    source: &EdmType,
    provider: &dyn EdmProvider,
) -> ExpressionResult<OrderByExpr> {
    let operators = OperatorTable::new();
    let methods = MethodTable::new();
    ExpressionParser::new(&operators, &methods, provider, source.clone(), input)?.parse_order_by()
}
