//! Expression AST definitions.
//!
//! Nodes are built bottom-up by the parser: children exist, fully typed,
//! before their parent is constructed, and each node's EDM type is computed
//! exactly once at construction. A returned tree is never mutated; it can
//! be shared read-only and folded by any number of visitors.

use crate::edm::{EdmSimpleType, EdmType, EdmValue};
use crate::expression::tables::{BinaryOperator, UnaryOperator};
use serde::Serialize;
use std::fmt;

/// Node kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExprKind {
    Literal,
    Property,
    Member,
    Unary,
    Binary,
    Method,
}

/// Sort direction of one `$orderby` item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// A typed literal. Keeps the raw token text so reconstruction echoes the
/// source spelling (`'it''s'`, `42L`, `datetime'...'`).
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpr {
    pub value: EdmValue,
    pub text: String,
    pub edm_type: EdmType,
}

impl LiteralExpr {
    pub fn new(value: EdmValue, text: impl Into<String>) -> Self {
        let edm_type = EdmType::Simple(value.simple_type());
        Self {
            value,
            text: text.into(),
            edm_type,
        }
    }
}

/// A single resolved property reference.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyExpr {
    pub name: String,
    pub edm_type: EdmType,
}

impl PropertyExpr {
    pub fn new(name: impl Into<String>, edm_type: EdmType) -> Self {
        Self {
            name: name.into(),
            edm_type,
        }
    }
}

/// A navigation path step, e.g. `Address/City`. The node's type equals the
/// terminal property's type.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    pub source: Box<Expr>,
    pub property: Box<Expr>,
    pub edm_type: EdmType,
}

impl MemberExpr {
    pub fn new(source: Expr, property: Expr) -> Self {
        let edm_type = property.edm_type().clone();
        Self {
            source: Box::new(source),
            property: Box::new(property),
            edm_type,
        }
    }
}

/// A prefix operator application.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOperator,
    pub operand: Box<Expr>,
    pub edm_type: EdmType,
}

impl UnaryExpr {
    pub fn new(op: UnaryOperator, operand: Expr, edm_type: EdmType) -> Self {
        Self {
            op,
            operand: Box::new(operand),
            edm_type,
        }
    }
}

/// A binary operator application: exactly one operator, exactly two
/// children.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOperator,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub edm_type: EdmType,
}

impl BinaryExpr {
    pub fn new(op: BinaryOperator, left: Expr, right: Expr, edm_type: EdmType) -> Self {
        Self {
            op,
            left: Box::new(left),
            right: Box::new(right),
            edm_type,
        }
    }
}

/// A method call whose argument count matched one of the method's declared
/// arities.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodExpr {
    pub name: String,
    pub args: Vec<Expr>,
    pub edm_type: EdmType,
}

impl MethodExpr {
    pub fn new(name: impl Into<String>, args: Vec<Expr>, edm_type: EdmType) -> Self {
        Self {
            name: name.into(),
            args,
            edm_type,
        }
    }
}

/// Expression tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(LiteralExpr),
    Property(PropertyExpr),
    Member(MemberExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Method(MethodExpr),
}

impl Expr {
    pub fn kind(&self) -> ExprKind {
        match self {
            Expr::Literal(_) => ExprKind::Literal,
            Expr::Property(_) => ExprKind::Property,
            Expr::Member(_) => ExprKind::Member,
            Expr::Unary(_) => ExprKind::Unary,
            Expr::Binary(_) => ExprKind::Binary,
            Expr::Method(_) => ExprKind::Method,
        }
    }

    /// The node's EDM type, resolved at construction.
    pub fn edm_type(&self) -> &EdmType {
        match self {
            Expr::Literal(n) => &n.edm_type,
            Expr::Property(n) => &n.edm_type,
            Expr::Member(n) => &n.edm_type,
            Expr::Unary(n) => &n.edm_type,
            Expr::Binary(n) => &n.edm_type,
            Expr::Method(n) => &n.edm_type,
        }
    }

    /// Canonical textual reconstruction. Operator applications are fully
    /// parenthesized so re-parsing the text reproduces the tree shape.
    pub fn uri_literal(&self) -> String {
        match self {
            Expr::Literal(n) => n.text.clone(),
            Expr::Property(n) => n.name.clone(),
            Expr::Member(n) => {
                format!("{}/{}", n.source.uri_literal(), n.property.uri_literal())
            }
            Expr::Unary(n) => match n.op {
                UnaryOperator::Not => format!("(not {})", n.operand.uri_literal()),
                UnaryOperator::Minus => format!("(-{})", n.operand.uri_literal()),
            },
            Expr::Binary(n) => format!(
                "({} {} {})",
                n.left.uri_literal(),
                n.op.as_str(),
                n.right.uri_literal()
            ),
            Expr::Method(n) => {
                let args: Vec<String> = n.args.iter().map(|a| a.uri_literal()).collect();
                format!("{}({})", n.name, args.join(","))
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri_literal())
    }
}

/// One `$orderby` item: an expression plus a direction (ascending when the
/// input left it unspecified).
#[derive(Debug, Clone, PartialEq)]
pub struct OrderExpr {
    pub operand: Expr,
    pub direction: SortDirection,
}

impl OrderExpr {
    pub fn new(operand: Expr, direction: SortDirection) -> Self {
        Self { operand, direction }
    }

    pub fn edm_type(&self) -> &EdmType {
        self.operand.edm_type()
    }

    pub fn uri_literal(&self) -> String {
        format!("{} {}", self.operand.uri_literal(), self.direction.as_str())
    }
}

/// The parsed form of a `$orderby` option: a non-empty ordered sequence of
/// items.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub orders: Vec<OrderExpr>,
}

impl OrderByExpr {
    pub fn new(orders: Vec<OrderExpr>) -> Self {
        Self { orders }
    }

    /// The sequence itself has no value type.
    pub fn edm_type(&self) -> EdmType {
        EdmType::Simple(EdmSimpleType::Null)
    }

    pub fn uri_literal(&self) -> String {
        let items: Vec<String> = self.orders.iter().map(|o| o.uri_literal()).collect();
        items.join(",")
    }
}

impl fmt::Display for OrderByExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri_literal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_literal(n: i32) -> Expr {
        Expr::Literal(LiteralExpr::new(EdmValue::Int32(n), n.to_string()))
    }

    fn age_property() -> Expr {
        Expr::Property(PropertyExpr::new(
            "Age",
            EdmType::Simple(EdmSimpleType::Int32),
        ))
    }

    #[test]
    fn test_literal_node() {
        let node = int_literal(42);
        assert_eq!(node.kind(), ExprKind::Literal);
        assert_eq!(node.edm_type(), &EdmType::Simple(EdmSimpleType::Int32));
        assert_eq!(node.uri_literal(), "42");
    }

    #[test]
    fn test_binary_reconstruction() {
        let node = Expr::Binary(BinaryExpr::new(
            BinaryOperator::Ge,
            age_property(),
            int_literal(21),
            EdmType::Simple(EdmSimpleType::Boolean),
        ));
        assert_eq!(node.kind(), ExprKind::Binary);
        assert_eq!(node.uri_literal(), "(Age ge 21)");
        assert_eq!(node.edm_type(), &EdmType::Simple(EdmSimpleType::Boolean));
    }

    #[test]
    fn test_unary_reconstruction() {
        let not_node = Expr::Unary(UnaryExpr::new(
            UnaryOperator::Not,
            Expr::Property(PropertyExpr::new(
                "Active",
                EdmType::Simple(EdmSimpleType::Boolean),
            )),
            EdmType::Simple(EdmSimpleType::Boolean),
        ));
        assert_eq!(not_node.uri_literal(), "(not Active)");

        let neg_node = Expr::Unary(UnaryExpr::new(
            UnaryOperator::Minus,
            int_literal(5),
            EdmType::Simple(EdmSimpleType::Int32),
        ));
        assert_eq!(neg_node.uri_literal(), "(-5)");
    }

    #[test]
    fn test_member_type_is_terminal_property_type() {
        let address = Expr::Property(PropertyExpr::new(
            "Address",
            EdmType::Complex("Address".to_string()),
        ));
        let city = Expr::Property(PropertyExpr::new(
            "City",
            EdmType::Simple(EdmSimpleType::String),
        ));
        let member = Expr::Member(MemberExpr::new(address, city));

        assert_eq!(member.kind(), ExprKind::Member);
        assert_eq!(member.edm_type(), &EdmType::Simple(EdmSimpleType::String));
        assert_eq!(member.uri_literal(), "Address/City");
    }

    #[test]
    fn test_method_reconstruction() {
        let node = Expr::Method(MethodExpr::new(
            "substring",
            vec![
                Expr::Property(PropertyExpr::new(
                    "Name",
                    EdmType::Simple(EdmSimpleType::String),
                )),
                int_literal(1),
            ],
            EdmType::Simple(EdmSimpleType::String),
        ));
        assert_eq!(node.uri_literal(), "substring(Name,1)");
    }

    #[test]
    fn test_order_by_reconstruction() {
        let order_by = OrderByExpr::new(vec![
            OrderExpr::new(age_property(), SortDirection::Desc),
            OrderExpr::new(
                Expr::Property(PropertyExpr::new(
                    "Name",
                    EdmType::Simple(EdmSimpleType::String),
                )),
                SortDirection::Asc,
            ),
        ]);
        assert_eq!(order_by.uri_literal(), "Age desc,Name asc");
        assert_eq!(
            order_by.orders[0].edm_type(),
            &EdmType::Simple(EdmSimpleType::Int32)
        );
    }
}
