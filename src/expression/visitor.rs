//! Double-dispatch visitor protocol for expression trees.
//!
//! One callback per node kind. Each callback receives the syntax node plus
//! the already-folded results of its children: `accept` drives a
//! depth-first, children-before-parent, left-to-right traversal, so a
//! callback may always assume its children are complete. The accumulator
//! shape is entirely the visitor's business (a JSON fragment, a WHERE
//! clause with placeholder bookkeeping, a runtime value, ...).
//!
//! Visitors never mutate the tree. A tree may be folded by several
//! unrelated visitors, sequentially or concurrently, with no residue
//! observable from one fold to the next.

use crate::expression::node::{
    BinaryExpr, Expr, LiteralExpr, MemberExpr, MethodExpr, OrderByExpr, OrderExpr, PropertyExpr,
    UnaryExpr,
};

/// A consumer folding an expression tree into some target representation.
pub trait ExpressionVisitor {
    type Output;

    fn visit_literal(&mut self, node: &LiteralExpr) -> Self::Output;

    fn visit_property(&mut self, node: &PropertyExpr) -> Self::Output;

    /// `source` and `property` are the folded results of the path so far
    /// and of the terminal segment.
    fn visit_member(
        &mut self,
        node: &MemberExpr,
        source: Self::Output,
        property: Self::Output,
    ) -> Self::Output;

    fn visit_unary(&mut self, node: &UnaryExpr, operand: Self::Output) -> Self::Output;

    /// `left` is folded before `right`.
    fn visit_binary(
        &mut self,
        node: &BinaryExpr,
        left: Self::Output,
        right: Self::Output,
    ) -> Self::Output;

    /// `args` holds the folded arguments in declaration order.
    fn visit_method(&mut self, node: &MethodExpr, args: Vec<Self::Output>) -> Self::Output;

    fn visit_order(&mut self, node: &OrderExpr, operand: Self::Output) -> Self::Output;

    /// `orders` holds the folded items in declared order.
    fn visit_order_by(&mut self, node: &OrderByExpr, orders: Vec<Self::Output>) -> Self::Output;
}

impl Expr {
    /// Fold this tree bottom-up with `visitor`.
    pub fn accept<V: ExpressionVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Expr::Literal(node) => visitor.visit_literal(node),
            Expr::Property(node) => visitor.visit_property(node),
            Expr::Member(node) => {
                let source = node.source.accept(visitor);
                let property = node.property.accept(visitor);
                visitor.visit_member(node, source, property)
            }
            Expr::Unary(node) => {
                let operand = node.operand.accept(visitor);
                visitor.visit_unary(node, operand)
            }
            Expr::Binary(node) => {
                let left = node.left.accept(visitor);
                let right = node.right.accept(visitor);
                visitor.visit_binary(node, left, right)
            }
            Expr::Method(node) => {
                let args = node.args.iter().map(|arg| arg.accept(visitor)).collect();
                visitor.visit_method(node, args)
            }
        }
    }
}

impl OrderByExpr {
    /// Fold every item in declared order, then the sequence itself.
    pub fn accept<V: ExpressionVisitor>(&self, visitor: &mut V) -> V::Output {
        let orders = self
            .orders
            .iter()
            .map(|order| {
                let operand = order.operand.accept(visitor);
                visitor.visit_order(order, operand)
            })
            .collect();
        visitor.visit_order_by(self, orders)
    }
}
