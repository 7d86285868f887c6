//! Diagnostic JSON dump of expression trees.

use crate::expression::node::{
    BinaryExpr, ExprKind, LiteralExpr, MemberExpr, MethodExpr, OrderByExpr, OrderExpr,
    PropertyExpr, UnaryExpr,
};
use crate::expression::visitor::ExpressionVisitor;
use serde_json::{json, Value as JsonValue};

/// Folds any expression tree into a `serde_json::Value` describing node
/// kinds, operators, EDM types, and canonical text. Intended for
/// diagnostics and golden tests; the output is self-describing and stable.
pub struct JsonDumpVisitor;

impl JsonDumpVisitor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonDumpVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionVisitor for JsonDumpVisitor {
    type Output = JsonValue;

    fn visit_literal(&mut self, node: &LiteralExpr) -> JsonValue {
        json!({
            "kind": ExprKind::Literal,
            "type": node.edm_type.name(),
            "value": node.value.to_string(),
            "text": node.text,
        })
    }

    fn visit_property(&mut self, node: &PropertyExpr) -> JsonValue {
        json!({
            "kind": ExprKind::Property,
            "type": node.edm_type.name(),
            "name": node.name,
        })
    }

    fn visit_member(
        &mut self,
        node: &MemberExpr,
        source: JsonValue,
        property: JsonValue,
    ) -> JsonValue {
        json!({
            "kind": ExprKind::Member,
            "type": node.edm_type.name(),
            "source": source,
            "property": property,
        })
    }

    fn visit_unary(&mut self, node: &UnaryExpr, operand: JsonValue) -> JsonValue {
        json!({
            "kind": ExprKind::Unary,
            "operator": node.op.as_str(),
            "type": node.edm_type.name(),
            "operand": operand,
        })
    }

    fn visit_binary(&mut self, node: &BinaryExpr, left: JsonValue, right: JsonValue) -> JsonValue {
        json!({
            "kind": ExprKind::Binary,
            "operator": node.op.as_str(),
            "type": node.edm_type.name(),
            "left": left,
            "right": right,
        })
    }

    fn visit_method(&mut self, node: &MethodExpr, args: Vec<JsonValue>) -> JsonValue {
        json!({
            "kind": ExprKind::Method,
            "method": node.name,
            "type": node.edm_type.name(),
            "args": args,
        })
    }

    fn visit_order(&mut self, node: &OrderExpr, operand: JsonValue) -> JsonValue {
        json!({
            "kind": "order",
            "direction": node.direction,
            "expression": operand,
        })
    }

    fn visit_order_by(&mut self, _node: &OrderByExpr, orders: Vec<JsonValue>) -> JsonValue {
        json!({
            "kind": "orderby",
            "orders": orders,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edm::{EdmProperty, EdmSimpleType, EdmType, SchemaProvider};
    use crate::expression::parser::{parse_filter, parse_order_by};

    fn schema() -> SchemaProvider {
        let mut schema = SchemaProvider::new();
        schema.define(
            "Customer",
            vec![
                EdmProperty::new("Name", EdmType::Simple(EdmSimpleType::String)),
                EdmProperty::new("Age", EdmType::Simple(EdmSimpleType::Int32)),
            ],
        );
        schema
    }

    #[test]
    fn test_binary_dump() {
        let expr = parse_filter(
            "Age ge 21",
            &EdmType::Entity("Customer".to_string()),
            &schema(),
        )
        .unwrap();

        let dump = expr.accept(&mut JsonDumpVisitor::new());
        assert_eq!(dump["kind"], "binary");
        assert_eq!(dump["operator"], "ge");
        assert_eq!(dump["type"], "Edm.Boolean");
        assert_eq!(dump["left"]["kind"], "property");
        assert_eq!(dump["left"]["name"], "Age");
        assert_eq!(dump["right"]["kind"], "literal");
        assert_eq!(dump["right"]["text"], "21");
    }

    #[test]
    fn test_method_dump() {
        let expr = parse_filter(
            "startswith(Name, 'Al')",
            &EdmType::Entity("Customer".to_string()),
            &schema(),
        )
        .unwrap();

        let dump = expr.accept(&mut JsonDumpVisitor::new());
        assert_eq!(dump["kind"], "method");
        assert_eq!(dump["method"], "startswith");
        assert_eq!(dump["args"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_order_by_dump() {
        let order = parse_order_by(
            "Name desc, Age",
            &EdmType::Entity("Customer".to_string()),
            &schema(),
        )
        .unwrap();

        let dump = order.accept(&mut JsonDumpVisitor::new());
        assert_eq!(dump["kind"], "orderby");
        let orders = dump["orders"].as_array().unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0]["direction"], "desc");
        assert_eq!(orders[1]["direction"], "asc");
    }
}
