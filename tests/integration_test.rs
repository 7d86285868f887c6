//! End-to-end tests for the expression engine: tokenize, parse against a
//! schema, reconstruct, and fold with unrelated consumers.

use odataql::edm::{EdmProperty, EdmSimpleType, EdmType, EdmValue, SchemaProvider};
use odataql::expression::{
    parse_filter, parse_order_by, BinaryOperator, Expr, ExpressionError, ExpressionParser,
    ExpressionParserError, JsonDumpVisitor, MethodTable, OperatorTable, PredicateEvaluator,
    SortDirection,
};
use serde_json::json;

fn schema() -> SchemaProvider {
    let mut schema = SchemaProvider::new();
    schema.define(
        "Employee",
        vec![
            EdmProperty::new("Name", EdmType::Simple(EdmSimpleType::String)),
            EdmProperty::new("Age", EdmType::Simple(EdmSimpleType::Int32)),
            EdmProperty::new("Salary", EdmType::Simple(EdmSimpleType::Double)),
            EdmProperty::new("Manager", EdmType::Simple(EdmSimpleType::Boolean)),
            EdmProperty::new("Remote", EdmType::Simple(EdmSimpleType::Boolean)),
            EdmProperty::new("Tenured", EdmType::Simple(EdmSimpleType::Boolean)),
            EdmProperty::new("EntryDate", EdmType::Simple(EdmSimpleType::DateTime)),
            EdmProperty::new("Address", EdmType::Complex("Address".to_string())),
        ],
    );
    schema.define(
        "Address",
        vec![
            EdmProperty::new("City", EdmType::Simple(EdmSimpleType::String)),
            EdmProperty::new("Zip", EdmType::Simple(EdmSimpleType::String)),
        ],
    );
    schema
}

fn employee_type() -> EdmType {
    EdmType::Entity("Employee".to_string())
}

fn filter(input: &str) -> Result<Expr, ExpressionError> {
    parse_filter(input, &employee_type(), &schema())
}

#[test]
fn integer_literal_parses_to_typed_literal_node() {
    let expr = filter("42").unwrap();
    assert!(matches!(expr, Expr::Literal(_)));
    assert_eq!(expr.edm_type(), &EdmType::Simple(EdmSimpleType::Int32));
    assert_eq!(expr.uri_literal(), "42");
}

#[test]
fn and_binds_tighter_than_or() {
    let expr = filter("Manager or Remote and Tenured").unwrap();
    let Expr::Binary(root) = expr else {
        panic!("expected binary root");
    };
    assert_eq!(root.op, BinaryOperator::Or);
    let Expr::Binary(right) = *root.right else {
        panic!("expected binary right child");
    };
    assert_eq!(right.op, BinaryOperator::And);
}

#[test]
fn equal_precedence_chains_are_left_associative() {
    let expr = filter("Age sub 1 sub 2 eq 0").unwrap();
    let Expr::Binary(root) = expr else {
        panic!("expected binary root");
    };
    let Expr::Binary(chain) = *root.left else {
        panic!("expected binary left child");
    };
    assert_eq!(chain.op, BinaryOperator::Sub);
    let Expr::Binary(inner) = *chain.left else {
        panic!("expected nested sub on the left");
    };
    assert_eq!(inner.op, BinaryOperator::Sub);
}

#[test]
fn member_chain_resolves_against_the_model() {
    let expr = filter("Address/City eq 'Hamburg'").unwrap();
    let Expr::Binary(root) = expr else {
        panic!("expected binary root");
    };
    assert_eq!(root.op, BinaryOperator::Eq);
    let Expr::Member(member) = *root.left else {
        panic!("expected member expression on the left");
    };
    assert!(matches!(*member.source, Expr::Property(ref p) if p.name == "Address"));
    assert!(matches!(*member.property, Expr::Property(ref p) if p.name == "City"));
    assert_eq!(member.edm_type, EdmType::Simple(EdmSimpleType::String));
}

#[test]
fn undeclared_member_segment_is_unknown_property() {
    let err = filter("Address/Street eq 'X'").unwrap_err();
    let ExpressionError::Parser(ExpressionParserError::UnknownProperty { name, declaring, .. }) =
        err
    else {
        panic!("expected unknown property error");
    };
    assert_eq!(name, "Street");
    assert_eq!(declaring, "Address");
}

#[test]
fn method_arity_is_checked_before_types() {
    let err = filter("substring(Name) eq 'x'").unwrap_err();
    assert!(matches!(
        err,
        ExpressionError::Parser(ExpressionParserError::InvalidMethodArity { actual: 1, .. })
    ));

    // both declared arities succeed and yield the declared return type
    for input in ["substring(Name, 1)", "substring(Name, 1, 2)"] {
        let expr = parse_filter(
            &format!("{} eq 'x'", input),
            &employee_type(),
            &schema(),
        )
        .unwrap();
        let Expr::Binary(root) = expr else {
            panic!("expected binary root");
        };
        assert_eq!(
            root.left.edm_type(),
            &EdmType::Simple(EdmSimpleType::String)
        );
    }
}

#[test]
fn round_trip_preserves_node_kind_shape() {
    let inputs = [
        "Manager or Remote and Tenured",
        "Age add 2 mul 3 lt 100",
        "not (Manager and Remote)",
        "startswith(Address/City, 'Ham') and Age ge 21",
        "substring(Name, 1, 2) eq 'xy'",
    ];
    for input in inputs {
        let first = filter(input).unwrap();
        let second = filter(&first.uri_literal()).unwrap();
        assert_eq!(
            shape(&first),
            shape(&second),
            "round trip changed shape for {:?}",
            input
        );
    }
}

#[test]
fn orderby_defaults_to_ascending() {
    let order = parse_order_by("Name", &employee_type(), &schema()).unwrap();
    assert_eq!(order.orders.len(), 1);
    assert_eq!(order.orders[0].direction, SortDirection::Asc);

    let order = parse_order_by("Name desc", &employee_type(), &schema()).unwrap();
    assert_eq!(order.orders[0].direction, SortDirection::Desc);

    let order = parse_order_by("Address/City, Age desc", &employee_type(), &schema()).unwrap();
    assert_eq!(order.orders.len(), 2);
    assert_eq!(order.orders[0].direction, SortDirection::Asc);
    assert_eq!(order.orders[1].direction, SortDirection::Desc);
}

#[test]
fn two_unrelated_folds_leave_the_tree_unchanged() {
    let expr = filter("startswith(Address/City, 'Ham') and Age ge 21").unwrap();
    let before = expr.clone();
    let types_before: Vec<String> = collect_types(&expr);

    let entity = json!({
        "Name": "Ada",
        "Age": 36,
        "Address": { "City": "Hamburg", "Zip": "20095" }
    });
    let matched = PredicateEvaluator::new(&entity).matches(&expr).unwrap();
    assert!(matched);

    let dump = expr.accept(&mut JsonDumpVisitor::new());
    assert_eq!(dump["kind"], "binary");
    assert_eq!(dump["operator"], "and");

    assert_eq!(expr, before);
    assert_eq!(collect_types(&expr), types_before);
    assert_eq!(expr.uri_literal(), before.uri_literal());
}

#[test]
fn evaluator_and_dump_disagree_on_nothing_after_reparse() {
    // the canonical reconstruction feeds straight back into the parser and
    // the evaluator answers identically
    let expr = filter("Age mul 2 sub 10 gt 50 or Manager").unwrap();
    let reparsed = filter(&expr.uri_literal()).unwrap();

    let entity = json!({ "Age": 31, "Manager": false });
    let a = PredicateEvaluator::new(&entity).matches(&expr).unwrap();
    let b = PredicateEvaluator::new(&entity).matches(&reparsed).unwrap();
    assert_eq!(a, b);
    assert!(a);
}

#[test]
fn injected_tables_isolate_catalogs() {
    // a trimmed-down catalog without 'or' rejects it as an operator
    let mut operators = OperatorTable::empty();
    let full = OperatorTable::new();
    for op in [BinaryOperator::And, BinaryOperator::Eq] {
        let info = full.binary_info(op).unwrap();
        operators.register_binary(op, info.precedence, info.compat, info.result);
    }
    let methods = MethodTable::empty();
    let provider = schema();

    let parser = ExpressionParser::new(
        &operators,
        &methods,
        &provider,
        employee_type(),
        "Manager or Remote",
    )
    .unwrap();
    let err = parser.parse_filter().unwrap_err();
    assert!(matches!(
        err,
        ExpressionError::Parser(ExpressionParserError::UnsupportedOperator { ref operator, .. })
            if operator == "or"
    ));

    // the default catalog is unaffected
    assert!(filter("Manager or Remote").is_ok());
}

#[test]
fn literal_values_survive_into_the_tree() {
    let expr = filter("Name eq 'O''Brien'").unwrap();
    let Expr::Binary(root) = expr else {
        panic!("expected binary root");
    };
    let Expr::Literal(lit) = *root.right else {
        panic!("expected literal on the right");
    };
    assert_eq!(lit.value, EdmValue::String("O'Brien".to_string()));
    assert_eq!(lit.text, "'O''Brien'");
}

fn shape(expr: &Expr) -> String {
    match expr {
        Expr::Literal(_) => "lit".to_string(),
        Expr::Property(p) => format!("prop({})", p.name),
        Expr::Member(m) => format!("member({},{})", shape(&m.source), shape(&m.property)),
        Expr::Unary(u) => format!("unary[{}]({})", u.op.as_str(), shape(&u.operand)),
        Expr::Binary(b) => format!(
            "binary[{}]({},{})",
            b.op.as_str(),
            shape(&b.left),
            shape(&b.right)
        ),
        Expr::Method(m) => {
            let args: Vec<String> = m.args.iter().map(shape).collect();
            format!("method[{}]({})", m.name, args.join(","))
        }
    }
}

fn collect_types(expr: &Expr) -> Vec<String> {
    let mut types = vec![expr.edm_type().name().to_string()];
    match expr {
        Expr::Literal(_) | Expr::Property(_) => {}
        Expr::Member(m) => {
            types.extend(collect_types(&m.source));
            types.extend(collect_types(&m.property));
        }
        Expr::Unary(u) => types.extend(collect_types(&u.operand)),
        Expr::Binary(b) => {
            types.extend(collect_types(&b.left));
            types.extend(collect_types(&b.right));
        }
        Expr::Method(m) => {
            for arg in &m.args {
                types.extend(collect_types(arg));
            }
        }
    }
    types
}
