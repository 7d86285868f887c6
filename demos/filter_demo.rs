//! Example demonstrating $filter parsing, evaluation, and the JSON dump

use odataql::edm::{EdmProperty, EdmSimpleType, EdmType, SchemaProvider};
use odataql::expression::{parse_filter, JsonDumpVisitor, PredicateEvaluator};
use serde_json::json;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("$filter Expression Demo");
    println!("=======================");

    // The metadata model the parser resolves property paths against
    let mut schema = SchemaProvider::new();
    schema.define(
        "Customer",
        vec![
            EdmProperty::new("Name", EdmType::Simple(EdmSimpleType::String)),
            EdmProperty::new("Age", EdmType::Simple(EdmSimpleType::Int32)),
            EdmProperty::new("Active", EdmType::Simple(EdmSimpleType::Boolean)),
            EdmProperty::new("Address", EdmType::Complex("Address".to_string())),
        ],
    );
    schema.define(
        "Address",
        vec![EdmProperty::new(
            "City",
            EdmType::Simple(EdmSimpleType::String),
        )],
    );
    let customer = EdmType::Entity("Customer".to_string());

    // Example 1: parse and reconstruct
    println!("\n1. Parsing");
    println!("----------");
    let input = "startswith(Address/City, 'Ber') and Age ge 21 or not Active";
    let expr = parse_filter(input, &customer, &schema)?;
    println!("input:     {}", input);
    println!("canonical: {}", expr.uri_literal());
    println!("type:      {}", expr.edm_type());

    // Example 2: evaluate against entities
    println!("\n2. Evaluation");
    println!("-------------");
    let entities = vec![
        json!({ "Name": "Ada", "Age": 36, "Active": true,
                "Address": { "City": "Berlin" } }),
        json!({ "Name": "Bob", "Age": 19, "Active": true,
                "Address": { "City": "Paris" } }),
        json!({ "Name": "Eve", "Age": 17, "Active": false,
                "Address": { "City": "Oslo" } }),
    ];
    for entity in &entities {
        let matched = PredicateEvaluator::new(entity).matches(&expr)?;
        println!("{} -> {}", entity["Name"], matched);
    }

    // Example 3: diagnostic dump
    println!("\n3. JSON Dump");
    println!("------------");
    let dump = expr.accept(&mut JsonDumpVisitor::new());
    println!("{}", serde_json::to_string_pretty(&dump)?);

    // Example 4: typed failures
    println!("\n4. Errors");
    println!("---------");
    for bad in ["Address/Street eq 'X'", "substring(Name)", "Age add Name"] {
        let err = parse_filter(bad, &customer, &schema).unwrap_err();
        println!("{:<25} -> {}", bad, err);
    }

    Ok(())
}
