//! Example demonstrating $orderby parsing

use odataql::edm::{EdmProperty, EdmSimpleType, EdmType, SchemaProvider};
use odataql::expression::parse_order_by;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("$orderby Demo");
    println!("=============");

    let mut schema = SchemaProvider::new();
    schema.define(
        "Product",
        vec![
            EdmProperty::new("Name", EdmType::Simple(EdmSimpleType::String)),
            EdmProperty::new("Price", EdmType::Simple(EdmSimpleType::Decimal)),
            EdmProperty::new("Category", EdmType::Complex("Category".to_string())),
        ],
    );
    schema.define(
        "Category",
        vec![EdmProperty::new(
            "Title",
            EdmType::Simple(EdmSimpleType::String),
        )],
    );
    let product = EdmType::Entity("Product".to_string());

    for input in ["Name", "Price desc", "Category/Title asc, Price desc, Name"] {
        let order = parse_order_by(input, &product, &schema)?;
        println!("\ninput:     {}", input);
        println!("canonical: {}", order.uri_literal());
        for item in &order.orders {
            println!(
                "  {} ({}, {})",
                item.operand.uri_literal(),
                item.direction.as_str(),
                item.edm_type()
            );
        }
    }

    Ok(())
}
