//! odataql - the query-expression layer of an OData-style protocol.
//!
//! Turns the raw text of `$filter` and `$orderby` URL query options into
//! validated, strongly-typed expression trees, checked during parsing
//! against a caller-supplied EDM metadata model. Consumers fold the trees
//! through a double-dispatch visitor protocol; the crate ships an
//! in-memory predicate evaluator and a diagnostic JSON dump as reference
//! consumers.
//!
//! ```
//! use odataql::edm::{EdmProperty, EdmSimpleType, EdmType, SchemaProvider};
//! use odataql::expression::parse_filter;
//!
//! let mut schema = SchemaProvider::new();
//! schema.define(
//!     "Customer",
//!     vec![EdmProperty::new("Age", EdmType::Simple(EdmSimpleType::Int32))],
//! );
//!
//! let expr = parse_filter("Age ge 21", &EdmType::Entity("Customer".into()), &schema).unwrap();
//! assert_eq!(expr.uri_literal(), "(Age ge 21)");
//! assert_eq!(expr.edm_type(), &EdmType::Simple(EdmSimpleType::Boolean));
//! ```

pub mod edm;
pub mod expression;
pub mod syntax;
