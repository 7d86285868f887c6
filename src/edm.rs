//! Engine-side view of the EDM metadata model.
//!
//! This module provides:
//! - The simple/structural type references expression nodes carry
//! - Typed literal values
//! - The provider trait the parser resolves property paths through

pub mod provider;
pub mod types;
pub mod value;

pub use provider::{EdmProperty, EdmProvider, SchemaProvider};
pub use types::{EdmSimpleType, EdmType};
pub use value::EdmValue;
