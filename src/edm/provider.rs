//! The type-resolution seam between the parser and the metadata model.

use crate::edm::types::EdmType;
use std::collections::HashMap;

/// A property declared on a structural type.
#[derive(Debug, Clone, PartialEq)]
pub struct EdmProperty {
    pub name: String,
    pub edm_type: EdmType,
}

impl EdmProperty {
    pub fn new(name: impl Into<String>, edm_type: EdmType) -> Self {
        Self {
            name: name.into(),
            edm_type,
        }
    }
}

/// Resolves property path segments against the metadata model.
///
/// The parser calls this once per path segment, with the type the path has
/// reached so far. Implementations are read-only; the parser never caches
/// answers across parses.
pub trait EdmProvider {
    /// Look up `name` among the properties declared on `declaring`.
    /// Returns `None` when `declaring` is a simple type or the property
    /// is not declared.
    fn property(&self, declaring: &EdmType, name: &str) -> Option<EdmProperty>;
}

/// In-memory provider mapping structural type names to property lists.
/// Used by tests and demos; production callers adapt their own model.
#[derive(Debug, Default)]
pub struct SchemaProvider {
    types: HashMap<String, Vec<EdmProperty>>,
}

impl SchemaProvider {
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Declare a structural type with its properties. Redefining a name
    /// replaces the earlier declaration.
    pub fn define(&mut self, type_name: impl Into<String>, properties: Vec<EdmProperty>) {
        self.types.insert(type_name.into(), properties);
    }
}

impl EdmProvider for SchemaProvider {
    fn property(&self, declaring: &EdmType, name: &str) -> Option<EdmProperty> {
        match declaring {
            EdmType::Complex(type_name) | EdmType::Entity(type_name) => self
                .types
                .get(type_name)?
                .iter()
                .find(|p| p.name == name)
                .cloned(),
            EdmType::Simple(_) => None,
        }
    }
}
