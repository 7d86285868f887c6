//! EDM type system facade.
//!
//! The engine never builds or stores a metadata model of its own. It only
//! needs enough of the EDM type system to tag expression nodes, check
//! operator and method operands by type kind, and compute arithmetic
//! promotion. Structural types are carried as named references; their
//! members live behind the [`EdmProvider`](crate::edm::EdmProvider) seam.

use serde::Serialize;
use std::fmt;

/// The EDM simple (primitive) types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EdmSimpleType {
    /// The type of the `null` literal.
    Null,
    Binary,
    Boolean,
    Byte,
    SByte,
    DateTime,
    DateTimeOffset,
    Time,
    Decimal,
    Single,
    Double,
    Guid,
    Int16,
    Int32,
    Int64,
    String,
}

impl EdmSimpleType {
    /// Qualified type name as it appears in metadata and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            EdmSimpleType::Null => "Null",
            EdmSimpleType::Binary => "Edm.Binary",
            EdmSimpleType::Boolean => "Edm.Boolean",
            EdmSimpleType::Byte => "Edm.Byte",
            EdmSimpleType::SByte => "Edm.SByte",
            EdmSimpleType::DateTime => "Edm.DateTime",
            EdmSimpleType::DateTimeOffset => "Edm.DateTimeOffset",
            EdmSimpleType::Time => "Edm.Time",
            EdmSimpleType::Decimal => "Edm.Decimal",
            EdmSimpleType::Single => "Edm.Single",
            EdmSimpleType::Double => "Edm.Double",
            EdmSimpleType::Guid => "Edm.Guid",
            EdmSimpleType::Int16 => "Edm.Int16",
            EdmSimpleType::Int32 => "Edm.Int32",
            EdmSimpleType::Int64 => "Edm.Int64",
            EdmSimpleType::String => "Edm.String",
        }
    }

    /// Whole-number types.
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            EdmSimpleType::Byte
                | EdmSimpleType::SByte
                | EdmSimpleType::Int16
                | EdmSimpleType::Int32
                | EdmSimpleType::Int64
        )
    }

    /// Fractional numeric types.
    pub fn is_fractional(&self) -> bool {
        matches!(
            self,
            EdmSimpleType::Single | EdmSimpleType::Double | EdmSimpleType::Decimal
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integral() || self.is_fractional()
    }

    pub fn is_text(&self) -> bool {
        matches!(self, EdmSimpleType::String)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            EdmSimpleType::DateTime | EdmSimpleType::DateTimeOffset | EdmSimpleType::Time
        )
    }

    /// Rank on the numeric promotion ladder; wider types win.
    fn numeric_rank(&self) -> Option<u8> {
        match self {
            EdmSimpleType::Byte | EdmSimpleType::SByte => Some(1),
            EdmSimpleType::Int16 => Some(2),
            EdmSimpleType::Int32 => Some(3),
            EdmSimpleType::Int64 => Some(4),
            EdmSimpleType::Single => Some(5),
            EdmSimpleType::Double => Some(6),
            EdmSimpleType::Decimal => Some(7),
            _ => None,
        }
    }

    /// Common type of two arithmetic operands, or `None` when either side
    /// is not numeric. `Byte` against `SByte` widens to `Int16` because
    /// neither holds the other's range.
    pub fn promote(a: EdmSimpleType, b: EdmSimpleType) -> Option<EdmSimpleType> {
        let ra = a.numeric_rank()?;
        let rb = b.numeric_rank()?;
        if ra == rb && a != b {
            return Some(EdmSimpleType::Int16);
        }
        Some(if ra >= rb { a } else { b })
    }
}

impl fmt::Display for EdmSimpleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A reference to an EDM type: a simple type, or a named structural type
/// whose properties are resolved through the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum EdmType {
    Simple(EdmSimpleType),
    /// A complex type, referenced by name (e.g. `"Address"`).
    Complex(String),
    /// An entity type, referenced by name (e.g. `"Customer"`).
    Entity(String),
}

impl EdmType {
    pub fn simple(&self) -> Option<EdmSimpleType> {
        match self {
            EdmType::Simple(t) => Some(*t),
            _ => None,
        }
    }

    /// Complex and entity types have declared properties; simple types do not.
    pub fn is_structural(&self) -> bool {
        matches!(self, EdmType::Complex(_) | EdmType::Entity(_))
    }

    pub fn name(&self) -> &str {
        match self {
            EdmType::Simple(t) => t.name(),
            EdmType::Complex(name) | EdmType::Entity(name) => name,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.simple().map(|t| t.is_numeric()).unwrap_or(false)
    }

    pub fn is_text(&self) -> bool {
        self.simple().map(|t| t.is_text()).unwrap_or(false)
    }

    pub fn is_temporal(&self) -> bool {
        self.simple().map(|t| t.is_temporal()).unwrap_or(false)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, EdmType::Simple(EdmSimpleType::Null))
    }
}

impl fmt::Display for EdmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<EdmSimpleType> for EdmType {
    fn from(t: EdmSimpleType) -> Self {
        EdmType::Simple(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_predicates() {
        assert!(EdmSimpleType::Int32.is_integral());
        assert!(EdmSimpleType::Int64.is_numeric());
        assert!(EdmSimpleType::Double.is_fractional());
        assert!(!EdmSimpleType::Double.is_integral());
        assert!(EdmSimpleType::String.is_text());
        assert!(EdmSimpleType::DateTime.is_temporal());
        assert!(!EdmSimpleType::Boolean.is_numeric());
        assert!(!EdmSimpleType::Guid.is_numeric());
    }

    #[test]
    fn test_promotion_ladder() {
        use EdmSimpleType::*;

        assert_eq!(EdmSimpleType::promote(Int32, Int32), Some(Int32));
        assert_eq!(EdmSimpleType::promote(Int32, Int64), Some(Int64));
        assert_eq!(EdmSimpleType::promote(Int64, Double), Some(Double));
        assert_eq!(EdmSimpleType::promote(Double, Decimal), Some(Decimal));
        assert_eq!(EdmSimpleType::promote(Int16, Single), Some(Single));
        assert_eq!(EdmSimpleType::promote(Byte, SByte), Some(Int16));
        assert_eq!(EdmSimpleType::promote(Int32, String), None);
        assert_eq!(EdmSimpleType::promote(Boolean, Int32), None);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(EdmSimpleType::Int32.name(), "Edm.Int32");
        assert_eq!(EdmType::Simple(EdmSimpleType::Guid).name(), "Edm.Guid");
        assert_eq!(EdmType::Complex("Address".to_string()).name(), "Address");
        assert_eq!(EdmType::Entity("Customer".to_string()).name(), "Customer");
    }

    #[test]
    fn test_structural() {
        assert!(EdmType::Complex("Address".to_string()).is_structural());
        assert!(EdmType::Entity("Customer".to_string()).is_structural());
        assert!(!EdmType::Simple(EdmSimpleType::Int32).is_structural());
        assert_eq!(
            EdmType::Simple(EdmSimpleType::Int32).simple(),
            Some(EdmSimpleType::Int32)
        );
        assert_eq!(EdmType::Complex("Address".to_string()).simple(), None);
    }
}
