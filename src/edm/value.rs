//! Typed literal values.

use crate::edm::types::EdmSimpleType;
use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

/// A value of an EDM simple type, as produced by the tokenizer for typed
/// literals and by consumers that materialize property values.
#[derive(Debug, Clone, PartialEq)]
pub enum EdmValue {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Single(f32),
    Double(f64),
    Decimal(Decimal),
    String(String),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Time(NaiveTime),
    Guid(Uuid),
    Binary(Vec<u8>),
}

impl EdmValue {
    /// The simple type this value belongs to.
    pub fn simple_type(&self) -> EdmSimpleType {
        match self {
            EdmValue::Null => EdmSimpleType::Null,
            EdmValue::Boolean(_) => EdmSimpleType::Boolean,
            EdmValue::Int32(_) => EdmSimpleType::Int32,
            EdmValue::Int64(_) => EdmSimpleType::Int64,
            EdmValue::Single(_) => EdmSimpleType::Single,
            EdmValue::Double(_) => EdmSimpleType::Double,
            EdmValue::Decimal(_) => EdmSimpleType::Decimal,
            EdmValue::String(_) => EdmSimpleType::String,
            EdmValue::DateTime(_) => EdmSimpleType::DateTime,
            EdmValue::DateTimeOffset(_) => EdmSimpleType::DateTimeOffset,
            EdmValue::Time(_) => EdmSimpleType::Time,
            EdmValue::Guid(_) => EdmSimpleType::Guid,
            EdmValue::Binary(_) => EdmSimpleType::Binary,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, EdmValue::Null)
    }

    /// Integral view of the value, when it has one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            EdmValue::Int32(v) => Some(*v as i64),
            EdmValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Lossy numeric view used for cross-type comparison and arithmetic.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            EdmValue::Int32(v) => Some(*v as f64),
            EdmValue::Int64(v) => Some(*v as f64),
            EdmValue::Single(v) => Some(*v as f64),
            EdmValue::Double(v) => Some(*v),
            EdmValue::Decimal(v) => v.to_f64(),
            _ => None,
        }
    }

    /// Compare two values. Numeric values compare across types via
    /// promotion; `Null` compares with nothing; values of unrelated kinds
    /// are incomparable.
    pub fn compare(&self, other: &EdmValue) -> Option<Ordering> {
        match (self, other) {
            (EdmValue::Null, _) | (_, EdmValue::Null) => None,
            (EdmValue::Boolean(a), EdmValue::Boolean(b)) => Some(a.cmp(b)),
            (EdmValue::String(a), EdmValue::String(b)) => Some(a.cmp(b)),
            (EdmValue::DateTime(a), EdmValue::DateTime(b)) => Some(a.cmp(b)),
            (EdmValue::DateTimeOffset(a), EdmValue::DateTimeOffset(b)) => Some(a.cmp(b)),
            (EdmValue::Time(a), EdmValue::Time(b)) => Some(a.cmp(b)),
            (EdmValue::Guid(a), EdmValue::Guid(b)) => Some(a.cmp(b)),
            (EdmValue::Binary(a), EdmValue::Binary(b)) => Some(a.cmp(b)),
            (EdmValue::Decimal(a), EdmValue::Decimal(b)) => Some(a.cmp(b)),
            _ => {
                if let (Some(a), Some(b)) = (self.as_i64(), other.as_i64()) {
                    return Some(a.cmp(&b));
                }
                match (self.as_f64(), other.as_f64()) {
                    (Some(a), Some(b)) => a.partial_cmp(&b),
                    _ => None,
                }
            }
        }
    }
}

/// Canonical URI literal form, e.g. `'it''s'`, `42L`, `guid'...'`.
impl fmt::Display for EdmValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdmValue::Null => write!(f, "null"),
            EdmValue::Boolean(v) => write!(f, "{}", v),
            EdmValue::Int32(v) => write!(f, "{}", v),
            EdmValue::Int64(v) => write!(f, "{}L", v),
            EdmValue::Single(v) => write!(f, "{}f", v),
            EdmValue::Double(v) => write!(f, "{}", v),
            EdmValue::Decimal(v) => write!(f, "{}m", v),
            EdmValue::String(v) => write!(f, "'{}'", v.replace('\'', "''")),
            EdmValue::DateTime(v) => {
                write!(f, "datetime'{}'", v.format("%Y-%m-%dT%H:%M:%S%.f"))
            }
            EdmValue::DateTimeOffset(v) => write!(f, "datetimeoffset'{}'", v.to_rfc3339()),
            EdmValue::Time(v) => write!(f, "time'{}'", v.format("%H:%M:%S%.f")),
            EdmValue::Guid(v) => write!(f, "guid'{}'", v),
            EdmValue::Binary(v) => {
                write!(f, "binary'")?;
                for byte in v {
                    write!(f, "{:02X}", byte)?;
                }
                write!(f, "'")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_simple_types() {
        assert_eq!(EdmValue::Null.simple_type(), EdmSimpleType::Null);
        assert_eq!(EdmValue::Int32(42).simple_type(), EdmSimpleType::Int32);
        assert_eq!(
            EdmValue::String("x".to_string()).simple_type(),
            EdmSimpleType::String
        );
        assert_eq!(
            EdmValue::Decimal(Decimal::from_str("1.5").unwrap()).simple_type(),
            EdmSimpleType::Decimal
        );
    }

    #[test]
    fn test_cross_type_comparison() {
        assert_eq!(
            EdmValue::Int32(2).compare(&EdmValue::Int64(3)),
            Some(Ordering::Less)
        );
        assert_eq!(
            EdmValue::Int32(2).compare(&EdmValue::Double(2.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            EdmValue::Double(2.5).compare(&EdmValue::Decimal(Decimal::from_str("2.4").unwrap())),
            Some(Ordering::Greater)
        );
        assert_eq!(
            EdmValue::String("a".to_string()).compare(&EdmValue::String("b".to_string())),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_null_compares_with_nothing() {
        assert_eq!(EdmValue::Null.compare(&EdmValue::Int32(1)), None);
        assert_eq!(EdmValue::Int32(1).compare(&EdmValue::Null), None);
        assert_eq!(EdmValue::Null.compare(&EdmValue::Null), None);
    }

    #[test]
    fn test_unrelated_kinds_incomparable() {
        assert_eq!(
            EdmValue::Int32(1).compare(&EdmValue::String("1".to_string())),
            None
        );
        assert_eq!(
            EdmValue::Boolean(true).compare(&EdmValue::Int32(1)),
            None
        );
    }

    #[test]
    fn test_canonical_display() {
        assert_eq!(EdmValue::Int32(42).to_string(), "42");
        assert_eq!(EdmValue::Int64(42).to_string(), "42L");
        assert_eq!(EdmValue::Null.to_string(), "null");
        assert_eq!(EdmValue::Boolean(true).to_string(), "true");
        assert_eq!(EdmValue::String("it's".to_string()).to_string(), "'it''s'");
        assert_eq!(EdmValue::Binary(vec![0xCA, 0xFE]).to_string(), "binary'CAFE'");

        let guid = Uuid::from_str("12345678-aaaa-bbbb-cccc-ddddeeeeffff").unwrap();
        assert_eq!(
            EdmValue::Guid(guid).to_string(),
            "guid'12345678-aaaa-bbbb-cccc-ddddeeeeffff'"
        );
    }
}
