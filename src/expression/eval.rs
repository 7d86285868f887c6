//! In-memory predicate evaluation.
//!
//! `PredicateEvaluator` is an [`ExpressionVisitor`] folding a parsed filter
//! tree against one entity's data, supplied as a JSON object. Property and
//! member results accumulate as paths and are resolved to typed values only
//! when an operand value is required, guided by the node's EDM type.
//!
//! Comparisons and logical operators follow three-valued logic: `null`
//! poisons comparisons, `and`/`or` absorb it where one side decides the
//! outcome, and a `null` predicate result excludes the entity.

use crate::edm::{EdmSimpleType, EdmType, EdmValue};
use crate::expression::node::{
    BinaryExpr, Expr, LiteralExpr, MemberExpr, MethodExpr, OrderByExpr, OrderExpr, PropertyExpr,
    UnaryExpr,
};
use crate::expression::tables::{BinaryOperator, UnaryOperator};
use crate::expression::visitor::ExpressionVisitor;
use chrono::{Datelike, Timelike};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use thiserror::Error;

/// Errors that can occur during predicate evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("no value for property path '{path}'")]
    MissingValue { path: String },

    #[error("value for '{path}' does not fit {expected}")]
    ValueTypeMismatch { path: String, expected: String },

    #[error("invalid operand types for '{context}': {found}")]
    InvalidOperands { context: String, found: String },

    #[error("member access requires a property path")]
    InvalidMemberAccess,

    #[error("division by zero")]
    DivisionByZero,

    #[error("unknown method: {name}")]
    UnknownMethod { name: String },

    #[error("order expressions cannot be folded to a predicate value")]
    NotAPredicate,
}

/// Result type for evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// A folded operand: either a concrete value, or a property path resolved
/// lazily against the entity when a value is required.
#[derive(Debug, Clone)]
pub enum Operand {
    Value(EdmValue),
    Path { segments: Vec<String>, edm_type: EdmType },
}

/// Evaluates filter trees against one entity's data.
pub struct PredicateEvaluator<'a> {
    entity: &'a JsonValue,
}

impl<'a> PredicateEvaluator<'a> {
    /// `entity` must be a JSON object; nested objects back complex-typed
    /// properties.
    pub fn new(entity: &'a JsonValue) -> Self {
        Self { entity }
    }

    /// Evaluate an expression to its value.
    pub fn evaluate(&mut self, expr: &Expr) -> EvalResult<EdmValue> {
        let operand = expr.accept(self)?;
        self.resolve(operand)
    }

    /// Evaluate a filter predicate. A `null` result excludes the entity.
    pub fn matches(&mut self, expr: &Expr) -> EvalResult<bool> {
        match self.evaluate(expr)? {
            EdmValue::Boolean(b) => Ok(b),
            EdmValue::Null => Ok(false),
            other => Err(EvalError::InvalidOperands {
                context: "filter predicate".to_string(),
                found: other.simple_type().name().to_string(),
            }),
        }
    }

    fn resolve(&self, operand: Operand) -> EvalResult<EdmValue> {
        match operand {
            Operand::Value(value) => Ok(value),
            Operand::Path { segments, edm_type } => {
                let path = segments.join("/");
                let mut current = self.entity;
                for segment in &segments {
                    current = current
                        .get(segment)
                        .ok_or_else(|| EvalError::MissingValue { path: path.clone() })?;
                }
                json_to_edm(current, &edm_type, &path)
            }
        }
    }
}

impl ExpressionVisitor for PredicateEvaluator<'_> {
    type Output = EvalResult<Operand>;

    fn visit_literal(&mut self, node: &LiteralExpr) -> Self::Output {
        Ok(Operand::Value(node.value.clone()))
    }

    fn visit_property(&mut self, node: &PropertyExpr) -> Self::Output {
        Ok(Operand::Path {
            segments: vec![node.name.clone()],
            edm_type: node.edm_type.clone(),
        })
    }

    fn visit_member(
        &mut self,
        node: &MemberExpr,
        source: Self::Output,
        property: Self::Output,
    ) -> Self::Output {
        let (Operand::Path { segments: mut path, .. }, Operand::Path { segments: tail, .. }) =
            (source?, property?)
        else {
            return Err(EvalError::InvalidMemberAccess);
        };
        path.extend(tail);
        Ok(Operand::Path {
            segments: path,
            edm_type: node.edm_type.clone(),
        })
    }

    fn visit_unary(&mut self, node: &UnaryExpr, operand: Self::Output) -> Self::Output {
        let value = self.resolve(operand?)?;
        eval_unary(node.op, value).map(Operand::Value)
    }

    fn visit_binary(
        &mut self,
        node: &BinaryExpr,
        left: Self::Output,
        right: Self::Output,
    ) -> Self::Output {
        let left = self.resolve(left?)?;
        let right = self.resolve(right?)?;
        eval_binary(node.op, left, right).map(Operand::Value)
    }

    fn visit_method(&mut self, node: &MethodExpr, args: Vec<Self::Output>) -> Self::Output {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.resolve(arg?)?);
        }
        eval_method(&node.name, values).map(Operand::Value)
    }

    fn visit_order(&mut self, _node: &OrderExpr, operand: Self::Output) -> Self::Output {
        operand
    }

    fn visit_order_by(&mut self, _node: &OrderByExpr, _orders: Vec<Self::Output>) -> Self::Output {
        Err(EvalError::NotAPredicate)
    }
}

/// Convert a raw JSON value to the EDM value the declared type calls for.
fn json_to_edm(value: &JsonValue, edm_type: &EdmType, path: &str) -> EvalResult<EdmValue> {
    if value.is_null() {
        return Ok(EdmValue::Null);
    }
    let mismatch = || EvalError::ValueTypeMismatch {
        path: path.to_string(),
        expected: edm_type.name().to_string(),
    };
    let simple = edm_type.simple().ok_or_else(mismatch)?;

    let converted = match simple {
        EdmSimpleType::Null => Some(EdmValue::Null),
        EdmSimpleType::Boolean => value.as_bool().map(EdmValue::Boolean),
        EdmSimpleType::Byte | EdmSimpleType::SByte | EdmSimpleType::Int16 | EdmSimpleType::Int32 => {
            value
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(EdmValue::Int32)
        }
        EdmSimpleType::Int64 => value.as_i64().map(EdmValue::Int64),
        EdmSimpleType::Single => value.as_f64().map(|v| EdmValue::Single(v as f32)),
        EdmSimpleType::Double => value.as_f64().map(EdmValue::Double),
        EdmSimpleType::Decimal => match value {
            JsonValue::String(s) => s.parse::<Decimal>().ok().map(EdmValue::Decimal),
            _ => value.as_f64().and_then(Decimal::from_f64).map(EdmValue::Decimal),
        },
        EdmSimpleType::String => value.as_str().map(|s| EdmValue::String(s.to_string())),
        EdmSimpleType::DateTime => value.as_str().and_then(|s| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(EdmValue::DateTime)
        }),
        EdmSimpleType::DateTimeOffset => value.as_str().and_then(|s| {
            chrono::DateTime::parse_from_rfc3339(s)
                .ok()
                .map(EdmValue::DateTimeOffset)
        }),
        EdmSimpleType::Time => value.as_str().and_then(|s| {
            chrono::NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
                .ok()
                .map(EdmValue::Time)
        }),
        EdmSimpleType::Guid => value
            .as_str()
            .and_then(|s| uuid::Uuid::parse_str(s).ok())
            .map(EdmValue::Guid),
        EdmSimpleType::Binary => value.as_str().and_then(decode_hex).map(EdmValue::Binary),
    };

    converted.ok_or_else(mismatch)
}

fn decode_hex(payload: &str) -> Option<Vec<u8>> {
    if payload.len() % 2 != 0 {
        return None;
    }
    let digits: Vec<u32> = payload
        .chars()
        .map(|c| c.to_digit(16))
        .collect::<Option<Vec<_>>>()?;
    Some(digits.chunks(2).map(|p| (p[0] * 16 + p[1]) as u8).collect())
}

fn eval_unary(op: UnaryOperator, operand: EdmValue) -> EvalResult<EdmValue> {
    match op {
        UnaryOperator::Not => match operand {
            EdmValue::Null => Ok(EdmValue::Null),
            EdmValue::Boolean(b) => Ok(EdmValue::Boolean(!b)),
            other => Err(invalid_operands("not", &[&other])),
        },
        UnaryOperator::Minus => match operand {
            EdmValue::Null => Ok(EdmValue::Null),
            EdmValue::Int32(v) => Ok(EdmValue::Int32(v.wrapping_neg())),
            EdmValue::Int64(v) => Ok(EdmValue::Int64(v.wrapping_neg())),
            EdmValue::Single(v) => Ok(EdmValue::Single(-v)),
            EdmValue::Double(v) => Ok(EdmValue::Double(-v)),
            EdmValue::Decimal(v) => Ok(EdmValue::Decimal(-v)),
            other => Err(invalid_operands("-", &[&other])),
        },
    }
}

fn eval_binary(op: BinaryOperator, left: EdmValue, right: EdmValue) -> EvalResult<EdmValue> {
    match op {
        BinaryOperator::And => eval_and(left, right),
        BinaryOperator::Or => eval_or(left, right),
        BinaryOperator::Eq => eval_comparison(op, left, right, |o| o == Ordering::Equal),
        BinaryOperator::Ne => eval_comparison(op, left, right, |o| o != Ordering::Equal),
        BinaryOperator::Lt => eval_comparison(op, left, right, |o| o == Ordering::Less),
        BinaryOperator::Le => eval_comparison(op, left, right, |o| o != Ordering::Greater),
        BinaryOperator::Gt => eval_comparison(op, left, right, |o| o == Ordering::Greater),
        BinaryOperator::Ge => eval_comparison(op, left, right, |o| o != Ordering::Less),
        BinaryOperator::Add
        | BinaryOperator::Sub
        | BinaryOperator::Mul
        | BinaryOperator::Div
        | BinaryOperator::Mod => eval_arithmetic(op, left, right),
    }
}

/// `false and null` is `false`; `null and true` is `null`.
fn eval_and(left: EdmValue, right: EdmValue) -> EvalResult<EdmValue> {
    match (&left, &right) {
        (EdmValue::Boolean(false), _) | (_, EdmValue::Boolean(false)) => {
            Ok(EdmValue::Boolean(false))
        }
        (EdmValue::Null, _) | (_, EdmValue::Null) => Ok(EdmValue::Null),
        (EdmValue::Boolean(a), EdmValue::Boolean(b)) => Ok(EdmValue::Boolean(*a && *b)),
        _ => Err(invalid_operands("and", &[&left, &right])),
    }
}

/// `true or null` is `true`; `null or false` is `null`.
fn eval_or(left: EdmValue, right: EdmValue) -> EvalResult<EdmValue> {
    match (&left, &right) {
        (EdmValue::Boolean(true), _) | (_, EdmValue::Boolean(true)) => Ok(EdmValue::Boolean(true)),
        (EdmValue::Null, _) | (_, EdmValue::Null) => Ok(EdmValue::Null),
        (EdmValue::Boolean(a), EdmValue::Boolean(b)) => Ok(EdmValue::Boolean(*a || *b)),
        _ => Err(invalid_operands("or", &[&left, &right])),
    }
}

fn eval_comparison<F>(
    op: BinaryOperator,
    left: EdmValue,
    right: EdmValue,
    decide: F,
) -> EvalResult<EdmValue>
where
    F: FnOnce(Ordering) -> bool,
{
    if left.is_null() || right.is_null() {
        return Ok(EdmValue::Null);
    }
    match left.compare(&right) {
        Some(ordering) => Ok(EdmValue::Boolean(decide(ordering))),
        None => Err(invalid_operands(op.as_str(), &[&left, &right])),
    }
}

fn eval_arithmetic(op: BinaryOperator, left: EdmValue, right: EdmValue) -> EvalResult<EdmValue> {
    if left.is_null() || right.is_null() {
        return Ok(EdmValue::Null);
    }

    // decimal arithmetic stays exact unless a float is involved
    let has_decimal =
        matches!(left, EdmValue::Decimal(_)) || matches!(right, EdmValue::Decimal(_));
    if has_decimal && !involves_float(&left, &right) {
        let a = to_decimal(&left).ok_or_else(|| invalid_operands(op.as_str(), &[&left, &right]))?;
        let b = to_decimal(&right).ok_or_else(|| invalid_operands(op.as_str(), &[&left, &right]))?;
        return decimal_arithmetic(op, a, b);
    }

    match (left.as_i64(), right.as_i64()) {
        (Some(a), Some(b)) => {
            let narrow = matches!(left, EdmValue::Int32(_)) && matches!(right, EdmValue::Int32(_));
            integral_arithmetic(op, a, b, narrow)
        }
        _ => {
            let a = left
                .as_f64()
                .ok_or_else(|| invalid_operands(op.as_str(), &[&left, &right]))?;
            let b = right
                .as_f64()
                .ok_or_else(|| invalid_operands(op.as_str(), &[&left, &right]))?;
            float_arithmetic(op, a, b)
        }
    }
}

fn involves_float(left: &EdmValue, right: &EdmValue) -> bool {
    matches!(left, EdmValue::Single(_) | EdmValue::Double(_))
        || matches!(right, EdmValue::Single(_) | EdmValue::Double(_))
}

fn to_decimal(value: &EdmValue) -> Option<Decimal> {
    match value {
        EdmValue::Decimal(d) => Some(*d),
        EdmValue::Int32(v) => Some(Decimal::from(*v)),
        EdmValue::Int64(v) => Some(Decimal::from(*v)),
        _ => None,
    }
}

fn integral_arithmetic(op: BinaryOperator, a: i64, b: i64, narrow: bool) -> EvalResult<EdmValue> {
    let result = match op {
        BinaryOperator::Add => a.wrapping_add(b),
        BinaryOperator::Sub => a.wrapping_sub(b),
        BinaryOperator::Mul => a.wrapping_mul(b),
        BinaryOperator::Div => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
        BinaryOperator::Mod => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            a % b
        }
        _ => unreachable!("arithmetic operator expected"),
    };
    if narrow {
        if let Ok(v) = i32::try_from(result) {
            return Ok(EdmValue::Int32(v));
        }
    }
    Ok(EdmValue::Int64(result))
}

fn float_arithmetic(op: BinaryOperator, a: f64, b: f64) -> EvalResult<EdmValue> {
    let result = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Sub => a - b,
        BinaryOperator::Mul => a * b,
        BinaryOperator::Div => a / b,
        BinaryOperator::Mod => a % b,
        _ => unreachable!("arithmetic operator expected"),
    };
    Ok(EdmValue::Double(result))
}

fn decimal_arithmetic(op: BinaryOperator, a: Decimal, b: Decimal) -> EvalResult<EdmValue> {
    let result = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Sub => a - b,
        BinaryOperator::Mul => a * b,
        BinaryOperator::Div => {
            if b.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
        BinaryOperator::Mod => {
            if b.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            a % b
        }
        _ => unreachable!("arithmetic operator expected"),
    };
    Ok(EdmValue::Decimal(result))
}

fn eval_method(name: &str, args: Vec<EdmValue>) -> EvalResult<EdmValue> {
    if args.iter().any(EdmValue::is_null) {
        return Ok(EdmValue::Null);
    }

    match name {
        "substringof" => {
            let (needle, haystack) = (text(name, &args, 0)?, text(name, &args, 1)?);
            Ok(EdmValue::Boolean(haystack.contains(needle)))
        }
        "endswith" => {
            let (haystack, suffix) = (text(name, &args, 0)?, text(name, &args, 1)?);
            Ok(EdmValue::Boolean(haystack.ends_with(suffix)))
        }
        "startswith" => {
            let (haystack, prefix) = (text(name, &args, 0)?, text(name, &args, 1)?);
            Ok(EdmValue::Boolean(haystack.starts_with(prefix)))
        }
        "indexof" => {
            let (haystack, needle) = (text(name, &args, 0)?, text(name, &args, 1)?);
            let index = haystack
                .find(needle)
                .map(|byte| haystack[..byte].chars().count() as i32)
                .unwrap_or(-1);
            Ok(EdmValue::Int32(index))
        }
        "replace" => {
            let (s, from, to) = (
                text(name, &args, 0)?,
                text(name, &args, 1)?,
                text(name, &args, 2)?,
            );
            Ok(EdmValue::String(s.replace(from, to)))
        }
        "tolower" => Ok(EdmValue::String(text(name, &args, 0)?.to_lowercase())),
        "toupper" => Ok(EdmValue::String(text(name, &args, 0)?.to_uppercase())),
        "trim" => Ok(EdmValue::String(text(name, &args, 0)?.trim().to_string())),
        "substring" => {
            let s = text(name, &args, 0)?;
            let start = integer(name, &args, 1)?.max(0) as usize;
            let rest = s.chars().skip(start);
            let result: String = match args.get(2) {
                Some(_) => {
                    let len = integer(name, &args, 2)?.max(0) as usize;
                    rest.take(len).collect()
                }
                None => rest.collect(),
            };
            Ok(EdmValue::String(result))
        }
        "concat" => {
            let (a, b) = (text(name, &args, 0)?, text(name, &args, 1)?);
            Ok(EdmValue::String(format!("{}{}", a, b)))
        }
        "length" => Ok(EdmValue::Int32(text(name, &args, 0)?.chars().count() as i32)),
        "year" | "month" | "day" | "hour" | "minute" | "second" => date_part(name, &args),
        "round" | "floor" | "ceiling" => math_method(name, &args),
        _ => Err(EvalError::UnknownMethod {
            name: name.to_string(),
        }),
    }
}

fn date_part(name: &str, args: &[EdmValue]) -> EvalResult<EdmValue> {
    let part = match (&args[0], name) {
        (EdmValue::DateTime(dt), "year") => dt.year(),
        (EdmValue::DateTime(dt), "month") => dt.month() as i32,
        (EdmValue::DateTime(dt), "day") => dt.day() as i32,
        (EdmValue::DateTime(dt), "hour") => dt.hour() as i32,
        (EdmValue::DateTime(dt), "minute") => dt.minute() as i32,
        (EdmValue::DateTime(dt), "second") => dt.second() as i32,
        (EdmValue::DateTimeOffset(dt), "year") => dt.year(),
        (EdmValue::DateTimeOffset(dt), "month") => dt.month() as i32,
        (EdmValue::DateTimeOffset(dt), "day") => dt.day() as i32,
        (EdmValue::DateTimeOffset(dt), "hour") => dt.hour() as i32,
        (EdmValue::DateTimeOffset(dt), "minute") => dt.minute() as i32,
        (EdmValue::DateTimeOffset(dt), "second") => dt.second() as i32,
        (EdmValue::Time(t), "hour") => t.hour() as i32,
        (EdmValue::Time(t), "minute") => t.minute() as i32,
        (EdmValue::Time(t), "second") => t.second() as i32,
        (other, _) => return Err(invalid_operands(name, &[other])),
    };
    Ok(EdmValue::Int32(part))
}

fn math_method(name: &str, args: &[EdmValue]) -> EvalResult<EdmValue> {
    match &args[0] {
        EdmValue::Double(v) => Ok(EdmValue::Double(apply_float(name, *v))),
        EdmValue::Single(v) => Ok(EdmValue::Single(apply_float(name, *v as f64) as f32)),
        EdmValue::Decimal(v) => Ok(EdmValue::Decimal(match name {
            "round" => v.round(),
            "floor" => v.floor(),
            _ => v.ceil(),
        })),
        other => Err(invalid_operands(name, &[other])),
    }
}

fn apply_float(name: &str, v: f64) -> f64 {
    match name {
        "round" => v.round(),
        "floor" => v.floor(),
        _ => v.ceil(),
    }
}

fn text<'v>(method: &str, args: &'v [EdmValue], index: usize) -> EvalResult<&'v str> {
    match args.get(index) {
        Some(EdmValue::String(s)) => Ok(s.as_str()),
        Some(other) => Err(invalid_operands(method, &[other])),
        None => Err(EvalError::UnknownMethod {
            name: method.to_string(),
        }),
    }
}

fn integer(method: &str, args: &[EdmValue], index: usize) -> EvalResult<i64> {
    match args.get(index).and_then(|v| v.as_i64()) {
        Some(v) => Ok(v),
        None => Err(invalid_operands(
            method,
            &args.get(index).map(|v| vec![v]).unwrap_or_default(),
        )),
    }
}

fn invalid_operands(context: &str, values: &[&EdmValue]) -> EvalError {
    let found: Vec<&str> = values.iter().map(|v| v.simple_type().name()).collect();
    EvalError::InvalidOperands {
        context: context.to_string(),
        found: found.join(" and "),
    }
}
