//! Operator and method grammar tables.
//!
//! The tables are plain immutable values built once and passed into the
//! parser by reference. There is no global registry: tests inject custom
//! catalogs, and parses never observe shared mutable state.

use crate::edm::{EdmSimpleType, EdmType};
use std::collections::HashMap;

/// Binary operators, by canonical URI spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Or => "or",
            BinaryOperator::And => "and",
            BinaryOperator::Eq => "eq",
            BinaryOperator::Ne => "ne",
            BinaryOperator::Lt => "lt",
            BinaryOperator::Le => "le",
            BinaryOperator::Gt => "gt",
            BinaryOperator::Ge => "ge",
            BinaryOperator::Add => "add",
            BinaryOperator::Sub => "sub",
            BinaryOperator::Mul => "mul",
            BinaryOperator::Div => "div",
            BinaryOperator::Mod => "mod",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
    Minus,
}

impl UnaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "not",
            UnaryOperator::Minus => "-",
        }
    }
}

/// Checks whether two operand types satisfy an operator's constraint.
pub type BinaryCompatFn = fn(&EdmType, &EdmType) -> bool;
/// Computes the result type of a binary application. Returning `None` for
/// operands the compat check accepted is a table defect.
pub type BinaryResultFn = fn(&EdmType, &EdmType) -> Option<EdmType>;
pub type UnaryCompatFn = fn(&EdmType) -> bool;
pub type UnaryResultFn = fn(&EdmType) -> Option<EdmType>;
/// Computes a method's return type from its argument types.
pub type MethodResultFn = fn(&[EdmType]) -> Option<EdmType>;

/// Precedence and type rules for one binary operator. All binary operators
/// are left-associative; higher precedence binds tighter.
#[derive(Debug, Clone, Copy)]
pub struct BinaryOpInfo {
    pub precedence: u8,
    pub compat: BinaryCompatFn,
    pub result: BinaryResultFn,
}

/// Type rules for one unary (prefix) operator.
#[derive(Debug, Clone, Copy)]
pub struct UnaryOpInfo {
    pub precedence: u8,
    pub compat: UnaryCompatFn,
    pub result: UnaryResultFn,
}

pub const PREC_OR: u8 = 1;
pub const PREC_AND: u8 = 2;
pub const PREC_COMPARISON: u8 = 3;
pub const PREC_ADDITIVE: u8 = 4;
pub const PREC_MULTIPLICATIVE: u8 = 5;
pub const PREC_UNARY: u8 = 6;

/// Registry of binary and unary operators: spelling to operator, and
/// operator to its precedence/type rules. A spelling registered without a
/// matching info entry is a table defect the parser reports as an internal
/// error.
#[derive(Debug, Clone)]
pub struct OperatorTable {
    binary_symbols: HashMap<String, BinaryOperator>,
    binary_infos: HashMap<BinaryOperator, BinaryOpInfo>,
    unary_symbols: HashMap<String, UnaryOperator>,
    unary_infos: HashMap<UnaryOperator, UnaryOpInfo>,
}

impl OperatorTable {
    /// The full default catalog.
    pub fn new() -> Self {
        use BinaryOperator::*;

        let mut table = Self::empty();
        table.register_binary(Or, PREC_OR, compat_logical, result_boolean);
        table.register_binary(And, PREC_AND, compat_logical, result_boolean);
        table.register_binary(Eq, PREC_COMPARISON, compat_equatable, result_boolean);
        table.register_binary(Ne, PREC_COMPARISON, compat_equatable, result_boolean);
        table.register_binary(Lt, PREC_COMPARISON, compat_ordered, result_boolean);
        table.register_binary(Le, PREC_COMPARISON, compat_ordered, result_boolean);
        table.register_binary(Gt, PREC_COMPARISON, compat_ordered, result_boolean);
        table.register_binary(Ge, PREC_COMPARISON, compat_ordered, result_boolean);
        table.register_binary(Add, PREC_ADDITIVE, compat_arithmetic, result_arithmetic);
        table.register_binary(Sub, PREC_ADDITIVE, compat_arithmetic, result_arithmetic);
        table.register_binary(Mul, PREC_MULTIPLICATIVE, compat_arithmetic, result_arithmetic);
        table.register_binary(Div, PREC_MULTIPLICATIVE, compat_arithmetic, result_arithmetic);
        table.register_binary(Mod, PREC_MULTIPLICATIVE, compat_arithmetic, result_arithmetic);
        table.register_unary(UnaryOperator::Not, PREC_UNARY, compat_boolean, result_same);
        table.register_unary(UnaryOperator::Minus, PREC_UNARY, compat_numeric, result_same);
        table
    }

    pub fn empty() -> Self {
        Self {
            binary_symbols: HashMap::new(),
            binary_infos: HashMap::new(),
            unary_symbols: HashMap::new(),
            unary_infos: HashMap::new(),
        }
    }

    /// Register a binary operator under its canonical spelling.
    pub fn register_binary(
        &mut self,
        op: BinaryOperator,
        precedence: u8,
        compat: BinaryCompatFn,
        result: BinaryResultFn,
    ) {
        self.binary_symbols.insert(op.as_str().to_string(), op);
        self.binary_infos.insert(
            op,
            BinaryOpInfo {
                precedence,
                compat,
                result,
            },
        );
    }

    pub fn register_unary(
        &mut self,
        op: UnaryOperator,
        precedence: u8,
        compat: UnaryCompatFn,
        result: UnaryResultFn,
    ) {
        self.unary_symbols.insert(op.as_str().to_string(), op);
        self.unary_infos.insert(
            op,
            UnaryOpInfo {
                precedence,
                compat,
                result,
            },
        );
    }

    /// Register a spelling without type rules. Useful only for exercising
    /// the internal-error path in tests.
    pub fn register_binary_symbol(&mut self, symbol: impl Into<String>, op: BinaryOperator) {
        self.binary_symbols.insert(symbol.into(), op);
    }

    pub fn binary_operator(&self, symbol: &str) -> Option<BinaryOperator> {
        self.binary_symbols.get(symbol).copied()
    }

    pub fn binary_info(&self, op: BinaryOperator) -> Option<&BinaryOpInfo> {
        self.binary_infos.get(&op)
    }

    pub fn unary_operator(&self, symbol: &str) -> Option<UnaryOperator> {
        self.unary_symbols.get(symbol).copied()
    }

    pub fn unary_info(&self, op: UnaryOperator) -> Option<&UnaryOpInfo> {
        self.unary_infos.get(&op)
    }
}

impl Default for OperatorTable {
    fn default() -> Self {
        Self::new()
    }
}

fn compat_logical(left: &EdmType, right: &EdmType) -> bool {
    is_boolean(left) && is_boolean(right)
}

/// `eq`/`ne`: same simple type, any two numerics, or `null` on either side.
fn compat_equatable(left: &EdmType, right: &EdmType) -> bool {
    if left.is_null() || right.is_null() {
        return true;
    }
    match (left.simple(), right.simple()) {
        (Some(a), Some(b)) => a == b || (a.is_numeric() && b.is_numeric()),
        _ => false,
    }
}

/// `lt`/`le`/`gt`/`ge`: any two numerics, or the same orderable simple type.
fn compat_ordered(left: &EdmType, right: &EdmType) -> bool {
    match (left.simple(), right.simple()) {
        (Some(a), Some(b)) => {
            (a.is_numeric() && b.is_numeric())
                || (a == b && (a.is_text() || a.is_temporal()))
        }
        _ => false,
    }
}

fn compat_arithmetic(left: &EdmType, right: &EdmType) -> bool {
    left.is_numeric() && right.is_numeric()
}

fn compat_boolean(operand: &EdmType) -> bool {
    is_boolean(operand)
}

fn compat_numeric(operand: &EdmType) -> bool {
    operand.is_numeric()
}

fn result_boolean(_left: &EdmType, _right: &EdmType) -> Option<EdmType> {
    Some(EdmType::Simple(EdmSimpleType::Boolean))
}

fn result_arithmetic(left: &EdmType, right: &EdmType) -> Option<EdmType> {
    let promoted = EdmSimpleType::promote(left.simple()?, right.simple()?)?;
    Some(EdmType::Simple(promoted))
}

fn result_same(operand: &EdmType) -> Option<EdmType> {
    Some(operand.clone())
}

fn is_boolean(t: &EdmType) -> bool {
    matches!(t, EdmType::Simple(EdmSimpleType::Boolean))
}

/// Per-parameter type-kind constraint of a method signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Any,
    Text,
    Numeric,
    Integral,
    Fractional,
    Temporal,
}

impl ParamKind {
    pub fn accepts(&self, t: &EdmType) -> bool {
        let Some(simple) = t.simple() else {
            return matches!(self, ParamKind::Any);
        };
        match self {
            ParamKind::Any => true,
            ParamKind::Text => simple.is_text(),
            ParamKind::Numeric => simple.is_numeric(),
            ParamKind::Integral => simple.is_integral(),
            ParamKind::Fractional => simple.is_fractional(),
            ParamKind::Temporal => simple.is_temporal(),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ParamKind::Any => "any",
            ParamKind::Text => "string",
            ParamKind::Numeric => "numeric",
            ParamKind::Integral => "integral",
            ParamKind::Fractional => "fractional",
            ParamKind::Temporal => "temporal",
        }
    }
}

/// One fixed-arity signature of a method.
#[derive(Debug, Clone)]
pub struct MethodSignature {
    pub params: Vec<ParamKind>,
    pub result: MethodResultFn,
}

/// A method: canonical name plus one or more signatures distinguished by
/// arity.
#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub name: String,
    pub signatures: Vec<MethodSignature>,
}

impl MethodInfo {
    pub fn new(name: impl Into<String>, signatures: Vec<MethodSignature>) -> Self {
        Self {
            name: name.into(),
            signatures,
        }
    }

    pub fn signature_for_arity(&self, arity: usize) -> Option<&MethodSignature> {
        self.signatures.iter().find(|s| s.params.len() == arity)
    }

    pub fn max_arity(&self) -> usize {
        self.signatures
            .iter()
            .map(|s| s.params.len())
            .max()
            .unwrap_or(0)
    }

    /// Human-readable arity list for error messages, e.g. `"2 or 3"`.
    pub fn describe_arities(&self) -> String {
        let mut arities: Vec<usize> = self.signatures.iter().map(|s| s.params.len()).collect();
        arities.sort_unstable();
        arities.dedup();
        let rendered: Vec<String> = arities.iter().map(|a| a.to_string()).collect();
        rendered.join(" or ")
    }
}

/// Registry of the methods callable inside query expressions.
#[derive(Debug, Clone)]
pub struct MethodTable {
    methods: HashMap<String, MethodInfo>,
}

impl MethodTable {
    /// The default catalog: the string, date, and math functions of the
    /// protocol's URI grammar.
    pub fn new() -> Self {
        use ParamKind::*;

        let mut table = Self::empty();
        table.register_simple("substringof", vec![Text, Text], method_result_boolean);
        table.register_simple("endswith", vec![Text, Text], method_result_boolean);
        table.register_simple("startswith", vec![Text, Text], method_result_boolean);
        table.register_simple("indexof", vec![Text, Text], method_result_int32);
        table.register_simple("replace", vec![Text, Text, Text], method_result_string);
        table.register_simple("tolower", vec![Text], method_result_string);
        table.register_simple("toupper", vec![Text], method_result_string);
        table.register_simple("trim", vec![Text], method_result_string);
        table.register(MethodInfo::new(
            "substring",
            vec![
                MethodSignature {
                    params: vec![Text, Integral],
                    result: method_result_string,
                },
                MethodSignature {
                    params: vec![Text, Integral, Integral],
                    result: method_result_string,
                },
            ],
        ));
        table.register_simple("concat", vec![Text, Text], method_result_string);
        table.register_simple("length", vec![Text], method_result_int32);
        for name in ["year", "month", "day", "hour", "minute", "second"] {
            table.register_simple(name, vec![Temporal], method_result_int32);
        }
        for name in ["round", "floor", "ceiling"] {
            table.register_simple(name, vec![Fractional], method_result_first_arg);
        }
        table
    }

    pub fn empty() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }

    pub fn register(&mut self, info: MethodInfo) {
        self.methods.insert(info.name.clone(), info);
    }

    fn register_simple(&mut self, name: &str, params: Vec<ParamKind>, result: MethodResultFn) {
        self.register(MethodInfo::new(
            name,
            vec![MethodSignature { params, result }],
        ));
    }

    pub fn lookup(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.get(name)
    }
}

impl Default for MethodTable {
    fn default() -> Self {
        Self::new()
    }
}

fn method_result_boolean(_args: &[EdmType]) -> Option<EdmType> {
    Some(EdmType::Simple(EdmSimpleType::Boolean))
}

fn method_result_int32(_args: &[EdmType]) -> Option<EdmType> {
    Some(EdmType::Simple(EdmSimpleType::Int32))
}

fn method_result_string(_args: &[EdmType]) -> Option<EdmType> {
    Some(EdmType::Simple(EdmSimpleType::String))
}

fn method_result_first_arg(args: &[EdmType]) -> Option<EdmType> {
    args.first().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const INT32: EdmType = EdmType::Simple(EdmSimpleType::Int32);
    const DOUBLE: EdmType = EdmType::Simple(EdmSimpleType::Double);
    const BOOLEAN: EdmType = EdmType::Simple(EdmSimpleType::Boolean);
    const STRING: EdmType = EdmType::Simple(EdmSimpleType::String);

    #[test]
    fn test_precedence_ordering() {
        let table = OperatorTable::new();
        let prec = |op| table.binary_info(op).unwrap().precedence;

        assert!(prec(BinaryOperator::Or) < prec(BinaryOperator::And));
        assert!(prec(BinaryOperator::And) < prec(BinaryOperator::Eq));
        assert!(prec(BinaryOperator::Eq) < prec(BinaryOperator::Add));
        assert!(prec(BinaryOperator::Add) < prec(BinaryOperator::Mul));
        assert_eq!(prec(BinaryOperator::Mul), prec(BinaryOperator::Mod));
        assert!(
            prec(BinaryOperator::Mul) < table.unary_info(UnaryOperator::Not).unwrap().precedence
        );
    }

    #[test]
    fn test_symbol_lookup() {
        let table = OperatorTable::new();
        assert_eq!(table.binary_operator("and"), Some(BinaryOperator::And));
        assert_eq!(table.binary_operator("mod"), Some(BinaryOperator::Mod));
        assert_eq!(table.binary_operator("xor"), None);
        assert_eq!(table.unary_operator("not"), Some(UnaryOperator::Not));
        assert_eq!(table.unary_operator("-"), Some(UnaryOperator::Minus));
    }

    #[test]
    fn test_operand_constraints() {
        let table = OperatorTable::new();
        let and_info = table.binary_info(BinaryOperator::And).unwrap();
        assert!((and_info.compat)(&BOOLEAN, &BOOLEAN));
        assert!(!(and_info.compat)(&INT32, &BOOLEAN));

        let add_info = table.binary_info(BinaryOperator::Add).unwrap();
        assert!((add_info.compat)(&INT32, &DOUBLE));
        assert!(!(add_info.compat)(&INT32, &STRING));

        let eq_info = table.binary_info(BinaryOperator::Eq).unwrap();
        assert!((eq_info.compat)(&STRING, &STRING));
        assert!((eq_info.compat)(&INT32, &DOUBLE));
        assert!((eq_info.compat)(
            &STRING,
            &EdmType::Simple(EdmSimpleType::Null)
        ));
        assert!(!(eq_info.compat)(&STRING, &INT32));

        let lt_info = table.binary_info(BinaryOperator::Lt).unwrap();
        assert!((lt_info.compat)(&STRING, &STRING));
        assert!(!(lt_info.compat)(&BOOLEAN, &BOOLEAN));
    }

    #[test]
    fn test_result_rules() {
        let table = OperatorTable::new();
        let add_info = table.binary_info(BinaryOperator::Add).unwrap();
        assert_eq!((add_info.result)(&INT32, &DOUBLE), Some(DOUBLE.clone()));
        assert_eq!((add_info.result)(&INT32, &INT32), Some(INT32.clone()));

        let eq_info = table.binary_info(BinaryOperator::Eq).unwrap();
        assert_eq!((eq_info.result)(&STRING, &STRING), Some(BOOLEAN.clone()));

        let neg_info = table.unary_info(UnaryOperator::Minus).unwrap();
        assert_eq!((neg_info.result)(&DOUBLE), Some(DOUBLE.clone()));
    }

    #[test]
    fn test_method_catalog() {
        let table = MethodTable::new();

        let substring = table.lookup("substring").unwrap();
        assert_eq!(substring.signatures.len(), 2);
        assert_eq!(substring.describe_arities(), "2 or 3");
        assert_eq!(substring.max_arity(), 3);
        assert!(substring.signature_for_arity(2).is_some());
        assert!(substring.signature_for_arity(1).is_none());

        let year = table.lookup("year").unwrap();
        assert_eq!(year.signatures.len(), 1);
        assert!(year.signatures[0].params[0].accepts(&EdmType::Simple(EdmSimpleType::DateTime)));
        assert!(!year.signatures[0].params[0].accepts(&STRING));

        let round = table.lookup("round").unwrap();
        assert_eq!(
            (round.signatures[0].result)(&[DOUBLE.clone()]),
            Some(DOUBLE.clone())
        );

        assert!(table.lookup("nosuchfn").is_none());
    }

    #[test]
    fn test_custom_tables_are_isolated() {
        let mut custom = MethodTable::empty();
        custom.register(MethodInfo::new(
            "shout",
            vec![MethodSignature {
                params: vec![ParamKind::Text],
                result: method_result_string,
            }],
        ));
        assert!(custom.lookup("shout").is_some());
        assert!(custom.lookup("substring").is_none());

        // the default catalog is untouched
        assert!(MethodTable::new().lookup("shout").is_none());
    }
}
