//! Evaluation result model
//!
//! Every operator and function in the engine consumes and produces [`Value`].
//! Errors are values too: evaluation is total, and the only thing a caller
//! ever sees is a `Value`.

use reckon_core::ErrorKind;
use std::fmt;

/// An error value carried through evaluation.
///
/// The kind is contractual; the message is diagnostic only and never part of
/// the formula-level contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorValue {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorValue {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.code())
    }
}

/// The result of evaluating a formula expression.
///
/// `List` is the 1-D shape produced by single-row ranges; `Array` is the 2-D
/// row-major shape. They are kept distinct because some functions (INDEX,
/// TRANSPOSE) are dimension-sensitive. Values are never mutated after
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Blank cell or omitted argument
    Empty,
    /// Numeric value. `boolean` marks TRUE/FALSE results, which render as
    /// boolean literals but behave as 1/0 in arithmetic and comparisons.
    Number { value: f64, boolean: bool },
    /// Text value
    String(String),
    /// 1-D list (single-row range)
    List(Vec<Value>),
    /// 2-D array, row-major
    Array(Vec<Vec<Value>>),
    /// Error value
    Error(ErrorValue),
}

impl Value {
    /// Construct a plain number
    pub fn number(value: f64) -> Value {
        Value::Number {
            value,
            boolean: false,
        }
    }

    /// Construct a boolean (a number that renders as TRUE/FALSE)
    pub fn boolean(value: bool) -> Value {
        Value::Number {
            value: if value { 1.0 } else { 0.0 },
            boolean: true,
        }
    }

    /// Construct a string value
    pub fn string(s: impl Into<String>) -> Value {
        Value::String(s.into())
    }

    /// Construct an error value with a diagnostic message
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Value {
        Value::Error(ErrorValue::new(kind, message))
    }

    /// Shorthand for the ubiquitous #VALUE! error
    pub fn value_error(message: impl Into<String>) -> Value {
        Value::error(ErrorKind::Value, message)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Value::Number { boolean: true, .. })
    }

    /// The error kind, if this is an error
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Value::Error(e) => Some(e.kind),
            _ => None,
        }
    }

    /// The numeric value, if this is a number (no coercion)
    pub fn number_value(&self) -> Option<f64> {
        match self {
            Value::Number { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Numeric coercion: strings that parse as numbers become numbers,
    /// Empty becomes 0, everything else is returned unchanged.
    pub fn as_number(&self) -> Value {
        match self {
            Value::String(s) => match s.trim().parse::<f64>() {
                Ok(n) => Value::number(n),
                Err(_) => self.clone(),
            },
            Value::Empty => Value::number(0.0),
            _ => self.clone(),
        }
    }

    /// String coercion: numbers become their canonical decimal text,
    /// everything else is returned unchanged.
    pub fn as_string(&self) -> Value {
        match self {
            Value::Number { .. } => Value::String(self.text()),
            _ => self.clone(),
        }
    }

    /// The display rendering of this value: numbers with at most 12
    /// significant digits, booleans as TRUE/FALSE, lists and arrays as their
    /// first element, errors as their code, empty as "".
    pub fn text(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Number { value, boolean } => {
                if *boolean {
                    if *value == 0.0 { "FALSE".into() } else { "TRUE".into() }
                } else {
                    format_number(*value)
                }
            }
            Value::String(s) => s.clone(),
            Value::List(items) => items.first().map(Value::text).unwrap_or_default(),
            Value::Array(rows) => rows
                .first()
                .and_then(|row| row.first())
                .map(Value::text)
                .unwrap_or_default(),
            Value::Error(e) => e.kind.code().to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// Render a number with at most 12 significant digits, trailing zeros
/// trimmed. Matches the spreadsheet's cell display of unformatted numbers.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "#NUM!".into();
    }
    if n.is_infinite() {
        return "#NUM!".into();
    }
    if n == 0.0 {
        return "0".into();
    }
    // Round to 12 significant digits, then let shortest-round-trip
    // formatting do the rest.
    let magnitude = n.abs().log10().floor() as i32;
    let rounded = if magnitude.abs() < 300 {
        let factor = 10f64.powi(11 - magnitude);
        (n * factor).round() / factor
    } else {
        n
    };
    if rounded == rounded.trunc() && rounded.abs() < 1e15 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}

/// Apply a scalar operation across two values, broadcasting over List and
/// Array shapes.
///
/// Errors short-circuit (left first). Two arrays or two lists must agree in
/// dimensions; a shape mismatched pairing is a #VALUE! error. A scalar paired
/// with a list or array is broadcast across every element. The scalar rules
/// themselves are supplied by `op`.
pub fn broadcast_binary<F>(lhs: &Value, rhs: &Value, op: F) -> Value
where
    F: Fn(&Value, &Value) -> Value + Copy,
{
    if lhs.is_error() {
        return lhs.clone();
    }
    if rhs.is_error() {
        return rhs.clone();
    }
    match (lhs, rhs) {
        (Value::Array(a), Value::Array(b)) => {
            if a.len() != b.len() || a.iter().zip(b).any(|(ra, rb)| ra.len() != rb.len()) {
                return Value::value_error("lhs/rhs should have same dimensions");
            }
            let rows = a
                .iter()
                .zip(b)
                .map(|(ra, rb)| {
                    ra.iter()
                        .zip(rb)
                        .map(|(x, y)| broadcast_binary(x, y, op))
                        .collect()
                })
                .collect();
            Value::Array(rows)
        }
        (Value::List(a), Value::List(b)) => {
            if a.len() != b.len() {
                return Value::value_error("lhs/rhs should have same dimensions");
            }
            Value::List(
                a.iter()
                    .zip(b)
                    .map(|(x, y)| broadcast_binary(x, y, op))
                    .collect(),
            )
        }
        (Value::Array(a), _) => Value::Array(
            a.iter()
                .map(|row| row.iter().map(|x| broadcast_binary(x, rhs, op)).collect())
                .collect(),
        ),
        (_, Value::Array(b)) => Value::Array(
            b.iter()
                .map(|row| row.iter().map(|y| broadcast_binary(lhs, y, op)).collect())
                .collect(),
        ),
        (Value::List(a), _) => {
            Value::List(a.iter().map(|x| broadcast_binary(x, rhs, op)).collect())
        }
        (_, Value::List(b)) => {
            Value::List(b.iter().map(|y| broadcast_binary(lhs, y, op)).collect())
        }
        _ => op(lhs, rhs),
    }
}

/// Walk every scalar inside a slice of values, recursing through List and
/// Array shapes. This is the flatten shared by every aggregate function.
pub fn for_each_scalar<'a, F>(values: impl IntoIterator<Item = &'a Value>, f: &mut F)
where
    F: FnMut(&Value),
{
    for value in values {
        match value {
            Value::List(items) => for_each_scalar(items.iter(), f),
            Value::Array(rows) => {
                for row in rows {
                    for_each_scalar(row.iter(), f);
                }
            }
            other => f(other),
        }
    }
}

/// Collect every scalar inside a slice of values into a flat vector
pub fn flatten(values: &[Value]) -> Vec<Value> {
    let mut out = Vec::new();
    for_each_scalar(values.iter(), &mut |v| out.push(v.clone()));
    out
}

/// The first error found scanning scalars left to right, if any
pub fn first_error(values: &[Value]) -> Option<Value> {
    let mut found = None;
    for_each_scalar(values.iter(), &mut |v| {
        if found.is_none() && v.is_error() {
            found = Some(v.clone());
        }
    });
    found
}

/// Excel-style ordering for the `<`/`>` comparison family.
///
/// Same-type comparisons are numeric or case-insensitive textual; mixed
/// types order as Empty < Number < String.
pub fn compare(lhs: &Value, rhs: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (lhs, rhs) {
        (Value::Number { value: a, .. }, Value::Number { value: b, .. }) => {
            a.partial_cmp(b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Value::Empty, Value::Empty) => Ordering::Equal,
        (Value::Empty, _) => Ordering::Less,
        (_, Value::Empty) => Ordering::Greater,
        (Value::Number { .. }, _) => Ordering::Less,
        (_, Value::Number { .. }) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Excel-style equality for `=`/`<>`: Empty equals 0 and the empty string,
/// text compares case-insensitively, numbers numerically.
pub fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Empty, Value::Empty) => true,
        (Value::Empty, Value::Number { value, .. })
        | (Value::Number { value, .. }, Value::Empty) => *value == 0.0,
        (Value::Empty, Value::String(s)) | (Value::String(s), Value::Empty) => s.is_empty(),
        (Value::Number { value: a, .. }, Value::Number { value: b, .. }) => a == b,
        (Value::String(a), Value::String(b)) => a.eq_ignore_ascii_case(b),
        (Value::Error(a), Value::Error(b)) => a.kind == b.kind,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reckon_core::ErrorKind;

    #[test]
    fn test_boolean_is_number() {
        let v = Value::boolean(true);
        assert_eq!(v.number_value(), Some(1.0));
        assert_eq!(v.text(), "TRUE");
        assert_eq!(Value::boolean(false).text(), "FALSE");
    }

    #[test]
    fn test_as_number_coercion() {
        assert_eq!(Value::string("3.5").as_number(), Value::number(3.5));
        assert_eq!(Value::string("abc").as_number(), Value::string("abc"));
        assert_eq!(Value::Empty.as_number(), Value::number(0.0));
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(-3.25), "-3.25");
        assert_eq!(format_number(0.0), "0");
        // Floating noise collapses under the 12-significant-digit cap
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(1.0 / 3.0), "0.333333333333");
    }

    #[test]
    fn test_text_rendering() {
        assert_eq!(Value::Empty.text(), "");
        assert_eq!(Value::error(ErrorKind::Ref, "gone").text(), "#REF!");
        let list = Value::List(vec![Value::number(7.0), Value::number(8.0)]);
        assert_eq!(list.text(), "7");
        let array = Value::Array(vec![vec![Value::string("x")], vec![Value::string("y")]]);
        assert_eq!(array.text(), "x");
    }

    #[test]
    fn test_broadcast_scalar_over_array() {
        let array = Value::Array(vec![
            vec![Value::number(1.0), Value::number(2.0)],
            vec![Value::number(3.0), Value::number(4.0)],
        ]);
        let result = broadcast_binary(&array, &Value::number(10.0), |a, b| {
            Value::number(a.number_value().unwrap() + b.number_value().unwrap())
        });
        assert_eq!(
            result,
            Value::Array(vec![
                vec![Value::number(11.0), Value::number(12.0)],
                vec![Value::number(13.0), Value::number(14.0)],
            ])
        );
    }

    #[test]
    fn test_broadcast_dimension_mismatch() {
        let a = Value::List(vec![Value::number(1.0)]);
        let b = Value::List(vec![Value::number(1.0), Value::number(2.0)]);
        let result = broadcast_binary(&a, &b, |_, _| Value::number(0.0));
        assert_eq!(result.error_kind(), Some(ErrorKind::Value));
    }

    #[test]
    fn test_broadcast_error_short_circuit() {
        let err = Value::error(ErrorKind::Na, "missing");
        let result = broadcast_binary(&err, &Value::number(1.0), |_, _| Value::number(0.0));
        assert_eq!(result.error_kind(), Some(ErrorKind::Na));
    }

    #[test]
    fn test_flatten_nested() {
        let values = vec![
            Value::number(1.0),
            Value::List(vec![
                Value::number(2.0),
                Value::Array(vec![vec![Value::number(3.0), Value::number(4.0)]]),
            ]),
        ];
        let flat = flatten(&values);
        assert_eq!(flat.len(), 4);
        assert_eq!(flat[3], Value::number(4.0));
    }

    #[test]
    fn test_compare_ordering() {
        use std::cmp::Ordering;
        assert_eq!(
            compare(&Value::number(1.0), &Value::string("a")),
            Ordering::Less
        );
        assert_eq!(
            compare(&Value::string("B"), &Value::string("a")),
            Ordering::Greater
        );
        assert_eq!(compare(&Value::Empty, &Value::number(-5.0)), Ordering::Less);
    }

    #[test]
    fn test_loose_eq_empty_rules() {
        assert!(loose_eq(&Value::Empty, &Value::number(0.0)));
        assert!(loose_eq(&Value::Empty, &Value::string("")));
        assert!(!loose_eq(&Value::Empty, &Value::number(1.0)));
        assert!(loose_eq(&Value::string("Abc"), &Value::string("abc")));
    }
}
