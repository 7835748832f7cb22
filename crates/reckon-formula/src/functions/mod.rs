//! Built-in function library
//!
//! Functions come in two flavors: pure (`fn(&[Value]) -> Value`) and
//! context-aware (`fn(&dyn Context, &Evaluator, &[Value]) -> Value`) for the
//! handful that read sheet state (INDIRECT, NOW, YEAR, ...). Both live in a
//! [`Registry`] populated once at process start; evaluators share the default
//! registry or take their own.
//!
//! Every function validates its own arity and argument types and returns a
//! typed error value on violation - there is no shared validation framework.

pub mod datetime;
pub mod financial;
pub mod info;
pub mod logical;
pub mod lookup;
pub mod math;
pub mod statistical;
pub mod text;

use crate::context::Context;
use crate::evaluator::Evaluator;
use crate::value::{for_each_scalar, Value};
use ahash::AHashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// A context-independent function
pub type Function = fn(&[Value]) -> Value;

/// A function that needs sheet access
pub type ComplexFunction = fn(&dyn Context, &Evaluator, &[Value]) -> Value;

/// Append-only name → implementation mappings for both function flavors.
/// Lookup is case-insensitive (names are stored uppercase).
pub struct Registry {
    simple: AHashMap<String, Function>,
    complex: AHashMap<String, ComplexFunction>,
}

impl Registry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            simple: AHashMap::new(),
            complex: AHashMap::new(),
        }
    }

    /// A registry holding the full built-in library
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        math::register(&mut registry);
        statistical::register(&mut registry);
        logical::register(&mut registry);
        text::register(&mut registry);
        datetime::register(&mut registry);
        financial::register(&mut registry);
        lookup::register(&mut registry);
        info::register(&mut registry);
        registry
    }

    /// Register a pure function. Re-registering a name is a programming
    /// error; the duplicate is logged and ignored.
    pub fn register(&mut self, name: &str, f: Function) {
        let key = name.to_uppercase();
        if self.simple.contains_key(&key) || self.complex.contains_key(&key) {
            log::warn!("duplicate registration of function {key} ignored");
            return;
        }
        self.simple.insert(key, f);
    }

    /// Register a context-aware function
    pub fn register_complex(&mut self, name: &str, f: ComplexFunction) {
        let key = name.to_uppercase();
        if self.simple.contains_key(&key) || self.complex.contains_key(&key) {
            log::warn!("duplicate registration of function {key} ignored");
            return;
        }
        self.complex.insert(key, f);
    }

    pub fn simple(&self, name: &str) -> Option<Function> {
        self.simple.get(&name.to_uppercase()).copied()
    }

    pub fn complex(&self, name: &str) -> Option<ComplexFunction> {
        self.complex.get(&name.to_uppercase()).copied()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

static DEFAULT_REGISTRY: Lazy<Arc<Registry>> = Lazy::new(|| Arc::new(Registry::with_builtins()));

/// The shared built-in registry
pub fn default_registry() -> Arc<Registry> {
    Arc::clone(&DEFAULT_REGISTRY)
}

// === Argument helpers shared by the function modules ===

/// Coerce a value to a number. Errors pass through, strings parse, Empty is
/// zero; anything else is a #VALUE! error.
pub(crate) fn numeric(value: &Value) -> Result<f64, Value> {
    if value.is_error() {
        return Err(value.clone());
    }
    match value.as_number() {
        Value::Number { value, .. } => Ok(value),
        _ => Err(Value::value_error("expected a numeric argument")),
    }
}

/// Fetch and coerce the argument at `idx`. Missing or Empty arguments fall
/// back to `default` when one is given.
pub(crate) fn numeric_arg(args: &[Value], idx: usize, default: Option<f64>) -> Result<f64, Value> {
    match args.get(idx) {
        None | Some(Value::Empty) => {
            default.ok_or_else(|| Value::value_error("missing numeric argument"))
        }
        Some(v) => numeric(v),
    }
}

/// Fetch the argument at `idx` as text (numbers render canonically)
pub(crate) fn text_arg(args: &[Value], idx: usize) -> Result<String, Value> {
    match args.get(idx) {
        None => Err(Value::value_error("missing text argument")),
        Some(v) if v.is_error() => Err(v.clone()),
        Some(v) => Ok(v.text()),
    }
}

/// Truthiness for logical functions: numbers are non-zero, text TRUE/FALSE
/// parses, everything else has no truth value.
pub(crate) fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Number { value, .. } => Some(*value != 0.0),
        Value::String(s) => match s.to_ascii_uppercase().as_str() {
            "TRUE" => Some(true),
            "FALSE" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Flatten arguments and collect numeric scalars, propagating the first
/// error encountered. Text and empty cells are skipped, matching how
/// aggregates walk ranges.
pub(crate) fn numeric_scalars(args: &[Value]) -> Result<Vec<f64>, Value> {
    let mut out = Vec::new();
    let mut error: Option<Value> = None;
    for_each_scalar(args.iter(), &mut |v| {
        if error.is_some() {
            return;
        }
        match v {
            Value::Error(_) => error = Some(v.clone()),
            Value::Number { value, .. } => out.push(*value),
            _ => {}
        }
    });
    match error {
        Some(e) => Err(e),
        None => Ok(out),
    }
}

/// Pair up a range argument with a criteria-range argument of the same
/// shape, yielding flat (value, criteria_value) vectors. Shapes must agree.
pub(crate) fn paired_ranges(range: &Value, other: &Value) -> Result<(Vec<Value>, Vec<Value>), Value> {
    let a = crate::value::flatten(std::slice::from_ref(range));
    let b = crate::value::flatten(std::slice::from_ref(other));
    if a.len() != b.len() {
        return Err(Value::value_error("ranges must have the same shape"));
    }
    Ok((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup_case_insensitive() {
        let registry = Registry::with_builtins();
        assert!(registry.simple("SUM").is_some());
        assert!(registry.simple("sum").is_some());
        assert!(registry.simple("NOSUCH").is_none());
        assert!(registry.complex("INDIRECT").is_some());
        // A name lives in exactly one registry
        assert!(registry.complex("SUM").is_none());
    }

    #[test]
    fn test_duplicate_registration_is_ignored() {
        fn stub(_: &[Value]) -> Value {
            Value::number(1.0)
        }
        fn stub2(_: &[Value]) -> Value {
            Value::number(2.0)
        }
        let mut registry = Registry::new();
        registry.register("F", stub);
        registry.register("f", stub2);
        let f = registry.simple("F").unwrap();
        assert_eq!(f(&[]), Value::number(1.0));
    }

    #[test]
    fn test_numeric_scalars_skips_text() {
        let values = vec![
            Value::number(1.0),
            Value::string("x"),
            Value::List(vec![Value::number(2.0), Value::Empty]),
        ];
        assert_eq!(numeric_scalars(&values).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_numeric_scalars_propagates_error() {
        let values = vec![
            Value::number(1.0),
            Value::error(reckon_core::ErrorKind::Na, "missing"),
        ];
        let err = numeric_scalars(&values).unwrap_err();
        assert_eq!(err.error_kind(), Some(reckon_core::ErrorKind::Na));
    }
}
