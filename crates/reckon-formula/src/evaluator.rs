//! Formula evaluator
//!
//! [`Evaluator`] is the engine's single external entry point: it parses
//! formula text and drives evaluation of the resulting expression tree. It
//! owns the function registry and a reference-result cache that memoizes
//! range reads so a formula like `SUM(A1:A1000)/COUNT(A1:A1000)` walks the
//! sheet once.

use crate::context::Context;
use crate::functions::{default_registry, Registry};
use crate::parser::parse;
use crate::value::Value;
use ahash::AHashMap;
use std::sync::{Arc, Mutex};

/// Parses and evaluates formulas against a [`Context`].
///
/// An evaluator may be reused across many `eval` calls; cached range results
/// persist for its whole lifetime and are never invalidated here. Construct a
/// fresh evaluator (or discard this one) whenever the underlying sheet data
/// changes.
pub struct Evaluator {
    registry: Arc<Registry>,
    cache: Mutex<AHashMap<String, Value>>,
}

impl Evaluator {
    /// An evaluator over the built-in function registry
    pub fn new() -> Self {
        Self::with_registry(default_registry())
    }

    /// An evaluator over a caller-supplied registry
    pub fn with_registry(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            cache: Mutex::new(AHashMap::new()),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Evaluate formula text. Never fails: unparseable text yields a
    /// `#VALUE!` result carrying the original formula.
    pub fn eval(&self, ctx: &dyn Context, text: &str) -> Value {
        match parse(text) {
            Ok(expr) => expr.eval(ctx, self),
            Err(_) => Value::value_error(format!("unable to parse formula {text}")),
        }
    }

    /// Cached result for a canonical reference string
    pub fn cached(&self, key: &str) -> Option<Value> {
        self.cache.lock().unwrap().get(key).cloned()
    }

    /// Memoize a result under a canonical reference string
    pub fn store_cached(&self, key: &str, value: Value) {
        self.cache.lock().unwrap().insert(key.to_string(), value);
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}
