//! Logical functions

use super::{truthy, Registry};
use crate::value::{for_each_scalar, loose_eq, Value};
use reckon_core::ErrorKind;

pub(crate) fn register(registry: &mut Registry) {
    registry.register("AND", fn_and);
    registry.register("FALSE", fn_false);
    registry.register("IF", fn_if);
    registry.register("IFERROR", fn_iferror);
    registry.register("IFNA", fn_ifna);
    registry.register("IFS", fn_ifs);
    registry.register("NOT", fn_not);
    registry.register("OR", fn_or);
    registry.register("SWITCH", fn_switch);
    registry.register("TRUE", fn_true);
    registry.register("XOR", fn_xor);
}

/// Collect the truth values inside the arguments, recursing into shapes.
/// Entries with no truth value (text, blanks) are skipped.
fn truth_values(args: &[Value]) -> Result<Vec<bool>, Value> {
    let mut out = Vec::new();
    let mut error: Option<Value> = None;
    for_each_scalar(args.iter(), &mut |v| {
        if error.is_some() {
            return;
        }
        if v.is_error() {
            error = Some(v.clone());
            return;
        }
        if let Some(b) = truthy(v) {
            out.push(b);
        }
    });
    match error {
        Some(e) => Err(e),
        None => Ok(out),
    }
}

fn combined(args: &[Value], name: &str, f: impl Fn(&[bool]) -> bool) -> Value {
    let truths = match truth_values(args) {
        Ok(ts) => ts,
        Err(e) => return e,
    };
    if truths.is_empty() {
        return Value::value_error(format!("{name} requires at least one logical value"));
    }
    Value::boolean(f(&truths))
}

fn fn_and(args: &[Value]) -> Value {
    combined(args, "AND", |ts| ts.iter().all(|&t| t))
}

fn fn_or(args: &[Value]) -> Value {
    combined(args, "OR", |ts| ts.iter().any(|&t| t))
}

fn fn_xor(args: &[Value]) -> Value {
    combined(args, "XOR", |ts| ts.iter().filter(|&&t| t).count() % 2 == 1)
}

fn fn_not(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::value_error("NOT requires one argument");
    }
    if args[0].is_error() {
        return args[0].clone();
    }
    match truthy(&args[0]) {
        Some(b) => Value::boolean(!b),
        None => Value::value_error("NOT requires a logical value"),
    }
}

fn fn_true(args: &[Value]) -> Value {
    if !args.is_empty() {
        return Value::value_error("TRUE takes no arguments");
    }
    Value::boolean(true)
}

fn fn_false(args: &[Value]) -> Value {
    if !args.is_empty() {
        return Value::value_error("FALSE takes no arguments");
    }
    Value::boolean(false)
}

fn fn_if(args: &[Value]) -> Value {
    if args.is_empty() || args.len() > 3 {
        return Value::value_error("IF requires one to three arguments");
    }
    if args[0].is_error() {
        return args[0].clone();
    }
    let condition = match truthy(&args[0]) {
        Some(b) => b,
        None => match &args[0] {
            Value::Empty => false,
            _ => return Value::value_error("IF condition is not a logical value"),
        },
    };
    if condition {
        match args.get(1) {
            Some(Value::Empty) | None => Value::number(0.0),
            Some(v) => v.clone(),
        }
    } else {
        match args.get(2) {
            Some(Value::Empty) => Value::number(0.0),
            Some(v) => v.clone(),
            None => Value::boolean(false),
        }
    }
}

fn fn_iferror(args: &[Value]) -> Value {
    if args.len() != 2 {
        return Value::value_error("IFERROR requires two arguments");
    }
    if args[0].is_error() {
        args[1].clone()
    } else {
        args[0].clone()
    }
}

/// IFNA falls back only for #N/A; other errors pass through
fn fn_ifna(args: &[Value]) -> Value {
    if args.len() != 2 {
        return Value::value_error("IFNA requires two arguments");
    }
    if args[0].error_kind() == Some(ErrorKind::Na) {
        args[1].clone()
    } else {
        args[0].clone()
    }
}

fn fn_ifs(args: &[Value]) -> Value {
    if args.is_empty() || args.len() % 2 != 0 {
        return Value::value_error("IFS requires condition/value pairs");
    }
    for pair in args.chunks(2) {
        if pair[0].is_error() {
            return pair[0].clone();
        }
        if truthy(&pair[0]) == Some(true) {
            return pair[1].clone();
        }
    }
    Value::error(ErrorKind::Na, "no IFS condition matched")
}

fn fn_switch(args: &[Value]) -> Value {
    if args.len() < 3 {
        return Value::value_error("SWITCH requires an expression and at least one case");
    }
    let subject = &args[0];
    if subject.is_error() {
        return subject.clone();
    }
    let mut rest = &args[1..];
    while rest.len() >= 2 {
        if loose_eq(subject, &rest[0]) {
            return rest[1].clone();
        }
        rest = &rest[2..];
    }
    // An odd trailing argument is the default
    match rest.first() {
        Some(default) => default.clone(),
        None => Value::error(ErrorKind::Na, "no SWITCH case matched"),
    }
}
