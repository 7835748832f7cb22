//! Information functions
//!
//! `CELL` and `ISFORMULA` are dispatched from `FunctionCall::eval` with the
//! static reference of their argument (alongside `ISREF`, which is answered
//! there entirely).

use super::lookup::parse_reference;
use super::{numeric, Registry};
use crate::context::Context;
use crate::reference::Reference;
use crate::value::Value;
use reckon_core::{CellAddress, ErrorKind};

pub(crate) fn register(registry: &mut Registry) {
    registry.register("ISBLANK", fn_isblank);
    registry.register("ISERR", fn_iserr);
    registry.register("ISERROR", fn_iserror);
    registry.register("ISEVEN", fn_iseven);
    registry.register("ISLOGICAL", fn_islogical);
    registry.register("ISNA", fn_isna);
    registry.register("ISNONTEXT", fn_isnontext);
    registry.register("ISNUMBER", fn_isnumber);
    registry.register("ISODD", fn_isodd);
    registry.register("ISTEXT", fn_istext);
    registry.register("N", fn_n);
    registry.register("NA", fn_na);
    registry.register("TYPE", fn_type);
}

fn single<'a>(args: &'a [Value], name: &str) -> Result<&'a Value, Value> {
    if args.len() != 1 {
        return Err(Value::value_error(format!("{name} requires one argument")));
    }
    Ok(&args[0])
}

fn fn_isblank(args: &[Value]) -> Value {
    match single(args, "ISBLANK") {
        Ok(v) => Value::boolean(v.is_empty()),
        Err(e) => e,
    }
}

fn fn_iserror(args: &[Value]) -> Value {
    match single(args, "ISERROR") {
        Ok(v) => Value::boolean(v.is_error()),
        Err(e) => e,
    }
}

/// ISERR is true for every error except #N/A
fn fn_iserr(args: &[Value]) -> Value {
    match single(args, "ISERR") {
        Ok(v) => Value::boolean(v.is_error() && v.error_kind() != Some(ErrorKind::Na)),
        Err(e) => e,
    }
}

fn fn_isna(args: &[Value]) -> Value {
    match single(args, "ISNA") {
        Ok(v) => Value::boolean(v.error_kind() == Some(ErrorKind::Na)),
        Err(e) => e,
    }
}

fn fn_islogical(args: &[Value]) -> Value {
    match single(args, "ISLOGICAL") {
        Ok(v) => Value::boolean(v.is_boolean()),
        Err(e) => e,
    }
}

/// Booleans are not numbers to ISNUMBER, even though they compute as 1/0
fn fn_isnumber(args: &[Value]) -> Value {
    match single(args, "ISNUMBER") {
        Ok(v) => Value::boolean(matches!(v, Value::Number { boolean: false, .. })),
        Err(e) => e,
    }
}

fn fn_istext(args: &[Value]) -> Value {
    match single(args, "ISTEXT") {
        Ok(v) => Value::boolean(matches!(v, Value::String(_))),
        Err(e) => e,
    }
}

fn fn_isnontext(args: &[Value]) -> Value {
    match single(args, "ISNONTEXT") {
        Ok(v) => Value::boolean(!matches!(v, Value::String(_))),
        Err(e) => e,
    }
}

fn parity(args: &[Value], name: &str, want_even: bool) -> Value {
    if args.len() != 1 {
        return Value::value_error(format!("{name} requires one argument"));
    }
    match numeric(&args[0]) {
        Ok(n) => {
            let even = (n.trunc() as i64) % 2 == 0;
            Value::boolean(even == want_even)
        }
        Err(e) => e,
    }
}

fn fn_iseven(args: &[Value]) -> Value {
    parity(args, "ISEVEN", true)
}

fn fn_isodd(args: &[Value]) -> Value {
    parity(args, "ISODD", false)
}

/// N: numbers pass through, everything non-numeric becomes 0
fn fn_n(args: &[Value]) -> Value {
    match single(args, "N") {
        Ok(Value::Error(e)) => Value::Error(e.clone()),
        Ok(Value::Number { value, .. }) => Value::number(*value),
        Ok(_) => Value::number(0.0),
        Err(e) => e,
    }
}

fn fn_na(args: &[Value]) -> Value {
    if !args.is_empty() {
        return Value::value_error("NA takes no arguments");
    }
    Value::error(ErrorKind::Na, "value not available")
}

fn fn_type(args: &[Value]) -> Value {
    match single(args, "TYPE") {
        Ok(v) => Value::number(match v {
            Value::Empty => 1.0,
            Value::Number { boolean: true, .. } => 4.0,
            Value::Number { .. } => 1.0,
            Value::String(_) => 2.0,
            Value::Error(_) => 16.0,
            Value::List(_) | Value::Array(_) => 64.0,
        }),
        Err(e) => e,
    }
}

/// CELL: properties of a referenced cell, answered through the Context
pub(crate) fn cell_info(
    ctx: &dyn Context,
    info: &Value,
    reference: &Reference,
    target: Option<&Value>,
) -> Value {
    if info.is_error() {
        return info.clone();
    }
    let info = info.text().to_lowercase();
    let Some((_, range)) = parse_reference(reference) else {
        return Value::value_error("CELL requires a reference argument");
    };
    let addr = CellAddress::new(range.start.row, range.start.col);
    let addr_text = addr.to_a1_string();

    match info.as_str() {
        "address" => Value::string(
            CellAddress::with_absolute(addr.row, addr.col, true, true).to_a1_string(),
        ),
        "col" => Value::number((addr.col + 1) as f64),
        "row" => Value::number((addr.row + 1) as f64),
        "filename" => Value::string(ctx.filename()),
        "format" => Value::string(ctx.format(&addr_text)),
        "width" => Value::number(ctx.width(addr.col)),
        "prefix" => Value::string(ctx.label_prefix(&addr_text)),
        "protect" => Value::number(if ctx.locked(&addr_text) { 1.0 } else { 0.0 }),
        "contents" => target.cloned().unwrap_or(Value::Empty),
        "type" => match target {
            None | Some(Value::Empty) => Value::string("b"),
            Some(Value::String(_)) => Value::string("l"),
            Some(_) => Value::string("v"),
        },
        _ => Value::value_error(format!("unknown CELL info type '{info}'")),
    }
}

/// ISFORMULA: whether the referenced cell holds a formula
pub(crate) fn is_formula(ctx: &dyn Context, reference: &Reference) -> Value {
    let Some((sheet, range)) = parse_reference(reference) else {
        return Value::value_error("ISFORMULA requires a reference argument");
    };
    let target_ctx: &dyn Context = match &sheet {
        Some(name) => ctx.sheet(name),
        None => ctx,
    };
    let addr = CellAddress::new(range.start.row, range.start.col);
    Value::boolean(target_ctx.has_formula(&addr.to_a1_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testctx::{eval, eval_with, SheetContext};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_is_family() {
        assert_eq!(eval("=ISBLANK(\"\")"), Value::boolean(false));
        assert_eq!(eval("=ISBLANK(A1)"), Value::boolean(true));
        assert_eq!(eval("=ISNUMBER(123)"), Value::boolean(true));
        assert_eq!(eval("=ISNUMBER(TRUE)"), Value::boolean(false));
        assert_eq!(eval("=ISLOGICAL(TRUE)"), Value::boolean(true));
        assert_eq!(eval("=ISTEXT(\"x\")"), Value::boolean(true));
        assert_eq!(eval("=ISNONTEXT(1)"), Value::boolean(true));
        assert_eq!(eval("=ISERROR(1/0)"), Value::boolean(true));
        assert_eq!(eval("=ISERR(1/0)"), Value::boolean(true));
        assert_eq!(eval("=ISERR(NA())"), Value::boolean(false));
        assert_eq!(eval("=ISNA(NA())"), Value::boolean(true));
        assert_eq!(eval("=ISEVEN(4)"), Value::boolean(true));
        assert_eq!(eval("=ISODD(4.5)"), Value::boolean(false));
    }

    #[test]
    fn test_isref() {
        let mut ctx = SheetContext::new();
        ctx.set("A1", Value::number(1.0));
        assert_eq!(eval_with(&ctx, "=ISREF(A1)"), Value::boolean(true));
        assert_eq!(eval_with(&ctx, "=ISREF(B2:C4)"), Value::boolean(true));
        assert_eq!(eval_with(&ctx, "=ISREF(123)"), Value::boolean(false));
        assert_eq!(eval_with(&ctx, "=ISREF(\"A1\")"), Value::boolean(false));
        // A prefix to a sheet that does not exist fails evaluation
        assert_eq!(
            eval_with(&ctx, "=ISREF(Missing!A1)"),
            Value::boolean(false)
        );
    }

    #[test]
    fn test_n_na_type() {
        assert_eq!(eval("=N(123)"), Value::number(123.0));
        assert_eq!(eval("=N(TRUE)"), Value::number(1.0));
        assert_eq!(eval("=N(\"text\")"), Value::number(0.0));
        assert_eq!(eval("=NA()").error_kind(), Some(ErrorKind::Na));
        assert_eq!(eval("=TYPE(1)"), Value::number(1.0));
        assert_eq!(eval("=TYPE(\"x\")"), Value::number(2.0));
        assert_eq!(eval("=TYPE(TRUE)"), Value::number(4.0));
        assert_eq!(eval("=TYPE(1/0)"), Value::number(16.0));
        assert_eq!(eval("=TYPE({1,2})"), Value::number(64.0));
    }

    #[test]
    fn test_cell() {
        let mut ctx = SheetContext::new();
        ctx.set("B2", Value::number(7.0));
        ctx.set_format("B2", "0.00");
        let ctx = ctx.with_filename("book.xlsx");
        assert_eq!(
            eval_with(&ctx, "=CELL(\"address\",B2)"),
            Value::string("$B$2")
        );
        assert_eq!(eval_with(&ctx, "=CELL(\"row\",B2)"), Value::number(2.0));
        assert_eq!(eval_with(&ctx, "=CELL(\"col\",B2)"), Value::number(2.0));
        assert_eq!(
            eval_with(&ctx, "=CELL(\"format\",B2)"),
            Value::string("0.00")
        );
        assert_eq!(
            eval_with(&ctx, "=CELL(\"filename\",B2)"),
            Value::string("book.xlsx")
        );
        assert_eq!(
            eval_with(&ctx, "=CELL(\"contents\",B2)"),
            Value::number(7.0)
        );
        assert_eq!(eval_with(&ctx, "=CELL(\"type\",B2)"), Value::string("v"));
        assert_eq!(eval_with(&ctx, "=CELL(\"type\",C9)"), Value::string("b"));
        assert_eq!(
            eval_with(&ctx, "=CELL(\"bogus\",B2)").error_kind(),
            Some(ErrorKind::Value)
        );
    }

    #[test]
    fn test_isformula() {
        let mut ctx = SheetContext::new();
        ctx.set("A1", Value::string("=SUM(B1:B2)"));
        ctx.set("A2", Value::number(5.0));
        assert_eq!(eval_with(&ctx, "=ISFORMULA(A1)"), Value::boolean(true));
        assert_eq!(eval_with(&ctx, "=ISFORMULA(A2)"), Value::boolean(false));
    }
}
