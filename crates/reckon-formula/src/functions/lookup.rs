//! Lookup and reference functions
//!
//! `ROW`, `COLUMN` and `OFFSET` are dispatched from `FunctionCall::eval`
//! with the static [`Reference`] of their argument, since their answers
//! depend on where an argument points, not what it evaluates to.

use super::{numeric, numeric_arg, truthy, Registry};
use crate::ast::eval_cell_range;
use crate::context::Context;
use crate::criteria::wildcard_match;
use crate::evaluator::Evaluator;
use crate::reference::{split_sheet_prefix, Reference};
use crate::value::{compare, flatten, loose_eq, Value};
use reckon_core::{CellAddress, CellRange, ErrorKind};

pub(crate) fn register(registry: &mut Registry) {
    registry.register("CHOOSE", fn_choose);
    registry.register("COLUMNS", fn_columns);
    registry.register("HLOOKUP", fn_hlookup);
    registry.register("INDEX", fn_index);
    registry.register("LOOKUP", fn_lookup);
    registry.register("MATCH", fn_match);
    registry.register("ROWS", fn_rows);
    registry.register("TRANSPOSE", fn_transpose);
    registry.register("VLOOKUP", fn_vlookup);
    registry.register_complex("INDIRECT", fn_indirect);
}

/// View any value as a 2-D grid: an Array is itself, a List is one row, a
/// scalar is 1x1
fn as_grid(value: &Value) -> Vec<Vec<Value>> {
    match value {
        Value::Array(rows) => rows.clone(),
        Value::List(items) => vec![items.clone()],
        other => vec![vec![other.clone()]],
    }
}

/// Parse a Cell or Range reference into its sheet prefix and coordinates
pub(crate) fn parse_reference(reference: &Reference) -> Option<(Option<String>, CellRange)> {
    let s = match reference {
        Reference::Cell(s) | Reference::Range(s) => s,
        _ => return None,
    };
    let (sheet, addr) = match split_sheet_prefix(s) {
        Some((sheet, rest)) => (Some(sheet), rest.to_string()),
        None => (None, s.clone()),
    };
    CellRange::parse(&addr.replace('$', ""))
        .ok()
        .map(|range| (sheet, range))
}

/// Equality used by exact-match lookups: text honors wildcards and case
/// folding, everything else compares loosely
fn lookup_eq(needle: &Value, candidate: &Value) -> bool {
    match (needle, candidate) {
        (Value::String(pattern), Value::String(text)) => {
            wildcard_match(&pattern.to_lowercase(), &text.to_lowercase())
        }
        _ => loose_eq(needle, candidate),
    }
}

fn fn_vlookup(args: &[Value]) -> Value {
    if args.len() < 3 || args.len() > 4 {
        return Value::value_error("VLOOKUP requires three or four arguments");
    }
    let needle = &args[0];
    if needle.is_error() {
        return needle.clone();
    }
    let grid = as_grid(&args[1]);
    let col = match numeric(&args[2]) {
        Ok(n) => n.trunc() as i64,
        Err(e) => return e,
    };
    let approximate = args
        .get(3)
        .map_or(true, |v| truthy(v).unwrap_or(true));
    if col < 1 {
        return Value::value_error("VLOOKUP column index below 1");
    }
    let col = col as usize - 1;

    let mut matched: Option<&Vec<Value>> = None;
    for row in &grid {
        let Some(first) = row.first() else { continue };
        if approximate {
            if compare(first, needle).is_gt() {
                break;
            }
            matched = Some(row);
        } else if lookup_eq(needle, first) {
            matched = Some(row);
            break;
        }
    }
    match matched {
        Some(row) => match row.get(col) {
            Some(v) => v.clone(),
            None => Value::error(ErrorKind::Ref, "VLOOKUP column outside the table"),
        },
        None => Value::error(ErrorKind::Na, "VLOOKUP found no match"),
    }
}

fn fn_hlookup(args: &[Value]) -> Value {
    if args.len() < 3 || args.len() > 4 {
        return Value::value_error("HLOOKUP requires three or four arguments");
    }
    let needle = &args[0];
    if needle.is_error() {
        return needle.clone();
    }
    let grid = as_grid(&args[1]);
    let row_index = match numeric(&args[2]) {
        Ok(n) => n.trunc() as i64,
        Err(e) => return e,
    };
    let approximate = args
        .get(3)
        .map_or(true, |v| truthy(v).unwrap_or(true));
    if row_index < 1 {
        return Value::value_error("HLOOKUP row index below 1");
    }
    let row_index = row_index as usize - 1;
    let Some(header) = grid.first() else {
        return Value::error(ErrorKind::Na, "HLOOKUP over an empty table");
    };

    let mut matched: Option<usize> = None;
    for (i, candidate) in header.iter().enumerate() {
        if approximate {
            if compare(candidate, needle).is_gt() {
                break;
            }
            matched = Some(i);
        } else if lookup_eq(needle, candidate) {
            matched = Some(i);
            break;
        }
    }
    match matched {
        Some(i) => match grid.get(row_index).and_then(|row| row.get(i)) {
            Some(v) => v.clone(),
            None => Value::error(ErrorKind::Ref, "HLOOKUP row outside the table"),
        },
        None => Value::error(ErrorKind::Na, "HLOOKUP found no match"),
    }
}

/// INDEX is dimension-sensitive: a single index into a one-row or
/// one-column shape walks along it
fn fn_index(args: &[Value]) -> Value {
    if args.len() < 2 || args.len() > 3 {
        return Value::value_error("INDEX requires two or three arguments");
    }
    let grid = as_grid(&args[0]);
    let first = match numeric(&args[1]) {
        Ok(n) => n.trunc() as i64,
        Err(e) => return e,
    };
    if first < 1 {
        return Value::value_error("INDEX position below 1");
    }
    let first = first as usize;

    match args.get(2) {
        Some(second) if !second.is_empty() => {
            let col = match numeric(second) {
                Ok(n) => n.trunc() as i64,
                Err(e) => return e,
            };
            if col < 1 {
                return Value::value_error("INDEX position below 1");
            }
            match grid.get(first - 1).and_then(|row| row.get(col as usize - 1)) {
                Some(v) => v.clone(),
                None => Value::error(ErrorKind::Ref, "INDEX outside the array"),
            }
        }
        _ => {
            if grid.len() == 1 {
                match grid[0].get(first - 1) {
                    Some(v) => v.clone(),
                    None => Value::error(ErrorKind::Ref, "INDEX outside the array"),
                }
            } else if grid.iter().all(|row| row.len() == 1) {
                match grid.get(first - 1) {
                    Some(row) => row[0].clone(),
                    None => Value::error(ErrorKind::Ref, "INDEX outside the array"),
                }
            } else {
                match grid.get(first - 1) {
                    Some(row) => Value::List(row.clone()),
                    None => Value::error(ErrorKind::Ref, "INDEX outside the array"),
                }
            }
        }
    }
}

fn fn_match(args: &[Value]) -> Value {
    if args.len() < 2 || args.len() > 3 {
        return Value::value_error("MATCH requires two or three arguments");
    }
    let needle = &args[0];
    if needle.is_error() {
        return needle.clone();
    }
    let haystack = flatten(std::slice::from_ref(&args[1]));
    let match_type = match numeric_arg(args, 2, Some(1.0)) {
        Ok(n) => n,
        Err(e) => return e,
    };

    if match_type == 0.0 {
        for (i, candidate) in haystack.iter().enumerate() {
            if lookup_eq(needle, candidate) {
                return Value::number((i + 1) as f64);
            }
        }
        return Value::error(ErrorKind::Na, "MATCH found no match");
    }

    let mut best: Option<usize> = None;
    for (i, candidate) in haystack.iter().enumerate() {
        let ordering = compare(candidate, needle);
        if match_type > 0.0 {
            // Ascending data: the last value <= needle
            if ordering.is_gt() {
                break;
            }
            best = Some(i);
        } else {
            // Descending data: the last value >= needle
            if ordering.is_lt() {
                break;
            }
            best = Some(i);
        }
    }
    match best {
        Some(i) => Value::number((i + 1) as f64),
        None => Value::error(ErrorKind::Na, "MATCH found no match"),
    }
}

fn fn_lookup(args: &[Value]) -> Value {
    if args.len() < 2 || args.len() > 3 {
        return Value::value_error("LOOKUP requires two or three arguments");
    }
    let needle = &args[0];
    if needle.is_error() {
        return needle.clone();
    }
    let vector = flatten(std::slice::from_ref(&args[1]));
    let results = match args.get(2) {
        Some(v) => flatten(std::slice::from_ref(v)),
        None => vector.clone(),
    };
    let mut best: Option<usize> = None;
    for (i, candidate) in vector.iter().enumerate() {
        if compare(candidate, needle).is_gt() {
            break;
        }
        best = Some(i);
    }
    match best {
        Some(i) => match results.get(i) {
            Some(v) => v.clone(),
            None => Value::error(ErrorKind::Na, "LOOKUP result vector too short"),
        },
        None => Value::error(ErrorKind::Na, "LOOKUP found no match"),
    }
}

fn fn_choose(args: &[Value]) -> Value {
    if args.len() < 2 {
        return Value::value_error("CHOOSE requires an index and at least one value");
    }
    let index = match numeric(&args[0]) {
        Ok(n) => n.trunc() as i64,
        Err(e) => return e,
    };
    if index < 1 || index as usize >= args.len() {
        return Value::value_error("CHOOSE index out of range");
    }
    args[index as usize].clone()
}

fn fn_rows(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::value_error("ROWS requires one argument");
    }
    if args[0].is_error() {
        return args[0].clone();
    }
    Value::number(as_grid(&args[0]).len() as f64)
}

fn fn_columns(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::value_error("COLUMNS requires one argument");
    }
    if args[0].is_error() {
        return args[0].clone();
    }
    let grid = as_grid(&args[0]);
    Value::number(grid.first().map_or(0, Vec::len) as f64)
}

fn fn_transpose(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::value_error("TRANSPOSE requires one argument");
    }
    if args[0].is_error() {
        return args[0].clone();
    }
    let grid = as_grid(&args[0]);
    let cols = grid.first().map_or(0, Vec::len);
    let transposed: Vec<Vec<Value>> = (0..cols)
        .map(|c| {
            grid.iter()
                .map(|row| row.get(c).cloned().unwrap_or(Value::Empty))
                .collect()
        })
        .collect();
    Value::Array(transposed)
}

/// INDIRECT builds a reference from text and reads it
fn fn_indirect(ctx: &dyn Context, ev: &Evaluator, args: &[Value]) -> Value {
    if args.is_empty() || args.len() > 2 {
        return Value::value_error("INDIRECT requires one or two arguments");
    }
    if args[0].is_error() {
        return args[0].clone();
    }
    let text = args[0].text();
    let (target_ctx, addr): (&dyn Context, String) = match split_sheet_prefix(&text) {
        Some((sheet, rest)) => (ctx.sheet(&sheet), rest.to_string()),
        None => (ctx, text.clone()),
    };
    match CellRange::parse(&addr.replace('$', "")) {
        Ok(range) => eval_cell_range(target_ctx, ev, &range.start, &range.end),
        Err(_) => Value::error(ErrorKind::Ref, format!("invalid reference '{text}'")),
    }
}

/// ROW and COLUMN answered from the argument's static reference
pub(crate) fn row_or_column(name: &str, reference: &Reference) -> Value {
    match parse_reference(reference) {
        Some((_, range)) => {
            if name == "ROW" {
                Value::number((range.start.row + 1) as f64)
            } else {
                Value::number((range.start.col + 1) as f64)
            }
        }
        None => Value::value_error(format!("{name} requires a reference argument")),
    }
}

/// OFFSET: shift the anchor reference and read the resulting block
pub(crate) fn offset(
    ctx: &dyn Context,
    ev: &Evaluator,
    anchor: &Reference,
    args: &[Value],
) -> Value {
    let Some((sheet, range)) = parse_reference(anchor) else {
        return Value::value_error("OFFSET requires a reference argument");
    };
    if args.len() < 2 || args.len() > 4 {
        return Value::value_error("OFFSET requires two to four arguments");
    }
    let (rows, cols) = match (numeric(&args[0]), numeric(&args[1])) {
        (Ok(a), Ok(b)) => (a.trunc() as i64, b.trunc() as i64),
        (Err(e), _) | (_, Err(e)) => return e,
    };
    let height = match numeric_arg(args, 2, Some(range.row_count() as f64)) {
        Ok(n) => n.trunc() as i64,
        Err(e) => return e,
    };
    let width = match numeric_arg(args, 3, Some(range.col_count() as f64)) {
        Ok(n) => n.trunc() as i64,
        Err(e) => return e,
    };
    if height < 1 || width < 1 {
        return Value::value_error("OFFSET size below 1");
    }
    let start_row = range.start.row as i64 + rows;
    let start_col = range.start.col as i64 + cols;
    if start_row < 0 || start_col < 0 {
        return Value::error(ErrorKind::Ref, "OFFSET before the sheet origin");
    }
    let start = CellAddress::new(start_row as u32, start_col as u32);
    let end = CellAddress::new(
        (start_row + height - 1) as u32,
        (start_col + width - 1) as u32,
    );
    let target_ctx: &dyn Context = match &sheet {
        Some(name) => ctx.sheet(name),
        None => ctx,
    };
    eval_cell_range(target_ctx, ev, &start, &end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testctx::{eval, eval_with, SheetContext};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_vlookup() {
        assert_eq!(
            eval("=VLOOKUP(2,{1,\"a\";2,\"b\";3,\"c\"},2,FALSE)"),
            Value::string("b")
        );
        // Approximate match picks the last row not past the needle
        assert_eq!(
            eval("=VLOOKUP(2.5,{1,\"a\";2,\"b\";3,\"c\"},2)"),
            Value::string("b")
        );
        assert_eq!(
            eval("=VLOOKUP(9,{1,\"a\";2,\"b\"},3,FALSE)").error_kind(),
            Some(ErrorKind::Na)
        );
        assert_eq!(
            eval("=VLOOKUP(1,{1,\"a\"},3,FALSE)").error_kind(),
            Some(ErrorKind::Ref)
        );
        // Wildcards apply to exact text lookups
        assert_eq!(
            eval("=VLOOKUP(\"b*\",{\"apple\",1;\"banana\",2},2,FALSE)"),
            Value::number(2.0)
        );
    }

    #[test]
    fn test_hlookup() {
        assert_eq!(
            eval("=HLOOKUP(2,{1,2,3;\"a\",\"b\",\"c\"},2,FALSE)"),
            Value::string("b")
        );
        assert_eq!(
            eval("=HLOOKUP(9,{1,2;\"a\",\"b\"},2,FALSE)").error_kind(),
            Some(ErrorKind::Na)
        );
    }

    #[test]
    fn test_index() {
        assert_eq!(eval("=INDEX({1,2;3,4},2,1)"), Value::number(3.0));
        // Single index along a one-row shape
        assert_eq!(eval("=INDEX({5,6,7},2)"), Value::number(6.0));
        // Single index down a one-column shape
        assert_eq!(eval("=INDEX({5;6;7},3)"), Value::number(7.0));
        assert_eq!(
            eval("=INDEX({1,2;3,4},5,1)").error_kind(),
            Some(ErrorKind::Ref)
        );
    }

    #[test]
    fn test_match() {
        assert_eq!(eval("=MATCH(2,{1,2,3},0)"), Value::number(2.0));
        assert_eq!(eval("=MATCH(2.5,{1,2,3},1)"), Value::number(2.0));
        assert_eq!(eval("=MATCH(2.5,{3,2,1},-1)"), Value::number(1.0));
        assert_eq!(
            eval("=MATCH(\"b?n*\",{\"apple\",\"banana\"},0)"),
            Value::number(2.0)
        );
        assert_eq!(
            eval("=MATCH(9,{1,2},0)").error_kind(),
            Some(ErrorKind::Na)
        );
    }

    #[test]
    fn test_lookup_choose() {
        assert_eq!(
            eval("=LOOKUP(2.5,{1,2,3},{\"a\",\"b\",\"c\"})"),
            Value::string("b")
        );
        assert_eq!(eval("=CHOOSE(2,\"a\",\"b\",\"c\")"), Value::string("b"));
        assert_eq!(
            eval("=CHOOSE(4,\"a\",\"b\")").error_kind(),
            Some(ErrorKind::Value)
        );
    }

    #[test]
    fn test_rows_columns_transpose() {
        assert_eq!(eval("=ROWS({1,2;3,4;5,6})"), Value::number(3.0));
        assert_eq!(eval("=COLUMNS({1,2;3,4})"), Value::number(2.0));
        assert_eq!(
            eval("=TRANSPOSE({1,2;3,4})"),
            Value::Array(vec![
                vec![Value::number(1.0), Value::number(3.0)],
                vec![Value::number(2.0), Value::number(4.0)],
            ])
        );
    }

    #[test]
    fn test_row_column_functions() {
        assert_eq!(eval("=ROW(B7)"), Value::number(7.0));
        assert_eq!(eval("=COLUMN(B7)"), Value::number(2.0));
        assert_eq!(eval("=ROW(C3:D9)"), Value::number(3.0));
        assert_eq!(eval("=ROW(1)").error_kind(), Some(ErrorKind::Value));
    }

    #[test]
    fn test_indirect() {
        let mut ctx = SheetContext::new();
        ctx.set("B2", Value::number(42.0));
        assert_eq!(eval_with(&ctx, "=INDIRECT(\"B2\")"), Value::number(42.0));
        ctx.set("A1", Value::number(1.0));
        ctx.set("A2", Value::number(2.0));
        assert_eq!(
            eval_with(&ctx, "=SUM(INDIRECT(\"A1:A2\"))"),
            Value::number(3.0)
        );
        assert_eq!(
            eval_with(&ctx, "=INDIRECT(\"bogus!!\")").error_kind(),
            Some(ErrorKind::Ref)
        );
    }

    #[test]
    fn test_offset() {
        let mut ctx = SheetContext::new();
        ctx.set("B2", Value::number(10.0));
        ctx.set("B3", Value::number(20.0));
        ctx.set("C2", Value::number(30.0));
        assert_eq!(eval_with(&ctx, "=OFFSET(A1,1,1)"), Value::number(10.0));
        assert_eq!(
            eval_with(&ctx, "=SUM(OFFSET(A1,1,1,2,1))"),
            Value::number(30.0)
        );
        assert_eq!(
            eval_with(&ctx, "=OFFSET(A1,-1,0)").error_kind(),
            Some(ErrorKind::Ref)
        );
    }
}
