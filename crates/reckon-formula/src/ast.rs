//! Formula expression tree
//!
//! [`Expr`] is the closed set of node shapes a parsed formula can take. Every
//! variant supports the same four operations: evaluation, reference
//! classification, formula-text reconstruction (`Display`), and structural
//! updating after a row or column removal. Expressions are immutable; a tree
//! is built once per formula text and can be re-evaluated freely.

use crate::context::Context;
use crate::evaluator::Evaluator;
use crate::reference::{quote_sheet_name, split_sheet_prefix, Reference};
use crate::value::{broadcast_binary, compare, format_number, loose_eq, Value};
use reckon_core::{column_from_letters, column_to_letters, CellAddress, CellRange, ErrorKind};
use std::fmt;

/// Binary operators in precedence order (see [`BinaryOp::precedence`])
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
            BinaryOp::Concat => "&",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }

    /// Binding strength; higher binds tighter
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Pow => 5,
            BinaryOp::Mul | BinaryOp::Div => 4,
            BinaryOp::Add | BinaryOp::Sub => 3,
            BinaryOp::Concat => 2,
            _ => 1,
        }
    }
}

/// The kind of structural change applied to a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    RemoveColumn,
    RemoveRow,
}

/// Describes a row/column removal so formulas can rewrite their references
#[derive(Debug, Clone)]
pub struct UpdateQuery {
    pub op: UpdateOp,
    /// Removed row or column index, 0-based
    pub index: u32,
    /// Name of the sheet the removal happened on
    pub sheet: String,
    /// Whether unprefixed references in the expression live on that sheet
    pub update_current_sheet: bool,
}

/// A parsed formula expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// TRUE or FALSE literal
    Bool(bool),
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// Error literal such as `#REF!`
    Error(ErrorKind),
    /// Empty expression (missing function argument)
    Empty,
    /// Single cell reference
    CellRef(CellAddress),
    /// Named range reference
    NamedRange(String),
    /// Rectangular range `A1:B4`
    Range { start: CellAddress, end: CellAddress },
    /// Full-row range `1:4` (0-based bounds)
    HorizontalRange { start_row: u32, end_row: u32 },
    /// Full-column range `AA:IJ` (0-based bounds)
    VerticalRange { start_col: u32, end_col: u32 },
    /// Constant array `{1,2;3,4}`, row-major
    ConstArray(Vec<Vec<Expr>>),
    /// Unary minus
    Negate(Box<Expr>),
    /// Binary operation
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Function call
    FunctionCall { name: String, args: Vec<Expr> },
    /// Sheet-qualified reference, e.g. `'Sheet 1'!A1:B4`
    Prefix { sheet: String, inner: Box<Expr> },
}

impl Expr {
    /// Evaluate the expression against a sheet context
    pub fn eval(&self, ctx: &dyn Context, ev: &Evaluator) -> Value {
        match self {
            Expr::Bool(b) => Value::boolean(*b),
            Expr::Number(n) => Value::number(*n),
            Expr::String(s) => Value::string(s.clone()),
            Expr::Error(kind) => Value::error(*kind, kind.code()),
            Expr::Empty => Value::Empty,
            Expr::CellRef(addr) => ctx.cell(&plain_a1(addr), ev),
            Expr::NamedRange(name) => eval_named_range(ctx, ev, name),
            Expr::Range { start, end } => {
                let key = plain_range_key(start, end);
                eval_range_cached(ctx, ev, key, start, end)
            }
            Expr::HorizontalRange { start_row, end_row } => {
                eval_horizontal_range(ctx, ev, *start_row, *end_row)
            }
            Expr::VerticalRange { start_col, end_col } => {
                eval_vertical_range(ctx, ev, *start_col, *end_col, None)
            }
            Expr::ConstArray(rows) => Value::Array(
                rows.iter()
                    .map(|row| row.iter().map(|e| e.eval(ctx, ev)).collect())
                    .collect(),
            ),
            Expr::Negate(inner) => {
                let v = inner.eval(ctx, ev);
                if v.is_error() {
                    return v;
                }
                match v.as_number() {
                    Value::Number { value, .. } => Value::number(-value),
                    _ => Value::value_error("unary minus expects a number"),
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                let left = lhs.eval(ctx, ev);
                if left.is_error() {
                    return left;
                }
                let right = rhs.eval(ctx, ev);
                if right.is_error() {
                    return right;
                }
                broadcast_binary(&left, &right, |a, b| scalar_binary(*op, a, b))
            }
            Expr::FunctionCall { name, args } => eval_function_call(ctx, ev, name, args),
            Expr::Prefix { sheet, inner } => eval_prefixed(ctx, ev, sheet, inner),
        }
    }

    /// What this expression refers to, if anything
    pub fn reference(&self) -> Reference {
        match self {
            Expr::CellRef(addr) => Reference::Cell(addr.to_a1_string()),
            Expr::NamedRange(name) => Reference::Named(name.clone()),
            Expr::Range { start, end } => {
                Reference::Range(format!("{}:{}", start.to_a1_string(), end.to_a1_string()))
            }
            Expr::HorizontalRange { start_row, end_row } => {
                Reference::HorizontalRange(format!("{}:{}", start_row + 1, end_row + 1))
            }
            Expr::VerticalRange { start_col, end_col } => Reference::VerticalRange(format!(
                "{}:{}",
                column_to_letters(*start_col),
                column_to_letters(*end_col)
            )),
            Expr::Prefix { sheet, inner } => {
                let prefix = quote_sheet_name(sheet);
                match inner.reference() {
                    Reference::Invalid => Reference::Invalid,
                    Reference::Cell(s) => Reference::Cell(format!("{prefix}!{s}")),
                    Reference::Range(s) => Reference::Range(format!("{prefix}!{s}")),
                    Reference::HorizontalRange(s) => {
                        Reference::HorizontalRange(format!("{prefix}!{s}"))
                    }
                    Reference::VerticalRange(s) => {
                        Reference::VerticalRange(format!("{prefix}!{s}"))
                    }
                    Reference::Named(s) => Reference::Named(format!("{prefix}!{s}")),
                    Reference::Sheet(s) => Reference::Sheet(s),
                }
            }
            _ => Reference::Invalid,
        }
    }

    /// Rewrite references after a row or column removal. References that
    /// pointed at the removed index become `#REF!` error literals; ranges
    /// spanning it shrink.
    pub fn update(&self, q: &UpdateQuery) -> Expr {
        match self {
            Expr::CellRef(addr) => {
                if !q.update_current_sheet {
                    return self.clone();
                }
                match shift_address(addr, q) {
                    Some(new_addr) => Expr::CellRef(new_addr),
                    None => Expr::Error(ErrorKind::Ref),
                }
            }
            Expr::Range { start, end } => {
                if !q.update_current_sheet {
                    return self.clone();
                }
                match shift_span(start, end, q) {
                    Some((new_start, new_end)) => Expr::Range {
                        start: new_start,
                        end: new_end,
                    },
                    None => Expr::Error(ErrorKind::Ref),
                }
            }
            Expr::HorizontalRange { start_row, end_row } => {
                if !q.update_current_sheet || q.op != UpdateOp::RemoveRow {
                    return self.clone();
                }
                match shift_interval(*start_row, *end_row, q.index) {
                    Some((s, e)) => Expr::HorizontalRange {
                        start_row: s,
                        end_row: e,
                    },
                    None => Expr::Error(ErrorKind::Ref),
                }
            }
            Expr::VerticalRange { start_col, end_col } => {
                if !q.update_current_sheet || q.op != UpdateOp::RemoveColumn {
                    return self.clone();
                }
                match shift_interval(*start_col, *end_col, q.index) {
                    Some((s, e)) => Expr::VerticalRange {
                        start_col: s,
                        end_col: e,
                    },
                    None => Expr::Error(ErrorKind::Ref),
                }
            }
            Expr::ConstArray(rows) => Expr::ConstArray(
                rows.iter()
                    .map(|row| row.iter().map(|e| e.update(q)).collect())
                    .collect(),
            ),
            Expr::Negate(inner) => Expr::Negate(Box::new(inner.update(q))),
            Expr::Binary { op, lhs, rhs } => Expr::Binary {
                op: *op,
                lhs: Box::new(lhs.update(q)),
                rhs: Box::new(rhs.update(q)),
            },
            Expr::FunctionCall { name, args } => Expr::FunctionCall {
                name: name.clone(),
                args: args.iter().map(|e| e.update(q)).collect(),
            },
            Expr::Prefix { sheet, inner } => {
                let inner_query = UpdateQuery {
                    update_current_sheet: sheet.eq_ignore_ascii_case(&q.sheet),
                    ..q.clone()
                };
                Expr::Prefix {
                    sheet: sheet.clone(),
                    inner: Box::new(inner.update(&inner_query)),
                }
            }
            _ => self.clone(),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary { op, .. } => op.precedence(),
            _ => u8::MAX,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Expr::Number(n) => write!(f, "{}", format_number(*n)),
            Expr::String(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            Expr::Error(kind) => write!(f, "{}", kind.code()),
            Expr::Empty => Ok(()),
            Expr::CellRef(addr) => write!(f, "{addr}"),
            Expr::NamedRange(name) => write!(f, "{name}"),
            Expr::Range { start, end } => write!(f, "{start}:{end}"),
            Expr::HorizontalRange { start_row, end_row } => {
                write!(f, "{}:{}", start_row + 1, end_row + 1)
            }
            Expr::VerticalRange { start_col, end_col } => write!(
                f,
                "{}:{}",
                column_to_letters(*start_col),
                column_to_letters(*end_col)
            ),
            Expr::ConstArray(rows) => {
                write!(f, "{{")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        write!(f, ";")?;
                    }
                    for (j, item) in row.iter().enumerate() {
                        if j > 0 {
                            write!(f, ",")?;
                        }
                        write!(f, "{item}")?;
                    }
                }
                write!(f, "}}")
            }
            Expr::Negate(inner) => {
                if matches!(**inner, Expr::Binary { .. }) {
                    write!(f, "-({inner})")
                } else {
                    write!(f, "-{inner}")
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                // Parenthesize children that bind looser than this node so
                // the printed text re-parses to the same tree. `^` is
                // right-associative, so a `^` left child needs parens too.
                let lhs_needs_parens = lhs.precedence() < op.precedence()
                    || (*op == BinaryOp::Pow && lhs.precedence() == op.precedence());
                if lhs_needs_parens {
                    write!(f, "({lhs})")?;
                } else {
                    write!(f, "{lhs}")?;
                }
                write!(f, "{}", op.symbol())?;
                if rhs.precedence() <= op.precedence() && matches!(**rhs, Expr::Binary { .. }) {
                    write!(f, "({rhs})")
                } else {
                    write!(f, "{rhs}")
                }
            }
            Expr::FunctionCall { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Expr::Prefix { sheet, inner } => {
                write!(f, "{}!{inner}", quote_sheet_name(sheet))
            }
        }
    }
}

/// A1 text without absolute markers; the form used for Context lookups and
/// cache keys.
fn plain_a1(addr: &CellAddress) -> String {
    CellAddress::new(addr.row, addr.col).to_a1_string()
}

fn plain_range_key(start: &CellAddress, end: &CellAddress) -> String {
    format!("{}:{}", plain_a1(start), plain_a1(end))
}

/// Evaluate a rectangular cell block and collapse its shape: 1x1 becomes the
/// scalar itself, a single row becomes a List, anything taller an Array.
pub(crate) fn eval_cell_range(
    ctx: &dyn Context,
    ev: &Evaluator,
    start: &CellAddress,
    end: &CellAddress,
) -> Value {
    let (row_from, row_to) = (start.row.min(end.row), start.row.max(end.row));
    let (col_from, col_to) = (start.col.min(end.col), start.col.max(end.col));

    if row_from == row_to && col_from == col_to {
        return ctx.cell(&plain_a1(&CellAddress::new(row_from, col_from)), ev);
    }
    if row_from == row_to {
        let row = (col_from..=col_to)
            .map(|col| ctx.cell(&plain_a1(&CellAddress::new(row_from, col)), ev))
            .collect();
        return Value::List(row);
    }
    let rows = (row_from..=row_to)
        .map(|row| {
            (col_from..=col_to)
                .map(|col| ctx.cell(&plain_a1(&CellAddress::new(row, col)), ev))
                .collect()
        })
        .collect();
    Value::Array(rows)
}

fn eval_range_cached(
    ctx: &dyn Context,
    ev: &Evaluator,
    key: String,
    start: &CellAddress,
    end: &CellAddress,
) -> Value {
    if let Some(hit) = ev.cached(&key) {
        return hit;
    }
    let result = eval_cell_range(ctx, ev, start, end);
    ev.store_cached(&key, result.clone());
    result
}

fn eval_horizontal_range(ctx: &dyn Context, ev: &Evaluator, start_row: u32, end_row: u32) -> Value {
    let last = ctx.last_column(start_row, end_row);
    let end_col = match column_from_letters(&last) {
        Ok(col) => col,
        Err(_) => return Value::error(ErrorKind::Ref, "sheet has no populated columns"),
    };
    eval_cell_range(
        ctx,
        ev,
        &CellAddress::new(start_row, 0),
        &CellAddress::new(end_row, end_col),
    )
}

/// Evaluate a full-column range, bounding it by the sheet's last populated
/// row. `cache_key` is set for sheet-prefixed ranges, which memoize.
fn eval_vertical_range(
    ctx: &dyn Context,
    ev: &Evaluator,
    start_col: u32,
    end_col: u32,
    cache_key: Option<String>,
) -> Value {
    if let Some(key) = &cache_key {
        if let Some(hit) = ev.cached(key) {
            return hit;
        }
    }
    let end_row = ctx.last_row(&column_to_letters(start_col));
    let result = eval_cell_range(
        ctx,
        ev,
        &CellAddress::new(0, start_col),
        &CellAddress::new(end_row, end_col),
    );
    if let Some(key) = cache_key {
        ev.store_cached(&key, result.clone());
    }
    result
}

fn eval_named_range(ctx: &dyn Context, ev: &Evaluator, name: &str) -> Value {
    let target = ctx.named_range(name);
    if !target.is_valid() {
        return Value::error(ErrorKind::Name, format!("unknown name {name}"));
    }
    let key = target.value().to_string();
    let (sheet_ctx, addr_part): (&dyn Context, &str) = match split_sheet_prefix(&key) {
        Some((sheet, rest)) => (ctx.sheet(&sheet), rest),
        None => (ctx, key.as_str()),
    };
    let clean = addr_part.replace('$', "");
    if clean.contains(':') {
        if let Some(hit) = ev.cached(&key) {
            return hit;
        }
        match CellRange::parse(&clean) {
            Ok(range) => {
                let result = eval_cell_range(sheet_ctx, ev, &range.start, &range.end);
                ev.store_cached(&key, result.clone());
                result
            }
            Err(_) => Value::error(ErrorKind::Name, format!("name {name} is not a range")),
        }
    } else {
        sheet_ctx.cell(&clean, ev)
    }
}

fn eval_prefixed(ctx: &dyn Context, ev: &Evaluator, sheet: &str, inner: &Expr) -> Value {
    let sheet_ctx = ctx.sheet(sheet);
    match inner {
        Expr::Range { start, end } => {
            let key = format!("{}!{}", quote_sheet_name(sheet), plain_range_key(start, end));
            eval_range_cached(sheet_ctx, ev, key, start, end)
        }
        Expr::VerticalRange { start_col, end_col } => {
            let key = format!(
                "{}!{}:{}",
                quote_sheet_name(sheet),
                column_to_letters(*start_col),
                column_to_letters(*end_col)
            );
            eval_vertical_range(sheet_ctx, ev, *start_col, *end_col, Some(key))
        }
        _ => inner.eval(sheet_ctx, ev),
    }
}

fn scalar_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Pow => {
            let (a, b) = match (lhs.as_number(), rhs.as_number()) {
                (Value::Number { value: a, .. }, Value::Number { value: b, .. }) => (a, b),
                _ => return Value::value_error("operands must be numbers"),
            };
            match op {
                BinaryOp::Add => Value::number(a + b),
                BinaryOp::Sub => Value::number(a - b),
                BinaryOp::Mul => Value::number(a * b),
                BinaryOp::Div => {
                    if b == 0.0 {
                        Value::error(ErrorKind::DivideByZero, "division by zero")
                    } else {
                        Value::number(a / b)
                    }
                }
                BinaryOp::Pow => {
                    let result = a.powf(b);
                    if result.is_nan() || result.is_infinite() {
                        Value::error(ErrorKind::Num, "invalid exponentiation")
                    } else {
                        Value::number(result)
                    }
                }
                _ => unreachable!(),
            }
        }
        BinaryOp::Concat => Value::String(lhs.text() + &rhs.text()),
        BinaryOp::Eq => Value::boolean(loose_eq(lhs, rhs)),
        BinaryOp::Ne => Value::boolean(!loose_eq(lhs, rhs)),
        BinaryOp::Lt => Value::boolean(compare(lhs, rhs).is_lt()),
        BinaryOp::Le => Value::boolean(compare(lhs, rhs).is_le()),
        BinaryOp::Gt => Value::boolean(compare(lhs, rhs).is_gt()),
        BinaryOp::Ge => Value::boolean(compare(lhs, rhs).is_ge()),
    }
}

fn eval_function_call(ctx: &dyn Context, ev: &Evaluator, name: &str, args: &[Expr]) -> Value {
    // Reference-sensitive functions are answered from the argument's static
    // shape rather than its evaluated value.
    match name {
        "ISREF" => {
            if args.len() != 1 {
                return Value::value_error("ISREF requires one argument");
            }
            return Value::boolean(is_reference_arg(&args[0], ctx, ev));
        }
        "ROW" | "COLUMN" => {
            let reference = match args.first() {
                Some(arg) => arg.reference(),
                None => Reference::Invalid,
            };
            return crate::functions::lookup::row_or_column(name, &reference);
        }
        "CELL" => {
            let info = match args.first() {
                Some(arg) => arg.eval(ctx, ev),
                None => return Value::value_error("CELL requires an info type"),
            };
            let reference = match args.get(1) {
                Some(arg) => arg.reference(),
                None => Reference::Invalid,
            };
            let target = args.get(1).map(|arg| arg.eval(ctx, ev));
            return crate::functions::info::cell_info(ctx, &info, &reference, target.as_ref());
        }
        "ISFORMULA" => {
            let reference = match args.first() {
                Some(arg) => arg.reference(),
                None => Reference::Invalid,
            };
            return crate::functions::info::is_formula(ctx, &reference);
        }
        "OFFSET" => {
            let anchor = match args.first() {
                Some(arg) => arg.reference(),
                None => Reference::Invalid,
            };
            let rest: Vec<Value> = args.iter().skip(1).map(|a| a.eval(ctx, ev)).collect();
            return crate::functions::lookup::offset(ctx, ev, &anchor, &rest);
        }
        _ => {}
    }

    let registry = ev.registry();
    if let Some(f) = registry.simple(name) {
        let values: Vec<Value> = args.iter().map(|a| a.eval(ctx, ev)).collect();
        return f(&values);
    }
    if let Some(f) = registry.complex(name) {
        let values: Vec<Value> = args.iter().map(|a| a.eval(ctx, ev)).collect();
        return f(ctx, ev, &values);
    }
    Value::error(ErrorKind::Name, format!("unknown function {name}"))
}

/// ISREF classification: the argument must be reference-shaped, and
/// evaluating it must succeed.
fn is_reference_arg(expr: &Expr, ctx: &dyn Context, ev: &Evaluator) -> bool {
    if !expr.reference().is_valid() {
        return false;
    }
    !expr.eval(ctx, ev).is_error()
}

fn shift_address(addr: &CellAddress, q: &UpdateQuery) -> Option<CellAddress> {
    let mut out = *addr;
    match q.op {
        UpdateOp::RemoveColumn => {
            if addr.col == q.index {
                return None;
            }
            if addr.col > q.index {
                out.col -= 1;
            }
        }
        UpdateOp::RemoveRow => {
            if addr.row == q.index {
                return None;
            }
            if addr.row > q.index {
                out.row -= 1;
            }
        }
    }
    Some(out)
}

/// Shift a range across a removal: endpoints past the removed index slide
/// down, a removal inside the range shrinks it, and a range that was exactly
/// the removed row/column collapses to None.
fn shift_span(
    start: &CellAddress,
    end: &CellAddress,
    q: &UpdateQuery,
) -> Option<(CellAddress, CellAddress)> {
    let (mut s, mut e) = (*start, *end);
    match q.op {
        UpdateOp::RemoveColumn => {
            let (lo, hi) = (start.col.min(end.col), start.col.max(end.col));
            let (lo, hi) = shift_interval(lo, hi, q.index)?;
            s.col = lo;
            e.col = hi;
        }
        UpdateOp::RemoveRow => {
            let (lo, hi) = (start.row.min(end.row), start.row.max(end.row));
            let (lo, hi) = shift_interval(lo, hi, q.index)?;
            s.row = lo;
            e.row = hi;
        }
    }
    Some((s, e))
}

fn shift_interval(lo: u32, hi: u32, removed: u32) -> Option<(u32, u32)> {
    if removed < lo {
        Some((lo - 1, hi - 1))
    } else if removed <= hi {
        if lo == hi {
            None
        } else {
            Some((lo, hi - 1))
        }
    } else {
        Some((lo, hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn expr(text: &str) -> Expr {
        parse(text).unwrap()
    }

    #[test]
    fn test_display_round_trip() {
        for text in [
            "1+2*3",
            "(1+2)*3",
            "-(1+2)",
            "2^3^4",
            "\"a\"\"b\"&C3",
            "SUM(A1:B4,1)",
            "'My Sheet'!A1:B4",
            "Sheet1!$A$1",
            "{1,2;3,4}",
            "1:4",
            "AA:IJ",
            "A1>=B2",
            "Rate*2",
        ] {
            let parsed = expr(text);
            let printed = parsed.to_string();
            assert_eq!(expr(&printed), parsed, "round-tripping {text}");
        }
    }

    #[test]
    fn test_reference_classification() {
        assert_eq!(expr("B2").reference(), Reference::Cell("B2".into()));
        assert_eq!(expr("$B$2").reference(), Reference::Cell("$B$2".into()));
        assert_eq!(expr("A1:C4").reference(), Reference::Range("A1:C4".into()));
        assert_eq!(
            expr("'Sheet 1'!A2:A6").reference(),
            Reference::Range("'Sheet 1'!A2:A6".into())
        );
        assert_eq!(
            expr("1:4").reference(),
            Reference::HorizontalRange("1:4".into())
        );
        assert_eq!(expr("1+2").reference(), Reference::Invalid);
        assert_eq!(expr("SUM(A1)").reference(), Reference::Invalid);
    }

    #[test]
    fn test_update_cell_after_column_removal() {
        let q = UpdateQuery {
            op: UpdateOp::RemoveColumn,
            index: 1, // column B
            sheet: "Sheet1".into(),
            update_current_sheet: true,
        };
        assert_eq!(expr("C1").update(&q), expr("B1"));
        assert_eq!(expr("A1").update(&q), expr("A1"));
        assert_eq!(expr("B1").update(&q), Expr::Error(ErrorKind::Ref));
    }

    #[test]
    fn test_update_range_shrinks() {
        let q = UpdateQuery {
            op: UpdateOp::RemoveColumn,
            index: 1,
            sheet: "Sheet1".into(),
            update_current_sheet: true,
        };
        assert_eq!(expr("A1:C4").update(&q), expr("A1:B4"));
        assert_eq!(expr("C1:D4").update(&q), expr("B1:C4"));
        assert_eq!(expr("B1:B4").update(&q), Expr::Error(ErrorKind::Ref));
    }

    #[test]
    fn test_update_row_removal_recurses() {
        let q = UpdateQuery {
            op: UpdateOp::RemoveRow,
            index: 0,
            sheet: "Sheet1".into(),
            update_current_sheet: true,
        };
        assert_eq!(expr("SUM(A2:A5)+B3").update(&q), expr("SUM(A1:A4)+B2"));
        assert_eq!(expr("2:4").update(&q), expr("1:3"));
    }

    #[test]
    fn test_update_respects_sheet_prefix() {
        let q = UpdateQuery {
            op: UpdateOp::RemoveColumn,
            index: 0,
            sheet: "Other".into(),
            update_current_sheet: true,
        };
        // The prefix names a different sheet, so its reference is untouched
        assert_eq!(expr("Sheet1!B2").update(&q), expr("Sheet1!B2"));
        assert_eq!(expr("Other!B2").update(&q), expr("Other!A2"));
    }
}
