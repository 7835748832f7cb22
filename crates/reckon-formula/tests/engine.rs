//! End-to-end engine tests against an in-memory workbook context

use reckon_formula::{
    parse, Context, ErrorKind, Evaluator, InvalidReferenceContext, Reference, UpdateOp,
    UpdateQuery, Value,
};
use std::cell::Cell;
use std::collections::HashMap;

/// A small in-memory sheet implementing the `Context` contract, with a read
/// counter to observe the evaluator's range cache.
#[derive(Default)]
struct TestSheet {
    cells: HashMap<String, Value>,
    names: HashMap<String, Reference>,
    sheets: HashMap<String, Box<TestSheet>>,
    reads: Cell<usize>,
}

impl TestSheet {
    fn new() -> Self {
        Self::default()
    }

    fn set(&mut self, reference: &str, value: Value) {
        self.cells.insert(reference.to_uppercase(), value);
    }

    fn set_number(&mut self, reference: &str, n: f64) {
        self.set(reference, Value::number(n));
    }
}

impl Context for TestSheet {
    fn cell(&self, reference: &str, _evaluator: &Evaluator) -> Value {
        self.reads.set(self.reads.get() + 1);
        self.cells
            .get(&reference.replace('$', "").to_uppercase())
            .cloned()
            .unwrap_or(Value::Empty)
    }

    fn sheet(&self, name: &str) -> &dyn Context {
        match self.sheets.get(name) {
            Some(sheet) => &**sheet,
            None => &InvalidReferenceContext,
        }
    }

    fn last_column(&self, row_from: u32, row_to: u32) -> String {
        let mut max_col: Option<u32> = None;
        for key in self.cells.keys() {
            if let Ok(addr) = reckon_core::CellAddress::parse(key) {
                if addr.row >= row_from && addr.row <= row_to {
                    max_col = Some(max_col.map_or(addr.col, |c| c.max(addr.col)));
                }
            }
        }
        max_col.map(reckon_core::column_to_letters).unwrap_or_default()
    }

    fn last_row(&self, col: &str) -> u32 {
        let col_from = reckon_core::column_from_letters(col).unwrap_or(0);
        self.cells
            .keys()
            .filter_map(|key| reckon_core::CellAddress::parse(key).ok())
            .filter(|addr| addr.col >= col_from)
            .map(|addr| addr.row)
            .max()
            .unwrap_or(0)
    }

    fn named_range(&self, name: &str) -> Reference {
        self.names.get(name).cloned().unwrap_or(Reference::Invalid)
    }
}

fn eval(ctx: &TestSheet, formula: &str) -> Value {
    Evaluator::new().eval(ctx, formula)
}

#[test]
fn arithmetic_and_division_by_zero() {
    let ctx = TestSheet::new();
    assert_eq!(eval(&ctx, "=2+3"), Value::number(5.0));
    assert_eq!(eval(&ctx, "=7*6"), Value::number(42.0));
    assert_eq!(
        eval(&ctx, "=1/0").error_kind(),
        Some(ErrorKind::DivideByZero)
    );
    assert_eq!(
        eval(&ctx, "=5/(2-2)").error_kind(),
        Some(ErrorKind::DivideByZero)
    );
}

#[test]
fn end_to_end_sheet_reads() {
    let mut ctx = TestSheet::new();
    ctx.set_number("A1", 1.23);
    ctx.set_number("B1", 1.0);
    ctx.set_number("B2", 2.0);
    ctx.set_number("B3", 3.0);

    assert_eq!(eval(&ctx, "=SUM(B1:B3)"), Value::number(6.0));
    assert_eq!(eval(&ctx, "=A1+B2"), Value::number(3.23));
    assert_eq!(eval(&ctx, "=A1+B2").text(), "3.23");
    assert_eq!(eval(&ctx, "TRUE()"), Value::boolean(true));
    assert_eq!(eval(&ctx, "TRUE()").number_value(), Some(1.0));
    assert_eq!(eval(&ctx, "\"te\"\"st\""), Value::string("te\"st"));
}

#[test]
fn bare_reference_formula() {
    let mut ctx = TestSheet::new();
    ctx.set_number("C3", 9.0);
    // No leading '=' needed: a bare reference evaluates
    assert_eq!(eval(&ctx, "C3"), Value::number(9.0));
    assert_eq!(eval(&ctx, "1.5"), Value::number(1.5));
}

#[test]
fn parse_failure_is_a_value_error_result() {
    let ctx = TestSheet::new();
    let result = eval(&ctx, "=SUM(1,");
    assert_eq!(result.error_kind(), Some(ErrorKind::Value));
    assert_eq!(result.text(), "#VALUE!");
}

#[test]
fn range_cache_reads_each_cell_once() {
    let mut ctx = TestSheet::new();
    for row in 1..=100 {
        ctx.set_number(&format!("A{row}"), 1.0);
    }
    let evaluator = Evaluator::new();
    let result = evaluator.eval(&ctx, "=SUM(A1:A100)+SUM(A1:A100)");
    assert_eq!(result, Value::number(200.0));
    assert_eq!(ctx.reads.get(), 100);

    // A different range misses the cache, the same one keeps hitting it
    let result = evaluator.eval(&ctx, "=SUM(A1:A100)/COUNT(A1:A100)");
    assert_eq!(result, Value::number(1.0));
    assert_eq!(ctx.reads.get(), 100);
}

#[test]
fn broadcasting_scalar_over_array() {
    let ctx = TestSheet::new();
    let result = eval(&ctx, "={1,2;3,4}+10");
    assert_eq!(
        result,
        Value::Array(vec![
            vec![Value::number(11.0), Value::number(12.0)],
            vec![Value::number(13.0), Value::number(14.0)],
        ])
    );
    // Mismatched shapes fail with #VALUE!
    assert_eq!(
        eval(&ctx, "={1,2}+{1,2,3}").error_kind(),
        Some(ErrorKind::Value)
    );
}

#[test]
fn comparison_ordering_and_concat() {
    let ctx = TestSheet::new();
    assert_eq!(eval(&ctx, "=1<2"), Value::boolean(true));
    assert_eq!(eval(&ctx, "=\"a\"<\"B\""), Value::boolean(true));
    // Mixed types order Number < String
    assert_eq!(eval(&ctx, "=99<\"a\""), Value::boolean(true));
    // Empty equals 0 and "" under =
    assert_eq!(eval(&ctx, "=A1=0"), Value::boolean(true));
    assert_eq!(eval(&ctx, "=A1=\"\""), Value::boolean(true));
    assert_eq!(eval(&ctx, "=\"n=\"&(1+2)"), Value::string("n=3"));
}

#[test]
fn error_propagation_is_first_seen() {
    let mut ctx = TestSheet::new();
    ctx.set("A1", Value::error(ErrorKind::Na, "missing"));
    ctx.set("A2", Value::error(ErrorKind::Num, "bad"));
    assert_eq!(eval(&ctx, "=A1+A2").error_kind(), Some(ErrorKind::Na));
    assert_eq!(eval(&ctx, "=A2+A1").error_kind(), Some(ErrorKind::Num));
    assert_eq!(eval(&ctx, "=SUM(A1:A2)").error_kind(), Some(ErrorKind::Na));
}

#[test]
fn cross_sheet_references() {
    let mut data = TestSheet::new();
    data.set_number("A1", 10.0);
    data.set_number("A2", 20.0);
    let mut ctx = TestSheet::new();
    ctx.sheets.insert("Data".to_string(), Box::new(data));

    assert_eq!(eval(&ctx, "=Data!A1"), Value::number(10.0));
    assert_eq!(eval(&ctx, "=SUM(Data!A1:A2)"), Value::number(30.0));
    // Unknown sheets degrade to #REF! through InvalidReferenceContext
    assert_eq!(
        eval(&ctx, "=Missing!A1").error_kind(),
        Some(ErrorKind::Ref)
    );
}

#[test]
fn quoted_sheet_names() {
    let mut yearly = TestSheet::new();
    yearly.set_number("B2", 7.0);
    let mut ctx = TestSheet::new();
    ctx.sheets.insert("Sheet 1".to_string(), Box::new(yearly));
    assert_eq!(eval(&ctx, "='Sheet 1'!B2"), Value::number(7.0));
}

#[test]
fn named_ranges_resolve_and_cache() {
    let mut data = TestSheet::new();
    data.set_number("A1", 5.0);
    data.set_number("A2", 6.0);
    let mut ctx = TestSheet::new();
    ctx.sheets.insert("Data".to_string(), Box::new(data));
    ctx.names.insert(
        "Totals".to_string(),
        Reference::Range("Data!A1:A2".to_string()),
    );

    let evaluator = Evaluator::new();
    assert_eq!(evaluator.eval(&ctx, "=SUM(Totals)"), Value::number(11.0));
    assert_eq!(
        evaluator.eval(&ctx, "=SUM(Totals)+SUM(Totals)"),
        Value::number(22.0)
    );
    // Both later SUMs were served from the cache
    assert_eq!(ctx.sheets["Data"].reads.get(), 2);

    assert_eq!(
        evaluator.eval(&ctx, "=SUM(Undefined)").error_kind(),
        Some(ErrorKind::Name)
    );
}

#[test]
fn full_row_and_column_ranges() {
    let mut ctx = TestSheet::new();
    ctx.set_number("A1", 1.0);
    ctx.set_number("B1", 2.0);
    ctx.set_number("C2", 3.0);
    // 1:2 is bounded by the last populated column
    assert_eq!(eval(&ctx, "=SUM(1:2)"), Value::number(6.0));
    // A:C is bounded by the last populated row
    assert_eq!(eval(&ctx, "=SUM(A:C)"), Value::number(6.0));
}

#[test]
fn list_and_array_shapes_from_ranges() {
    let mut ctx = TestSheet::new();
    ctx.set_number("A1", 1.0);
    ctx.set_number("B1", 2.0);
    ctx.set_number("A2", 3.0);
    ctx.set_number("B2", 4.0);

    // A single row collapses to a List
    assert!(matches!(eval(&ctx, "=A1:B1"), Value::List(_)));
    // Multiple rows are a row-major Array
    assert!(matches!(eval(&ctx, "=A1:B2"), Value::Array(_)));
    // A 1x1 range degenerates to the scalar itself
    assert_eq!(eval(&ctx, "=A1:A1"), Value::number(1.0));
    // Lists and arrays render their first element
    assert_eq!(eval(&ctx, "=A1:B2").text(), "1");
}

#[test]
fn display_round_trip_preserves_semantics() {
    let mut ctx = TestSheet::new();
    ctx.set_number("A1", 2.0);
    ctx.set_number("A2", 3.0);
    for formula in [
        "=(1+2)*3",
        "=SUM(A1:A2)*2",
        "=IF(A1>1,\"big\",\"small\")",
        "='Sheet 1'!A1+1",
        "=-A1^2",
        "={1,2;3,4}",
    ] {
        let expr = parse(formula).unwrap();
        let reprinted = parse(&expr.to_string()).unwrap();
        assert_eq!(expr, reprinted, "round-tripping {formula}");
    }
}

#[test]
fn structural_update_rewrites_formula_text() {
    let expr = parse("=SUM(B1:D4)+E1").unwrap();
    let updated = expr.update(&UpdateQuery {
        op: UpdateOp::RemoveColumn,
        index: 2, // column C
        sheet: "Sheet1".to_string(),
        update_current_sheet: true,
    });
    assert_eq!(updated.to_string(), "SUM(B1:C4)+D1");

    let expr = parse("=C1*2").unwrap();
    let updated = expr.update(&UpdateQuery {
        op: UpdateOp::RemoveColumn,
        index: 2,
        sheet: "Sheet1".to_string(),
        update_current_sheet: true,
    });
    assert_eq!(updated.to_string(), "#REF!*2");
}

#[test]
fn evaluator_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Evaluator>();
}

#[test]
fn number_rendering_caps_significant_digits() {
    let ctx = TestSheet::new();
    assert_eq!(eval(&ctx, "=1/3").text(), "0.333333333333");
    assert_eq!(eval(&ctx, "=0.1+0.2").text(), "0.3");
    assert_eq!(eval(&ctx, "=10^6").text(), "1000000");
}

#[test]
fn nested_function_calls_reenter_the_tree() {
    let mut ctx = TestSheet::new();
    ctx.set_number("B1", 4.0);
    ctx.set_number("B2", 8.0);
    assert_eq!(
        eval(&ctx, "=IF(AND(B1>0,B2<100),SUM(B1:B2)/2,0)"),
        Value::number(6.0)
    );
    assert_eq!(
        eval(&ctx, "=VLOOKUP(8,B1:B2,1,FALSE)"),
        Value::number(8.0)
    );
}
