//! Map-backed [`Context`] used by unit tests

use crate::context::{Context, InvalidReferenceContext};
use crate::evaluator::Evaluator;
use crate::reference::Reference;
use crate::value::Value;
use ahash::AHashMap;
use reckon_core::{column_from_letters, column_to_letters, CellAddress};
use std::cell::Cell;

/// An in-memory sheet with optional sibling sheets, named ranges, and a
/// read counter for cache assertions.
#[derive(Default)]
pub(crate) struct SheetContext {
    cells: AHashMap<String, Value>,
    names: AHashMap<String, Reference>,
    formats: AHashMap<String, String>,
    sheets: AHashMap<String, Box<SheetContext>>,
    filename: String,
    reads: Cell<usize>,
}

impl SheetContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, reference: &str, value: Value) {
        self.cells.insert(reference.to_uppercase(), value);
    }

    pub fn define_name(&mut self, name: &str, target: Reference) {
        self.names.insert(name.to_string(), target);
    }

    pub fn set_format(&mut self, reference: &str, format: &str) {
        self.formats
            .insert(reference.to_uppercase(), format.to_string());
    }

    pub fn add_sheet(&mut self, name: &str, sheet: SheetContext) {
        self.sheets.insert(name.to_string(), Box::new(sheet));
    }

    pub fn with_filename(mut self, filename: &str) -> Self {
        self.filename = filename.to_string();
        self
    }

    /// Number of cell reads served so far
    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    fn populated(&self) -> impl Iterator<Item = CellAddress> + '_ {
        self.cells
            .keys()
            .filter_map(|key| CellAddress::parse(key).ok())
    }
}

impl Context for SheetContext {
    fn cell(&self, reference: &str, _evaluator: &Evaluator) -> Value {
        self.reads.set(self.reads.get() + 1);
        let key = reference.replace('$', "").to_uppercase();
        self.cells.get(&key).cloned().unwrap_or(Value::Empty)
    }

    fn sheet(&self, name: &str) -> &dyn Context {
        match self.sheets.get(name) {
            Some(sheet) => &**sheet,
            None => &InvalidReferenceContext,
        }
    }

    fn filename(&self) -> String {
        self.filename.clone()
    }

    fn format(&self, cell_ref: &str) -> String {
        self.formats
            .get(&cell_ref.replace('$', "").to_uppercase())
            .cloned()
            .unwrap_or_default()
    }

    fn has_formula(&self, cell_ref: &str) -> bool {
        // The test sheet stores no formula text; a string starting with '='
        // stands in for one
        matches!(
            self.cells.get(&cell_ref.to_uppercase()),
            Some(Value::String(s)) if s.starts_with('=')
        )
    }

    fn last_column(&self, row_from: u32, row_to: u32) -> String {
        self.populated()
            .filter(|a| a.row >= row_from && a.row <= row_to)
            .map(|a| a.col)
            .max()
            .map(column_to_letters)
            .unwrap_or_default()
    }

    fn last_row(&self, col: &str) -> u32 {
        let col_from = column_from_letters(col).unwrap_or(0);
        self.populated()
            .filter(|a| a.col >= col_from)
            .map(|a| a.row)
            .max()
            .unwrap_or(0)
    }

    fn named_range(&self, name: &str) -> Reference {
        self.names.get(name).cloned().unwrap_or(Reference::Invalid)
    }
}

/// Evaluate a formula against an empty sheet
pub(crate) fn eval(formula: &str) -> Value {
    Evaluator::new().eval(&SheetContext::new(), formula)
}

/// Evaluate a formula against the given sheet
pub(crate) fn eval_with(ctx: &SheetContext, formula: &str) -> Value {
    Evaluator::new().eval(ctx, formula)
}
