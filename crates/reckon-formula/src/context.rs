//! Evaluation context
//!
//! [`Context`] is everything the formula engine needs from the surrounding
//! workbook model, bound to one sheet. The engine never sees a concrete
//! workbook type; callers implement this trait over whatever storage they
//! have. Most methods have degenerate defaults so simple contexts only
//! implement what they use.

use crate::evaluator::Evaluator;
use crate::reference::Reference;
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime};
use reckon_core::ErrorKind;

/// The 1900 date-system epoch (serial 0 renders as 1899-12-31; the stored
/// epoch is a day earlier to absorb the phantom 1900 leap day).
pub fn epoch_1900() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Read access to one sheet of a workbook.
///
/// `cell` takes A1-style references without absolute markers. `sheet`
/// switches to a sibling sheet, returning [`InvalidReferenceContext`] when no
/// such sheet exists. The setter methods exist for workbook-side bookkeeping
/// (shared-formula offsets, protection flags); implementations typically use
/// interior mutability, and the engine itself never calls them during
/// evaluation.
pub trait Context {
    /// The value of the cell at `reference` (e.g. "B2")
    fn cell(&self, reference: &str, evaluator: &Evaluator) -> Value;

    /// The context of a sibling sheet
    fn sheet(&self, _name: &str) -> &dyn Context {
        &InvalidReferenceContext
    }

    /// The date-system epoch of the workbook
    fn epoch(&self) -> NaiveDateTime {
        epoch_1900()
    }

    /// The workbook's file name
    fn filename(&self) -> String {
        String::new()
    }

    /// Display width of a column
    fn width(&self, _col_idx: u32) -> f64 {
        0.0
    }

    /// Number format string applied to a cell
    fn format(&self, _cell_ref: &str) -> String {
        String::new()
    }

    /// Label prefix (alignment hint) of a cell
    fn label_prefix(&self, _cell_ref: &str) -> String {
        String::new()
    }

    /// Whether the cell is locked
    fn locked(&self, _cell_ref: &str) -> bool {
        false
    }

    /// Change a cell's locked flag
    fn set_locked(&self, _cell_ref: &str, _locked: bool) {}

    /// Whether the cell holds a formula
    fn has_formula(&self, _cell_ref: &str) -> bool {
        false
    }

    /// Whether the cell holds a boolean
    fn is_bool(&self, _cell_ref: &str) -> bool {
        false
    }

    /// Whether the workbook uses double-byte character sets
    fn is_dbcs(&self) -> bool {
        false
    }

    /// Letters of the last populated column within the given rows, or ""
    /// for an empty sheet
    fn last_column(&self, _row_from: u32, _row_to: u32) -> String {
        String::new()
    }

    /// 0-based index of the last populated row at and right of `col`
    fn last_row(&self, _col: &str) -> u32 {
        0
    }

    /// Resolve a defined name to the reference it stands for
    fn named_range(&self, _name: &str) -> Reference {
        Reference::Invalid
    }

    /// Shared-formula relative adjustment
    fn set_offset(&self, _col: u32, _row: u32) {}
}

/// The context used when a formula reaches for a sheet that does not exist:
/// every cell read is a `#REF!` error and every query returns its degenerate
/// default.
pub struct InvalidReferenceContext;

impl Context for InvalidReferenceContext {
    fn cell(&self, reference: &str, _evaluator: &Evaluator) -> Value {
        Value::error(ErrorKind::Ref, format!("invalid reference {reference}"))
    }
}
