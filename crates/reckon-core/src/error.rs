//! Error types shared across the reckon crates

use std::fmt;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when working with addresses and ranges
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Invalid cell range format
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),

    /// Row index out of bounds
    #[error("Row index {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    /// Column index out of bounds
    #[error("Column index {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(u32, u32),
}

/// Spreadsheet error codes as they appear in cells and formulas
/// (`#REF!`, `#VALUE!`, ...).
///
/// This is the closed set of codes a formula can produce or mention as a
/// literal. Display renders the canonical code text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// #NULL! - intersection of ranges that do not intersect
    Null,
    /// #VALUE! - wrong type of argument or operand
    Value,
    /// #REF! - reference to a deleted or invalid cell
    Ref,
    /// #NAME? - unrecognized function or defined name
    Name,
    /// #NUM! - invalid numeric value
    Num,
    /// #SPILL! - blocked dynamic array spill
    Spill,
    /// #N/A - value not available
    Na,
    /// #DIV/0! - division by zero
    DivideByZero,
}

impl ErrorKind {
    /// The canonical display code for this error
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Null => "#NULL!",
            ErrorKind::Value => "#VALUE!",
            ErrorKind::Ref => "#REF!",
            ErrorKind::Name => "#NAME?",
            ErrorKind::Num => "#NUM!",
            ErrorKind::Spill => "#SPILL!",
            ErrorKind::Na => "#N/A",
            ErrorKind::DivideByZero => "#DIV/0!",
        }
    }

    /// Parse an error literal as it appears in formula text
    pub fn from_literal(s: &str) -> Option<ErrorKind> {
        match s.to_ascii_uppercase().as_str() {
            "#NULL!" => Some(ErrorKind::Null),
            "#VALUE!" => Some(ErrorKind::Value),
            "#REF!" => Some(ErrorKind::Ref),
            "#NAME?" => Some(ErrorKind::Name),
            "#NUM!" => Some(ErrorKind::Num),
            "#SPILL!" => Some(ErrorKind::Spill),
            "#N/A" => Some(ErrorKind::Na),
            "#DIV/0!" => Some(ErrorKind::DivideByZero),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
