//! # reckon-core
//!
//! Addressing and error-code primitives shared by the reckon formula engine
//! and any surrounding workbook model:
//! - [`CellAddress`] and [`CellRange`] - A1-style cell addressing
//! - [`ErrorKind`] - the closed set of spreadsheet error codes
//!
//! ## Example
//!
//! ```rust
//! use reckon_core::{CellAddress, CellRange};
//!
//! let addr = CellAddress::parse("$B$2").unwrap();
//! assert_eq!(addr.to_a1_string(), "$B$2");
//!
//! let range = CellRange::parse("A1:C3").unwrap();
//! assert_eq!(range.cells().count(), 9);
//! ```

pub mod address;
pub mod error;

pub use address::{column_from_letters, column_to_letters, CellAddress, CellRange};
pub use error::{Error, ErrorKind, Result};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u32 = 16_384;
