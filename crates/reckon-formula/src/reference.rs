//! Reference classification
//!
//! [`Reference`] describes what a formula expression points at, carrying the
//! canonical display string (e.g. `'Sheet 1'!A2:A6`). It is used for formula
//! text reconstruction, as the key space of the evaluator's result cache, and
//! by functions that care whether an argument was a reference (`CELL`,
//! `ISREF`, `COLUMN`, `ROW`).

use std::fmt;

/// What an expression refers to, if anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// Not a reference
    Invalid,
    /// A single cell, e.g. `B2` or `Sheet1!B2`
    Cell(String),
    /// A rectangular range, e.g. `A1:C4`
    Range(String),
    /// A full-row range, e.g. `1:4`
    HorizontalRange(String),
    /// A full-column range, e.g. `AA:IJ`
    VerticalRange(String),
    /// A named range
    Named(String),
    /// A sheet name
    Sheet(String),
}

impl Reference {
    /// The canonical string, or "" for `Invalid`
    pub fn value(&self) -> &str {
        match self {
            Reference::Invalid => "",
            Reference::Cell(s)
            | Reference::Range(s)
            | Reference::HorizontalRange(s)
            | Reference::VerticalRange(s)
            | Reference::Named(s)
            | Reference::Sheet(s) => s,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Reference::Invalid)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Split a leading sheet prefix off a reference string, handling quoted
/// names: `'My Sheet'!A1` yields `("My Sheet", "A1")`, `Sheet1!A1:B4` yields
/// `("Sheet1", "A1:B4")`. Returns None when there is no prefix.
pub fn split_sheet_prefix(s: &str) -> Option<(String, &str)> {
    if let Some(rest) = s.strip_prefix('\'') {
        // Quoted name; '' is an escaped quote
        let mut name = String::new();
        let mut chars = rest.char_indices();
        while let Some((i, c)) = chars.next() {
            if c != '\'' {
                name.push(c);
                continue;
            }
            if rest[i + 1..].starts_with('\'') {
                name.push('\'');
                chars.next();
                continue;
            }
            return rest[i + 1..].strip_prefix('!').map(|tail| (name, tail));
        }
        None
    } else {
        let bang = s.find('!')?;
        Some((s[..bang].to_string(), &s[bang + 1..]))
    }
}

/// Quote a sheet name for display inside a reference if it needs quoting
/// (contains anything but alphanumerics and underscores).
pub fn quote_sheet_name(name: &str) -> String {
    let simple = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if simple {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}
