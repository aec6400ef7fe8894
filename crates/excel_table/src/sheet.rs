use calamine::{Data, Range};
use std::fmt;

use crate::cell::CellValue;

/// Zero-based position of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    pub row: u32,
    pub col: u32,
}

impl CellAddress {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for CellAddress {
    /// Renders the address in spreadsheet notation, e.g. `B14`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut letters = Vec::new();
        let mut col = u64::from(self.col) + 1;
        while col > 0 {
            let rem = (col - 1) % 26;
            letters.push((b'A' + rem as u8) as char);
            col = (col - 1) / 26;
        }
        let name: String = letters.into_iter().rev().collect();
        write!(f, "{}{}", name, u64::from(self.row) + 1)
    }
}

/// Inclusive rectangle of cells.
///
/// A table that could not be located has no range at all: every API returns
/// `Option<CellRangeAddress>` and `None` plays the role of the empty range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRangeAddress {
    first_row: u32,
    last_row: u32,
    first_col: u32,
    last_col: u32,
}

impl CellRangeAddress {
    /// Builds a range, swapping bounds given in the wrong order.
    pub fn new(first_row: u32, last_row: u32, first_col: u32, last_col: u32) -> Self {
        Self {
            first_row: first_row.min(last_row),
            last_row: first_row.max(last_row),
            first_col: first_col.min(last_col),
            last_col: first_col.max(last_col),
        }
    }

    pub fn first_row(&self) -> u32 {
        self.first_row
    }

    pub fn last_row(&self) -> u32 {
        self.last_row
    }

    pub fn first_col(&self) -> u32 {
        self.first_col
    }

    pub fn last_col(&self) -> u32 {
        self.last_col
    }

    pub fn contains(&self, address: CellAddress) -> bool {
        (self.first_row..=self.last_row).contains(&address.row)
            && (self.first_col..=self.last_col).contains(&address.col)
    }
}

/// Read-only view of a loaded worksheet.
///
/// Loading workbooks is the caller's job; the engine only reads cells.
pub trait Sheet {
    /// Bounds of the populated region, `None` for a sheet without cells.
    fn dimensions(&self) -> Option<CellRangeAddress>;

    /// Cell at an absolute position, `None` when the cell is not allocated.
    fn cell(&self, row: u32, col: u32) -> Option<CellValue>;

    /// Whether the row holds at least one cell with content.
    fn is_row_allocated(&self, row: u32) -> bool;

    /// Text of a cell, `None` unless the cell stores text.
    fn text(&self, row: u32, col: u32) -> Option<String> {
        match self.cell(row, col)? {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl Sheet for Range<Data> {
    fn dimensions(&self) -> Option<CellRangeAddress> {
        let (start, end) = (self.start()?, self.end()?);
        Some(CellRangeAddress::new(start.0, end.0, start.1, end.1))
    }

    fn cell(&self, row: u32, col: u32) -> Option<CellValue> {
        self.get_value((row, col)).map(CellValue::from)
    }

    fn is_row_allocated(&self, row: u32) -> bool {
        let Some(bounds) = self.dimensions() else {
            return false;
        };
        if row < bounds.first_row() || row > bounds.last_row() {
            return false;
        }
        (bounds.first_col()..=bounds.last_col())
            .any(|col| !matches!(self.get_value((row, col)), None | Some(Data::Empty)))
    }
}
