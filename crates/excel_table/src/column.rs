//! Header matching: mapping semantic columns to physical column indices.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::sheet::{CellRangeAddress, Sheet};

/// Header predicate of a table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableColumn {
    /// Header text contains every word, ignoring case and line breaks.
    Words(Vec<String>),
    /// First alternative that matches, in declaration order.
    AnyOf(Vec<TableColumn>),
    /// Composite header spread over stacked header rows. Each line is searched
    /// from the column matched by the previous one. A single header cell whose
    /// text lines match every line in order is accepted as well.
    MultiLine(Vec<TableColumn>),
    /// Fixed absolute column index.
    ConstantPosition(u32),
    /// First column of the table.
    LeftMost,
}

impl TableColumn {
    pub fn of(words: &[&str]) -> Self {
        TableColumn::Words(words.iter().map(|w| w.to_lowercase()).collect())
    }

    pub fn any_of(columns: Vec<TableColumn>) -> Self {
        TableColumn::AnyOf(columns)
    }

    pub fn multi_line(lines: Vec<TableColumn>) -> Self {
        TableColumn::MultiLine(lines)
    }

    /// Number of header rows the predicate reads.
    pub fn header_rows(&self) -> u32 {
        match self {
            TableColumn::MultiLine(lines) => lines.len() as u32,
            TableColumn::AnyOf(columns) => columns.iter().map(Self::header_rows).max().unwrap_or(1),
            _ => 1,
        }
    }

    /// Searches `header_row` between `first_col` and `last_col`.
    pub fn find(&self, sheet: &dyn Sheet, header_row: u32, first_col: u32, last_col: u32) -> Option<u32> {
        match self {
            TableColumn::Words(_) => (first_col..=last_col).find(|&col| {
                sheet
                    .text(header_row, col)
                    .is_some_and(|text| self.matches_text(&text))
            }),
            TableColumn::AnyOf(columns) => columns
                .iter()
                .find_map(|column| column.find(sheet, header_row, first_col, last_col)),
            TableColumn::MultiLine(lines) => {
                if lines.is_empty() {
                    return None;
                }
                let stacked = || {
                    let mut col = first_col;
                    for (line, row) in lines.iter().zip(header_row..) {
                        col = line.find(sheet, row, col, last_col)?;
                    }
                    Some(col)
                };
                stacked().or_else(|| {
                    (first_col..=last_col).find(|&col| {
                        sheet
                            .text(header_row, col)
                            .is_some_and(|text| lines_match(lines, &text))
                    })
                })
            }
            TableColumn::ConstantPosition(col) => Some(*col),
            TableColumn::LeftMost => Some(first_col),
        }
    }

    /// Whether a header text satisfies the predicate. Positional predicates
    /// never match text.
    fn matches_text(&self, text: &str) -> bool {
        match self {
            TableColumn::Words(words) => {
                let text = normalize_header(text);
                words.iter().all(|word| text.contains(&normalize_header(word)))
            }
            TableColumn::AnyOf(columns) => columns.iter().any(|column| column.matches_text(text)),
            TableColumn::MultiLine(lines) => lines_match(lines, text),
            TableColumn::ConstantPosition(_) | TableColumn::LeftMost => false,
        }
    }
}

/// Every predicate matches a later line of `text` than the previous one.
fn lines_match(lines: &[TableColumn], text: &str) -> bool {
    let mut text_lines = text.lines();
    lines
        .iter()
        .all(|line| text_lines.by_ref().any(|text_line| line.matches_text(text_line)))
}

fn normalize_header(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Closed set of columns of one table format, usually an enum.
pub trait TableColumnDescription: Copy + Eq + Hash + Debug + 'static {
    fn all() -> &'static [Self];

    fn column(&self) -> TableColumn;
}

/// Resolved column positions; `None` marks a column absent from the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIndices<D: TableColumnDescription> {
    indices: HashMap<D, Option<u32>>,
}

impl<D: TableColumnDescription> ColumnIndices<D> {
    pub fn empty() -> Self {
        Self { indices: HashMap::new() }
    }

    pub fn get(&self, column: D) -> Option<u32> {
        self.indices.get(&column).copied().flatten()
    }

    pub fn unresolved(&self) -> Vec<D> {
        D::all()
            .iter()
            .copied()
            .filter(|column| self.get(*column).is_none())
            .collect()
    }
}

/// Resolves every column of `D` against the row below the table title.
pub fn resolve<D: TableColumnDescription>(sheet: &dyn Sheet, range: &CellRangeAddress) -> ColumnIndices<D> {
    resolve_at(sheet, range, range.first_row().saturating_add(1))
}

/// Resolves every column of `D` against an explicit first header row.
pub fn resolve_at<D: TableColumnDescription>(
    sheet: &dyn Sheet,
    range: &CellRangeAddress,
    header_row: u32,
) -> ColumnIndices<D> {
    // merged header cells may reach past the last column of the table
    let last_col = sheet
        .dimensions()
        .map_or(range.last_col(), |bounds| bounds.last_col().max(range.last_col()));

    let indices = D::all()
        .iter()
        .map(|&description| {
            let index = description
                .column()
                .find(sheet, header_row, range.first_col(), last_col);
            if index.is_none() {
                tracing::debug!(column = ?description, header_row, "Header column not found");
            }
            (description, index)
        })
        .collect();
    ColumnIndices { indices }
}
