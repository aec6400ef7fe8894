//! Finding tables inside free-form report sheets.
//!
//! Broker reports do not declare where a table starts. A table is found by
//! its title text (the anchor); its header is the row below the title and its
//! end is either a footer text such as `Итого` or a configurable fallback.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::sheet::{CellAddress, CellRangeAddress, Sheet};

/// How anchor text is compared against trimmed cell text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorMatch {
    #[default]
    Exact,
    IgnoreCase,
    /// Cell text starts with the anchor.
    Prefix,
}

impl AnchorMatch {
    pub fn matches(self, cell_text: &str, anchor: &str) -> bool {
        let cell_text = cell_text.trim();
        match self {
            AnchorMatch::Exact => cell_text == anchor,
            AnchorMatch::IgnoreCase => cell_text.to_lowercase() == anchor.to_lowercase(),
            AnchorMatch::Prefix => cell_text.starts_with(anchor),
        }
    }
}

/// Whether the footer row is iterated as a data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FooterMode {
    /// Footer row closes the range but holds totals, not data.
    #[default]
    Exclusive,
    Inclusive,
}

/// Last row of a table located without a footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableEnd {
    /// Bottom of the populated sheet region.
    #[default]
    SheetBottom,
    /// Row before the first empty row following the header.
    FirstBlankRow,
    /// Fixed row supplied by the caller.
    Row(u32),
}

/// Last column of a located table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnExtent {
    /// Last non-blank header cell; trailing blank header cells are cut off.
    #[default]
    HeaderRow,
    SheetWidth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorOptions {
    pub anchor_match: AnchorMatch,
    pub footer_match: AnchorMatch,
    pub footer_mode: FooterMode,
    pub table_end: TableEnd,
    pub column_extent: ColumnExtent,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            anchor_match: AnchorMatch::Exact,
            footer_match: AnchorMatch::Prefix,
            footer_mode: FooterMode::Exclusive,
            table_end: TableEnd::SheetBottom,
            column_extent: ColumnExtent::HeaderRow,
        }
    }
}

/// Finds the first text cell matching `value`, scanning `rows` in row-major order.
pub fn find(
    sheet: &dyn Sheet,
    value: &str,
    rows: RangeInclusive<u32>,
    matching: AnchorMatch,
) -> Option<CellAddress> {
    let bounds = sheet.dimensions()?;
    let first = (*rows.start()).max(bounds.first_row());
    let last = (*rows.end()).min(bounds.last_row());
    (first..=last)
        .filter(|&row| sheet.is_row_allocated(row))
        .find_map(|row| {
            (bounds.first_col()..=bounds.last_col()).find_map(|col| {
                sheet
                    .text(row, col)
                    .filter(|text| matching.matches(text, value))
                    .map(|_| CellAddress::new(row, col))
            })
        })
}

/// Locates a table by its title cell. The header is expected on the next row.
///
/// Returns `None` when the title, or a requested footer, is absent.
pub fn locate(
    sheet: &dyn Sheet,
    table_name: &str,
    footer: Option<&str>,
    options: &LocatorOptions,
) -> Option<CellRangeAddress> {
    locate_anchored(sheet, table_name, footer, options, 1)
}

/// Locates a table without a title row by the text of its first header line.
pub fn locate_headed(
    sheet: &dyn Sheet,
    first_header_line: &str,
    footer: Option<&str>,
    options: &LocatorOptions,
) -> Option<CellRangeAddress> {
    locate_anchored(sheet, first_header_line, footer, options, 0)
}

fn locate_anchored(
    sheet: &dyn Sheet,
    anchor: &str,
    footer: Option<&str>,
    options: &LocatorOptions,
    header_offset: u32,
) -> Option<CellRangeAddress> {
    let bounds = sheet.dimensions()?;
    let start = find(
        sheet,
        anchor,
        bounds.first_row()..=bounds.last_row(),
        options.anchor_match,
    )?;
    let header_row = start.row.saturating_add(header_offset);

    let last_row = match footer {
        // the header may itself contain the footer word
        Some(footer) => {
            find(
                sheet,
                footer,
                header_row.saturating_add(1)..=bounds.last_row(),
                options.footer_match,
            )?
            .row
        }
        None => match options.table_end {
            TableEnd::SheetBottom => bounds.last_row(),
            TableEnd::FirstBlankRow => (header_row..=bounds.last_row())
                .find(|&row| !sheet.is_row_allocated(row))
                .map_or(bounds.last_row(), |blank| blank.saturating_sub(1)),
            TableEnd::Row(row) => row,
        },
    }
    .max(start.row);

    let last_col = match options.column_extent {
        ColumnExtent::HeaderRow => (start.col..=bounds.last_col())
            .rev()
            .find(|&col| {
                sheet
                    .cell(header_row, col)
                    .is_some_and(|cell| !cell.is_blank())
            })
            .unwrap_or(bounds.last_col()),
        ColumnExtent::SheetWidth => bounds.last_col(),
    }
    .max(start.col);

    tracing::debug!(
        anchor,
        first_row = start.row,
        last_row,
        first_col = start.col,
        last_col,
        "Located table"
    );
    Some(CellRangeAddress::new(start.row, last_row, start.col, last_col))
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{Data, Range};

    fn text(range: &mut Range<Data>, row: u32, col: u32, value: &str) {
        range.set_value((row, col), Data::String(value.to_string()));
    }

    /// Title at (2,1), header at row 3 with three columns, data rows 4..=6,
    /// footer at 7, a note at (9,0) and a stray cell at (5,6).
    fn report() -> Range<Data> {
        let mut range = Range::new((0, 0), (9, 6));
        text(&mut range, 0, 0, "Broker report");
        text(&mut range, 2, 1, "CASH");
        text(&mut range, 3, 1, "Date");
        text(&mut range, 3, 2, "Сумма");
        text(&mut range, 3, 3, "Currency");
        for row in 4..=6 {
            range.set_value((row, 2), Data::Float(row as f64));
        }
        range.set_value((5, 6), Data::Float(1.0));
        text(&mut range, 7, 1, "Итого по валюте");
        text(&mut range, 9, 0, "Signature");
        range
    }

    #[test]
    fn test_find_is_row_major() {
        let mut sheet = report();
        text(&mut sheet, 8, 0, "CASH");
        assert_eq!(
            find(&sheet, "CASH", 0..=9, AnchorMatch::Exact),
            Some(CellAddress::new(2, 1))
        );
        assert_eq!(
            find(&sheet, "CASH", 3..=9, AnchorMatch::Exact),
            Some(CellAddress::new(8, 0))
        );
    }

    #[test]
    fn test_anchor_matching_modes() {
        let sheet = report();
        assert_eq!(find(&sheet, "cash", 0..=9, AnchorMatch::Exact), None);
        assert_eq!(
            find(&sheet, "cash", 0..=9, AnchorMatch::IgnoreCase),
            Some(CellAddress::new(2, 1))
        );
        assert_eq!(find(&sheet, "Итого", 0..=9, AnchorMatch::Exact), None);
        assert_eq!(
            find(&sheet, "Итого", 0..=9, AnchorMatch::Prefix),
            Some(CellAddress::new(7, 1))
        );
    }

    #[test]
    fn test_locate_with_footer() {
        let sheet = report();
        let range = locate(&sheet, "CASH", Some("Итого"), &LocatorOptions::default()).unwrap();
        assert_eq!(range, CellRangeAddress::new(2, 7, 1, 3));
    }

    #[test]
    fn test_locate_missing_anchor_or_footer_is_none() {
        let sheet = report();
        let options = LocatorOptions::default();
        assert_eq!(locate(&sheet, "SECURITIES", None, &options), None);
        assert_eq!(locate(&sheet, "CASH", Some("Total"), &options), None);
        assert_eq!(locate(&Range::<Data>::empty(), "CASH", None, &options), None);
    }

    #[test]
    fn test_locate_without_footer_uses_table_end() {
        let sheet = report();
        let mut options = LocatorOptions::default();
        assert_eq!(locate(&sheet, "CASH", None, &options).unwrap().last_row(), 9);

        options.table_end = TableEnd::FirstBlankRow;
        assert_eq!(locate(&sheet, "CASH", None, &options).unwrap().last_row(), 7);

        options.table_end = TableEnd::Row(5);
        assert_eq!(locate(&sheet, "CASH", None, &options).unwrap().last_row(), 5);

        options.table_end = TableEnd::Row(0);
        assert_eq!(locate(&sheet, "CASH", None, &options).unwrap().last_row(), 2);
    }

    #[test]
    fn test_column_extent() {
        let sheet = report();
        let mut options = LocatorOptions::default();
        assert_eq!(locate(&sheet, "CASH", None, &options).unwrap().last_col(), 3);

        options.column_extent = ColumnExtent::SheetWidth;
        assert_eq!(locate(&sheet, "CASH", None, &options).unwrap().last_col(), 6);
    }

    #[test]
    fn test_blank_header_falls_back_to_sheet_width() {
        let sheet = report();
        let range = locate(&sheet, "Signature", None, &LocatorOptions::default()).unwrap();
        assert_eq!(range, CellRangeAddress::new(9, 9, 0, 6));
    }

    #[test]
    fn test_locate_headed_uses_anchor_row_as_header() {
        let sheet = report();
        let range = locate_headed(&sheet, "Date", Some("Итого"), &LocatorOptions::default()).unwrap();
        assert_eq!(range, CellRangeAddress::new(3, 7, 1, 3));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: LocatorOptions =
            serde_json::from_str(r#"{"anchor_match": "ignore_case", "table_end": {"row": 12}}"#).unwrap();
        assert_eq!(options.anchor_match, AnchorMatch::IgnoreCase);
        assert_eq!(options.footer_match, AnchorMatch::Prefix);
        assert_eq!(options.table_end, TableEnd::Row(12));
    }
}
