use rust_decimal::Decimal;
use std::fmt;

use crate::cell::{self, CellValue};
use crate::column::{self, ColumnIndices, TableColumnDescription};
use crate::error::ExtractError;
use crate::locator::{self, AnchorMatch, FooterMode, LocatorOptions};
use crate::sheet::{CellAddress, CellRangeAddress, Sheet};

/// Handle of a data row yielded by [`ExcelTable::rows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableRow {
    index: u32,
}

impl TableRow {
    /// Zero-based sheet row number.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn address(&self, col: u32) -> CellAddress {
        CellAddress::new(self.index, col)
    }
}

/// A located table together with its resolved columns.
///
/// Read-only projection over a borrowed sheet. A table whose title was not
/// found is empty: it has no range, no columns and no rows.
pub struct ExcelTable<'s, D: TableColumnDescription> {
    sheet: &'s dyn Sheet,
    table_name: String,
    range: Option<CellRangeAddress>,
    columns: ColumnIndices<D>,
    /// Offset of the first data row from the first table row.
    data_row_offset: u32,
    /// Last table row holds totals rather than data.
    last_row_is_totals: bool,
}

impl<'s, D: TableColumnDescription> ExcelTable<'s, D> {
    /// Table ending at the bottom of the sheet, without a totals row.
    pub fn of(sheet: &'s dyn Sheet, table_name: &str) -> Self {
        Self::with_options(sheet, table_name, None, &LocatorOptions::default())
    }

    /// Table closed by a footer row; the footer row is treated as totals.
    pub fn of_with_footer(sheet: &'s dyn Sheet, table_name: &str, footer: &str) -> Self {
        Self::with_options(sheet, table_name, Some(footer), &LocatorOptions::default())
    }

    pub fn with_options(
        sheet: &'s dyn Sheet,
        table_name: &str,
        footer: Option<&str>,
        options: &LocatorOptions,
    ) -> Self {
        let range = locator::locate(sheet, table_name, footer, options);
        let columns = range
            .map(|range| column::resolve(sheet, &range))
            .unwrap_or_else(ColumnIndices::empty);
        Self {
            sheet,
            table_name: table_name.to_string(),
            range,
            columns,
            data_row_offset: 2,
            last_row_is_totals: footer.is_some() && options.footer_mode == FooterMode::Exclusive,
        }
    }

    /// Table without a title row, found by the text of its first header line.
    ///
    /// Without a title cell there is no left edge: the table starts at the
    /// sheet's first column, so row labels left of the first header line
    /// belong to it. `table_name` only names the table in logs and errors.
    pub fn of_no_name(
        sheet: &'s dyn Sheet,
        table_name: &str,
        first_header_line: &str,
        footer: Option<&str>,
        headers_row_count: u32,
    ) -> Self {
        Self::of_no_name_with_options(
            sheet,
            table_name,
            first_header_line,
            footer,
            headers_row_count,
            &LocatorOptions::default(),
        )
    }

    pub fn of_no_name_with_options(
        sheet: &'s dyn Sheet,
        table_name: &str,
        first_header_line: &str,
        footer: Option<&str>,
        headers_row_count: u32,
        options: &LocatorOptions,
    ) -> Self {
        let range = locator::locate_headed(sheet, first_header_line, footer, options).map(|range| {
            let first_col = sheet
                .dimensions()
                .map_or(range.first_col(), |bounds| bounds.first_col());
            CellRangeAddress::new(range.first_row(), range.last_row(), first_col, range.last_col())
        });
        let columns = range
            .map(|range| column::resolve_at(sheet, &range, range.first_row()))
            .unwrap_or_else(ColumnIndices::empty);
        Self {
            sheet,
            table_name: table_name.to_string(),
            range,
            columns,
            data_row_offset: headers_row_count,
            last_row_is_totals: footer.is_some() && options.footer_mode == FooterMode::Exclusive,
        }
    }

    pub fn with_data_row_offset(mut self, data_row_offset: u32) -> Self {
        self.data_row_offset = data_row_offset;
        self
    }

    pub fn with_totals_row(mut self, last_row_is_totals: bool) -> Self {
        self.last_row_is_totals = last_row_is_totals;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_none()
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn range(&self) -> Option<CellRangeAddress> {
        self.range
    }

    pub fn sheet(&self) -> &'s dyn Sheet {
        self.sheet
    }

    pub fn columns(&self) -> &ColumnIndices<D> {
        &self.columns
    }

    /// Number of row indices the iterator walks, unallocated rows included.
    pub fn data_rows_count(&self) -> u32 {
        let Some(range) = self.range else {
            return 0;
        };
        let count = i64::from(range.last_row()) - i64::from(range.first_row())
            - i64::from(self.data_row_offset)
            + if self.last_row_is_totals { 0 } else { 1 };
        u32::try_from(count.max(0)).unwrap_or(0)
    }

    /// Fresh iterator over the data rows.
    pub fn rows(&self) -> TableRows<'s> {
        let first = self
            .range
            .map_or(0, |range| range.first_row().saturating_add(self.data_row_offset));
        TableRows {
            sheet: self.sheet,
            next_row: first,
            remaining: self.data_rows_count(),
        }
    }

    /// First table row with a cell starting with `text`, looking only at the
    /// columns of the table.
    pub fn find_row(&self, text: &str) -> Option<TableRow> {
        let range = self.range?;
        (range.first_row()..=range.last_row())
            .filter(|&row| self.sheet.is_row_allocated(row))
            .find(|&row| {
                (range.first_col()..=range.last_col()).any(|col| {
                    self.sheet
                        .text(row, col)
                        .is_some_and(|cell| AnchorMatch::Prefix.matches(&cell, text))
                })
            })
            .map(|index| TableRow { index })
    }

    pub fn column_index(&self, column: D) -> Result<u32, ExtractError> {
        self.columns
            .get(column)
            .ok_or_else(|| ExtractError::ColumnUnresolved {
                table: self.table_name.clone(),
                column: format!("{:?}", column),
            })
    }

    pub fn address(&self, row: &TableRow, column: D) -> Result<CellAddress, ExtractError> {
        Ok(row.address(self.column_index(column)?))
    }

    pub fn cell(&self, row: &TableRow, column: D) -> Result<Option<CellValue>, ExtractError> {
        let address = self.address(row, column)?;
        Ok(self.cell_at(address))
    }

    pub fn cell_at(&self, address: CellAddress) -> Option<CellValue> {
        self.sheet.cell(address.row, address.col)
    }

    pub fn long_value(&self, row: &TableRow, column: D) -> Result<i64, ExtractError> {
        self.long_value_at(self.address(row, column)?)
    }

    pub fn long_value_at(&self, address: CellAddress) -> Result<i64, ExtractError> {
        cell::as_integer(address, self.cell_at(address).as_ref())
    }

    pub fn int_value(&self, row: &TableRow, column: D) -> Result<i32, ExtractError> {
        self.int_value_at(self.address(row, column)?)
    }

    pub fn int_value_at(&self, address: CellAddress) -> Result<i32, ExtractError> {
        let value = self.long_value_at(address)?;
        i32::try_from(value).map_err(|_| ExtractError::MalformedCell {
            address,
            expected: "32-bit integer",
            found: "numeric",
        })
    }

    pub fn currency_value(&self, row: &TableRow, column: D) -> Result<Decimal, ExtractError> {
        self.currency_value_at(self.address(row, column)?)
    }

    pub fn currency_value_at(&self, address: CellAddress) -> Result<Decimal, ExtractError> {
        cell::as_currency(address, self.cell_at(address).as_ref())
    }

    pub fn string_value(&self, row: &TableRow, column: D) -> Result<String, ExtractError> {
        Ok(self.string_value_at(self.address(row, column)?))
    }

    pub fn string_value_at(&self, address: CellAddress) -> String {
        cell::as_text(self.cell_at(address).as_ref())
    }
}

impl<D: TableColumnDescription> fmt::Debug for ExcelTable<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExcelTable")
            .field("table_name", &self.table_name)
            .field("range", &self.range)
            .finish()
    }
}

/// Lazy, finite iterator over the data rows of one table.
///
/// Unallocated rows are skipped but still consume the row budget.
pub struct TableRows<'s> {
    sheet: &'s dyn Sheet,
    next_row: u32,
    remaining: u32,
}

impl Iterator for TableRows<'_> {
    type Item = TableRow;

    fn next(&mut self) -> Option<TableRow> {
        while self.remaining > 0 {
            let index = self.next_row;
            self.next_row = self.next_row.saturating_add(1);
            self.remaining -= 1;
            if self.sheet.is_row_allocated(index) {
                return Some(TableRow { index });
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::TableColumn;
    use calamine::{Data, Range};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Header {
        Quantity,
        Value,
        Ticker,
        Comment,
    }

    impl TableColumnDescription for Header {
        fn all() -> &'static [Self] {
            &[Header::Quantity, Header::Value, Header::Ticker, Header::Comment]
        }

        fn column(&self) -> TableColumn {
            match self {
                Header::Quantity => TableColumn::of(&["количество"]),
                Header::Value => TableColumn::of(&["сумма"]),
                Header::Ticker => TableColumn::of(&["тикер"]),
                Header::Comment => TableColumn::of(&["комментарий"]),
            }
        }
    }

    fn text(range: &mut Range<Data>, row: u32, col: u32, value: &str) {
        range.set_value((row, col), Data::String(value.to_string()));
    }

    /// Title at row 1, header at row 2, data at 3..=6 with 5 left empty,
    /// totals row at 7.
    fn sheet() -> Range<Data> {
        let mut range = Range::new((0, 0), (8, 3));
        text(&mut range, 1, 0, "SECURITIES");
        text(&mut range, 2, 0, "Тикер");
        text(&mut range, 2, 1, "Количество");
        text(&mut range, 2, 2, "Сумма");
        for (row, ticker, quantity, value) in [
            (3, "SBER", 10.0, 2500.5),
            (4, "GAZP", 7.9, -100.0),
            (6, "MOEX", 3.0, 0.004),
        ] {
            text(&mut range, row, 0, ticker);
            range.set_value((row, 1), Data::Float(quantity));
            range.set_value((row, 2), Data::Float(value));
        }
        text(&mut range, 7, 0, "Итого");
        range.set_value((7, 2), Data::Float(2400.504));
        range
    }

    fn indices(table: &ExcelTable<'_, Header>) -> Vec<u32> {
        table.rows().map(|row| row.index()).collect()
    }

    #[test]
    fn test_rows_skip_unallocated_and_totals() {
        let sheet = sheet();
        let table = ExcelTable::<Header>::of_with_footer(&sheet, "SECURITIES", "Итого");
        assert_eq!(table.range(), Some(CellRangeAddress::new(1, 7, 0, 2)));
        assert_eq!(table.data_rows_count(), 4);
        assert_eq!(indices(&table), vec![3, 4, 6]);
    }

    #[test]
    fn test_row_count_with_and_without_totals() {
        let sheet = sheet();
        let table = ExcelTable::<Header>::of_with_footer(&sheet, "SECURITIES", "Итого").with_totals_row(false);
        assert_eq!(table.data_rows_count(), 7 - 1 - 2 + 1);
        assert_eq!(indices(&table), vec![3, 4, 6, 7]);

        let table = table.with_totals_row(true);
        assert_eq!(table.data_rows_count(), 7 - 1 - 2);
    }

    #[test]
    fn test_footer_inclusive_mode_iterates_footer() {
        let sheet = sheet();
        let options = LocatorOptions {
            footer_mode: FooterMode::Inclusive,
            ..LocatorOptions::default()
        };
        let table = ExcelTable::<Header>::with_options(&sheet, "SECURITIES", Some("Итого"), &options);
        assert_eq!(indices(&table), vec![3, 4, 6, 7]);
    }

    #[test]
    fn test_rows_is_restartable() {
        let sheet = sheet();
        let table = ExcelTable::<Header>::of_with_footer(&sheet, "SECURITIES", "Итого");
        let mut first = table.rows();
        assert_eq!(first.next().map(|r| r.index()), Some(3));
        assert_eq!(indices(&table), vec![3, 4, 6]);
        assert_eq!(first.next().map(|r| r.index()), Some(4));
    }

    #[test]
    fn test_rows_budget_ends_on_unallocated_row() {
        let sheet = sheet();
        let table = ExcelTable::<Header>::of_with_footer(&sheet, "SECURITIES", "Итого").with_data_row_offset(4);
        // budget covers rows 5 and 6, row 5 is empty
        assert_eq!(table.data_rows_count(), 2);
        assert_eq!(indices(&table), vec![6]);

        let table = table.with_data_row_offset(10);
        assert_eq!(table.data_rows_count(), 0);
        assert!(indices(&table).is_empty());
    }

    #[test]
    fn test_missing_table_is_empty() {
        let sheet = sheet();
        let table = ExcelTable::<Header>::of(&sheet, "CASH");
        assert!(table.is_empty());
        assert_eq!(table.range(), None);
        assert_eq!(table.rows().count(), 0);
        assert_eq!(table.find_row("SBER"), None);
    }

    #[test]
    fn test_typed_accessors() {
        let sheet = sheet();
        let table = ExcelTable::<Header>::of_with_footer(&sheet, "SECURITIES", "Итого");
        let rows: Vec<TableRow> = table.rows().collect();

        assert_eq!(table.string_value(&rows[0], Header::Ticker).unwrap(), "SBER");
        assert_eq!(table.long_value(&rows[1], Header::Quantity).unwrap(), 7);
        assert_eq!(table.int_value(&rows[0], Header::Quantity).unwrap(), 10);
        assert_eq!(
            table.currency_value(&rows[0], Header::Value).unwrap(),
            Decimal::new(25005, 1)
        );
        assert_eq!(table.currency_value(&rows[2], Header::Value).unwrap(), Decimal::ZERO);
        assert_eq!(table.string_value_at(CellAddress::new(7, 0)), "Итого");
        assert_eq!(table.string_value_at(CellAddress::new(40, 0)), "");
    }

    #[test]
    fn test_unresolved_column_fails_on_use() {
        let sheet = sheet();
        let table = ExcelTable::<Header>::of_with_footer(&sheet, "SECURITIES", "Итого");
        let row = table.rows().next().unwrap();
        let err = table.string_value(&row, Header::Comment).unwrap_err();
        assert_eq!(
            err,
            ExtractError::ColumnUnresolved {
                table: "SECURITIES".to_string(),
                column: "Comment".to_string(),
            }
        );
    }

    #[test]
    fn test_malformed_cell_surfaces() {
        let sheet = sheet();
        let table = ExcelTable::<Header>::of_with_footer(&sheet, "SECURITIES", "Итого");
        let row = table.rows().next().unwrap();
        assert!(matches!(
            table.long_value(&row, Header::Ticker),
            Err(ExtractError::MalformedCell { .. })
        ));
    }

    #[test]
    fn test_find_row() {
        let sheet = sheet();
        let table = ExcelTable::<Header>::of_with_footer(&sheet, "SECURITIES", "Итого");
        assert_eq!(table.find_row("GAZP").map(|r| r.index()), Some(4));
        assert_eq!(table.find_row("Итого").map(|r| r.index()), Some(7));
        assert_eq!(table.find_row("LKOH"), None);
    }

    #[test]
    fn test_find_row_ignores_cells_beside_table() {
        let mut sheet = sheet();
        text(&mut sheet, 5, 3, "LKOH");
        let table = ExcelTable::<Header>::of_with_footer(&sheet, "SECURITIES", "Итого");
        assert_eq!(table.range().map(|r| r.last_col()), Some(2));
        assert_eq!(table.find_row("LKOH"), None);
    }

    #[test]
    fn test_of_no_name_keeps_row_labels() {
        let mut sheet = Range::new((0, 0), (5, 3));
        text(&mut sheet, 1, 1, "Сумма на конец периода");
        text(&mut sheet, 3, 0, "Денежные средства");
        sheet.set_value((3, 1), Data::Float(10.0));
        text(&mut sheet, 4, 0, "Всего:");
        sheet.set_value((4, 1), Data::Float(12.5));
        let table = ExcelTable::<Header>::of_no_name(&sheet, "Assets", "Сумма на конец периода", None, 2);
        assert_eq!(table.range(), Some(CellRangeAddress::new(1, 5, 0, 1)));
        let row = table.find_row("Всего").unwrap();
        assert_eq!(row.index(), 4);
        assert_eq!(table.currency_value(&row, Header::Value).unwrap(), Decimal::new(125, 1));
    }

    #[test]
    fn test_of_no_name() {
        let sheet = sheet();
        let table = ExcelTable::<Header>::of_no_name(&sheet, "Securities", "Тикер", Some("Итого"), 1);
        assert_eq!(table.table_name(), "Securities");
        assert_eq!(table.range(), Some(CellRangeAddress::new(2, 7, 0, 2)));
        assert_eq!(table.columns().get(Header::Value), Some(2));
        assert_eq!(indices(&table), vec![3, 4, 6]);
    }
}
