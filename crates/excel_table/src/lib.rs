//! # Excel Table
//!
//! Extraction engine for broker spreadsheet reports.
//!
//! A report sheet is free-form: tables have no declared position, headers may
//! span several rows and the last rows usually hold totals. This crate finds a
//! table by its title text, resolves the physical columns of a per-format
//! column enum, iterates the genuine data rows and turns every row into
//! records through a caller-supplied transform. A broken row is logged and
//! skipped, never aborting the rest of the table.
//!
//! ```rust,no_run
//! use excel_table::{ExcelTable, TableColumn, TableColumnDescription};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum CashHeader { Value }
//!
//! impl TableColumnDescription for CashHeader {
//!     fn all() -> &'static [Self] { &[CashHeader::Value] }
//!     fn column(&self) -> TableColumn { TableColumn::of(&["сумма"]) }
//! }
//!
//! # fn run(sheet: &calamine::Range<calamine::Data>) -> anyhow::Result<()> {
//! let table = ExcelTable::<CashHeader>::of_with_footer(sheet, "CASH", "Итого");
//! let values = table.get_data("report.xlsx", |table, row| {
//!     Ok(Some(table.currency_value(row, CashHeader::Value)?))
//! });
//! # Ok(())
//! # }
//! ```

pub mod cell;
pub mod column;
pub mod error;
pub mod extract;
pub mod locator;
pub mod report;
pub mod sheet;
pub mod table;

pub use crate::cell::CellValue;
pub use crate::column::{ColumnIndices, TableColumn, TableColumnDescription};
pub use crate::error::ExtractError;
pub use crate::extract::{Extraction, RowFailure};
pub use crate::locator::{AnchorMatch, ColumnExtent, FooterMode, LocatorOptions, TableEnd};
pub use crate::report::{BrokerReport, ReportTable, ReportTablesFactory};
pub use crate::sheet::{CellAddress, CellRangeAddress, Sheet};
pub use crate::table::{ExcelTable, TableRow, TableRows};
