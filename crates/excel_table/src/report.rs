//! Loaded broker report and the traits broker wiring builds on.

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use crate::locator::{self, AnchorMatch};
use crate::sheet::Sheet;

/// First sheet of a broker report together with its identity.
pub struct BrokerReport {
    path: PathBuf,
    sheet: Range<Data>,
    portfolio: String,
    report_date: NaiveDate,
}

impl BrokerReport {
    pub fn new(
        path: impl Into<PathBuf>,
        sheet: Range<Data>,
        portfolio: impl Into<String>,
        report_date: NaiveDate,
    ) -> Self {
        Self {
            path: path.into(),
            sheet,
            portfolio: portfolio.into(),
            report_date,
        }
    }

    /// Opens an xls/xlsx/xlsb/ods workbook and keeps its first sheet.
    pub fn open<P: AsRef<Path>>(path: P, portfolio: impl Into<String>, report_date: NaiveDate) -> Result<Self> {
        let path = path.as_ref();
        let mut workbook = open_workbook_auto(path)
            .with_context(|| format!("Cannot open {}", path.display()))?;
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("No sheets found in {}", path.display()))?;
        let sheet = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("Cannot read sheet '{}' in {}", sheet_name, path.display()))?;
        tracing::debug!(path = %path.display(), sheet = %sheet_name, "Opened broker report");
        Ok(Self::new(path, sheet, portfolio, report_date))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name used to identify the report in logs.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn sheet(&self) -> &Range<Data> {
        &self.sheet
    }

    pub fn portfolio(&self) -> &str {
        &self.portfolio
    }

    pub fn report_date(&self) -> NaiveDate {
        self.report_date
    }

    /// Whether any cell of the sheet starts with `marker`.
    pub fn contains(&self, marker: &str) -> bool {
        locator::find(&self.sheet, marker, 0..=u32::MAX, AnchorMatch::Prefix).is_some()
    }

    /// First non-empty text to the right of the cell starting with `label`.
    pub fn value_next_to(&self, label: &str) -> Option<String> {
        let address = locator::find(&self.sheet, label, 0..=u32::MAX, AnchorMatch::Prefix)?;
        let last_col = self.sheet.dimensions()?.last_col();
        (address.col.saturating_add(1)..=last_col)
            .filter_map(|col| self.sheet.cell(address.row, col))
            .find(|cell| !cell.is_blank())
            .map(|cell| crate::cell::as_text(Some(&cell)).trim().to_string())
    }
}

/// Records extracted from one table of a report.
pub trait ReportTable<T> {
    fn report(&self) -> &BrokerReport;

    fn data(&self) -> &[T];
}

/// Builds the broker-specific tables for reports it recognises.
pub trait ReportTablesFactory {
    type Tables<'r>;

    fn can_create(&self, report: &BrokerReport) -> bool;

    fn create<'r>(&self, report: &'r BrokerReport) -> Self::Tables<'r>;
}
