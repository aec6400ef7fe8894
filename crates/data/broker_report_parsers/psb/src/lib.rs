use anyhow::{anyhow, Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use excel_table::extract::combine;
use excel_table::{
    BrokerReport, CellValue, ExcelTable, ReportTable, ReportTablesFactory, TableColumn,
    TableColumnDescription, TableRow,
};
use models::{CashFlow, CashFlowType, ExtractorSettings};
use rust_decimal::Decimal;

pub const PARSER_NAME: &str = "psb";

/// Title cell every PSB broker report starts with.
pub const REPORT_MARKER: &str = "Отчет брокера";
pub const CASH_TABLE: &str = "Внешнее движение денежных средств в валюте счета";
pub const TABLE_FOOTER: &str = "Итого";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CashFlowTableHeader {
    Date,
    Operation,
    Value,
    Currency,
    Description,
}

impl TableColumnDescription for CashFlowTableHeader {
    fn all() -> &'static [Self] {
        &[
            CashFlowTableHeader::Date,
            CashFlowTableHeader::Operation,
            CashFlowTableHeader::Value,
            CashFlowTableHeader::Currency,
            CashFlowTableHeader::Description,
        ]
    }

    fn column(&self) -> TableColumn {
        match self {
            CashFlowTableHeader::Date => TableColumn::of(&["дата"]),
            CashFlowTableHeader::Operation => TableColumn::of(&["операция"]),
            CashFlowTableHeader::Value => TableColumn::of(&["сумма"]),
            CashFlowTableHeader::Currency => TableColumn::of(&["валюта"]),
            CashFlowTableHeader::Description => TableColumn::any_of(vec![
                TableColumn::of(&["комментарий"]),
                TableColumn::of(&["примечание"]),
            ]),
        }
    }
}

/// One row of the cash table. Rows of the same day, type and currency are the
/// same flow and get summed.
#[derive(Debug, Clone)]
pub struct CashFlowTableRow {
    pub date: NaiveDate,
    pub kind: CashFlowType,
    pub value: Decimal,
    pub currency: String,
    pub description: Option<String>,
}

impl PartialEq for CashFlowTableRow {
    fn eq(&self, other: &Self) -> bool {
        self.date == other.date && self.kind == other.kind && self.currency == other.currency
    }
}

impl CashFlowTableRow {
    fn sum(self, other: Self) -> Self {
        Self {
            value: self.value + other.value,
            description: self.description.or(other.description),
            ..self
        }
    }

    fn into_cash_flow(self, portfolio: &str) -> CashFlow {
        CashFlow {
            portfolio: portfolio.to_string(),
            timestamp: self.date,
            kind: self.kind,
            value: self.value,
            currency: self.currency,
            description: self.description,
        }
    }
}

/// Deposits, withdrawals and taxes of a PSB report.
pub struct CashFlowTable<'r> {
    report: &'r BrokerReport,
    data: Vec<CashFlow>,
}

impl<'r> CashFlowTable<'r> {
    pub fn new(report: &'r BrokerReport) -> Self {
        Self::with_settings(report, &ExtractorSettings::default())
    }

    pub fn with_settings(report: &'r BrokerReport, settings: &ExtractorSettings) -> Self {
        let source = report.file_name();
        let table = ExcelTable::<CashFlowTableHeader>::with_options(
            report.sheet(),
            CASH_TABLE,
            Some(TABLE_FOOTER),
            &settings.locator_options(),
        )
        .with_data_row_offset(settings.data_row_offset);

        if table.is_empty() {
            tracing::info!(table = CASH_TABLE, file = %source, "Table not found");
        }

        let data = table
            .get_data_collection_with(
                &source,
                |table, row| Ok(cash_flow_row(table, row)?.into_iter().collect()),
                combine(CashFlowTableRow::sum),
            )
            .into_iter()
            .map(|row| row.into_cash_flow(report.portfolio()))
            .collect();

        Self { report, data }
    }
}

impl ReportTable<CashFlow> for CashFlowTable<'_> {
    fn report(&self) -> &BrokerReport {
        self.report
    }

    fn data(&self) -> &[CashFlow] {
        &self.data
    }
}

fn cash_flow_row(
    table: &ExcelTable<'_, CashFlowTableHeader>,
    row: &TableRow,
) -> Result<Option<CashFlowTableRow>> {
    let operation = table.string_value(row, CashFlowTableHeader::Operation)?;
    if operation.trim().is_empty() {
        return Ok(None);
    }

    let date = parse_date(table.cell(row, CashFlowTableHeader::Date)?)
        .with_context(|| format!("Invalid date of operation '{}'", operation))?;
    let value = table
        .currency_value(row, CashFlowTableHeader::Value)
        .with_context(|| format!("Invalid amount of operation '{}'", operation))?;
    let currency = match table.string_value(row, CashFlowTableHeader::Currency)?.trim() {
        "" | "RUR" => "RUB".to_string(),
        code => code.to_uppercase(),
    };
    let description = table
        .string_value(row, CashFlowTableHeader::Description)
        .ok()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    Ok(Some(CashFlowTableRow {
        date,
        kind: cash_flow_type(&operation),
        value,
        currency,
        description,
    }))
}

fn cash_flow_type(operation: &str) -> CashFlowType {
    let operation = operation.to_lowercase();
    if operation.contains("налог") {
        CashFlowType::Tax
    } else if operation.contains("комисс") {
        CashFlowType::Fee
    } else {
        CashFlowType::Cash
    }
}

/// Handles dates that may come as:
/// - Excel serial number
/// - Russian date string: "02.03.2020"
/// - ISO date or datetime string
fn parse_date(cell: Option<CellValue>) -> Result<NaiveDate> {
    match cell {
        Some(CellValue::Numeric(serial)) => excel_serial_to_date(serial),
        Some(CellValue::Text(text)) | Some(CellValue::Other(text)) => parse_date_string(&text),
        _ => Err(anyhow!("empty date")),
    }
}

fn parse_date_string(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return Err(anyhow!("empty date string"));
    }
    for fmt in ["%d.%m.%Y", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.date());
    }
    Err(anyhow!("unsupported date format: {}", s))
}

/// Excel serial date conversion using 1899-12-30 base.
fn excel_serial_to_date(v: f64) -> Result<NaiveDate> {
    if !v.is_finite() {
        return Err(anyhow!("non-finite excel date"));
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30).ok_or_else(|| anyhow!("bad base date"))?;
    Duration::try_days(v.floor() as i64)
        .and_then(|days| base.checked_add_signed(days))
        .ok_or_else(|| anyhow!("excel date {} out of range", v))
}

/// Tables of a PSB report.
pub struct PsbReportTables<'r> {
    pub cash_flow: CashFlowTable<'r>,
}

#[derive(Debug, Default)]
pub struct PsbReportTablesFactory {
    settings: ExtractorSettings,
}

impl PsbReportTablesFactory {
    pub fn new(settings: ExtractorSettings) -> Self {
        Self { settings }
    }
}

impl ReportTablesFactory for PsbReportTablesFactory {
    type Tables<'r> = PsbReportTables<'r>;

    fn can_create(&self, report: &BrokerReport) -> bool {
        report.contains(REPORT_MARKER)
    }

    fn create<'r>(&self, report: &'r BrokerReport) -> PsbReportTables<'r> {
        PsbReportTables {
            cash_flow: CashFlowTable::with_settings(report, &self.settings),
        }
    }
}
