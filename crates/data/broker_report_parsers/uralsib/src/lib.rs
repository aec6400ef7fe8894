use anyhow::{anyhow, Context, Result};
use excel_table::{
    locator, AnchorMatch, BrokerReport, ExcelTable, ReportTable, ReportTablesFactory, Sheet,
    TableColumn, TableColumnDescription,
};
use models::{ExtractorSettings, PortfolioProperty, PortfolioPropertyType};
use rust_decimal::Decimal;
use std::str::FromStr;

pub const PARSER_NAME: &str = "uralsib";

/// Title cell every Uralsib broker report starts with.
pub const REPORT_MARKER: &str = "Брокерский отчет";
pub const ASSETS_TABLE: &str = "ОЦЕНКА АКТИВОВ";
pub const TABLE_FIRST_HEADER_LINE: &str = "На конец отчетного периода";
pub const ASSETS: &str = "Общая стоимость активов:";
pub const EXCHANGE_RATE: &str = "Официальный обменный курс";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummaryTableHeader {
    /// Closing value in rubles, under a three line header.
    Rub,
}

impl TableColumnDescription for SummaryTableHeader {
    fn all() -> &'static [Self] {
        &[SummaryTableHeader::Rub]
    }

    fn column(&self) -> TableColumn {
        match self {
            SummaryTableHeader::Rub => TableColumn::multi_line(vec![
                TableColumn::of(&[TABLE_FIRST_HEADER_LINE]),
                TableColumn::of(&["по цене закрытия"]),
                TableColumn::of(&["RUR"]),
            ]),
        }
    }
}

/// Total assets value and central bank exchange rates of a report.
pub struct PortfolioPropertyTable<'r> {
    report: &'r BrokerReport,
    data: Vec<PortfolioProperty>,
}

impl<'r> PortfolioPropertyTable<'r> {
    pub fn new(report: &'r BrokerReport) -> Self {
        Self::with_settings(report, &ExtractorSettings::default())
    }

    pub fn with_settings(report: &'r BrokerReport, settings: &ExtractorSettings) -> Self {
        let mut data = total_assets(report, settings);
        data.extend(exchange_rates(report));
        Self { report, data }
    }
}

impl ReportTable<PortfolioProperty> for PortfolioPropertyTable<'_> {
    fn report(&self) -> &BrokerReport {
        self.report
    }

    fn data(&self) -> &[PortfolioProperty] {
        &self.data
    }
}

fn total_assets(report: &BrokerReport, settings: &ExtractorSettings) -> Vec<PortfolioProperty> {
    let table = ExcelTable::<SummaryTableHeader>::of_no_name_with_options(
        report.sheet(),
        ASSETS_TABLE,
        TABLE_FIRST_HEADER_LINE,
        None,
        3,
        &settings.locator_options(),
    );
    if table.is_empty() {
        tracing::info!(table = ASSETS_TABLE, file = %report.file_name(), "Table not found");
        return Vec::new();
    }
    let Some(row) = table.find_row(ASSETS) else {
        return Vec::new();
    };
    match table.currency_value(&row, SummaryTableHeader::Rub) {
        Ok(value) => vec![PortfolioProperty {
            portfolio: report.portfolio().to_string(),
            property: PortfolioPropertyType::TotalAssets,
            value,
            timestamp: report.report_date(),
        }],
        Err(e) => {
            tracing::info!(table = ASSETS_TABLE, file = %report.file_name(), error = %e, "Can't parse table");
            Vec::new()
        }
    }
}

/// Reads the line below the exchange rate caption, e.g. `USD = 73,1 EUR = 80,5`.
///
/// Best effort: a rate that can't be read is logged and skipped.
fn exchange_rates(report: &BrokerReport) -> Vec<PortfolioProperty> {
    let sheet = report.sheet();
    let Some(caption) = locator::find(sheet, EXCHANGE_RATE, 0..=u32::MAX, AnchorMatch::Prefix) else {
        return Vec::new();
    };
    let Some(text) = sheet.text(caption.row.saturating_add(1), 0) else {
        tracing::debug!(file = %report.file_name(), "No exchange rates below caption");
        return Vec::new();
    };

    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .iter()
        .enumerate()
        .filter(|(_, word)| **word == "=")
        .filter_map(|(i, _)| match exchange_rate(&words, i) {
            Ok(rate) => Some(rate),
            Err(e) => {
                tracing::debug!(file = %report.file_name(), error = %format!("{:#}", e), "Can't parse exchange rate");
                None
            }
        })
        .map(|(property, value)| PortfolioProperty {
            portfolio: report.portfolio().to_string(),
            property,
            value,
            timestamp: report.report_date(),
        })
        .collect()
}

fn exchange_rate(words: &[&str], equals: usize) -> Result<(PortfolioPropertyType, Decimal)> {
    let currency = equals
        .checked_sub(1)
        .and_then(|i| words.get(i))
        .ok_or_else(|| anyhow!("no currency before '='"))?;
    let property = PortfolioPropertyType::exchange_rate(currency)
        .ok_or_else(|| anyhow!("unknown currency {}", currency))?;
    let rate = words
        .get(equals + 1)
        .ok_or_else(|| anyhow!("no rate after '{} ='", currency))?;
    let value = Decimal::from_str(&rate.replace(',', "."))
        .with_context(|| format!("invalid {} rate {}", currency, rate))?;
    Ok((property, value))
}

/// Tables of a Uralsib report.
pub struct UralsibReportTables<'r> {
    pub portfolio_property: PortfolioPropertyTable<'r>,
}

#[derive(Debug, Default)]
pub struct UralsibReportTablesFactory {
    settings: ExtractorSettings,
}

impl UralsibReportTablesFactory {
    pub fn new(settings: ExtractorSettings) -> Self {
        Self { settings }
    }
}

impl ReportTablesFactory for UralsibReportTablesFactory {
    type Tables<'r> = UralsibReportTables<'r>;

    fn can_create(&self, report: &BrokerReport) -> bool {
        report.contains(REPORT_MARKER)
    }

    fn create<'r>(&self, report: &'r BrokerReport) -> UralsibReportTables<'r> {
        UralsibReportTables {
            portfolio_property: PortfolioPropertyTable::with_settings(report, &self.settings),
        }
    }
}
