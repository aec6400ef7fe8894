use chrono::NaiveDate;
pub use excel_table::{AnchorMatch, ColumnExtent, FooterMode, LocatorOptions, TableEnd};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// Settings models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorSettings {
	/// Rows between a table title and its first data row.
	pub data_row_offset: u32,
	pub anchor_match: AnchorMatch,
	pub footer_match: AnchorMatch,
	pub footer_mode: FooterMode,
	pub table_end: TableEnd,
	pub column_extent: ColumnExtent,
	/// Fallback `tracing` filter when `RUST_LOG` is not set.
	pub log_filter: String,
}

impl Default for ExtractorSettings {
	fn default() -> Self {
		let locator = LocatorOptions::default();
		Self {
			data_row_offset: 2,
			anchor_match: locator.anchor_match,
			footer_match: locator.footer_match,
			footer_mode: locator.footer_mode,
			table_end: locator.table_end,
			column_extent: locator.column_extent,
			log_filter: "info".to_string(),
		}
	}
}

impl ExtractorSettings {
	pub fn locator_options(&self) -> LocatorOptions {
		LocatorOptions {
			anchor_match: self.anchor_match,
			footer_match: self.footer_match,
			footer_mode: self.footer_mode,
			table_end: self.table_end,
			column_extent: self.column_extent,
		}
	}
}

// Extracted records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CashFlowType {
	Cash,
	Tax,
	Fee,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
	pub portfolio: String,
	pub timestamp: NaiveDate,
	#[serde(rename = "type")]
	pub kind: CashFlowType,
	pub value: Decimal,
	pub currency: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortfolioPropertyType {
	#[serde(rename = "TOTAL_ASSETS")]
	TotalAssets,
	#[serde(rename = "USDRUB_EXCHANGE_RATE")]
	UsdRubExchangeRate,
	#[serde(rename = "EURRUB_EXCHANGE_RATE")]
	EurRubExchangeRate,
	#[serde(rename = "GBPRUB_EXCHANGE_RATE")]
	GbpRubExchangeRate,
	#[serde(rename = "CHFRUB_EXCHANGE_RATE")]
	ChfRubExchangeRate,
}

impl PortfolioPropertyType {
	/// Ruble exchange rate property of a currency code, case-insensitive.
	pub fn exchange_rate(currency: &str) -> Option<Self> {
		match currency.trim().to_uppercase().as_str() {
			"USD" => Some(Self::UsdRubExchangeRate),
			"EUR" => Some(Self::EurRubExchangeRate),
			"GBP" => Some(Self::GbpRubExchangeRate),
			"CHF" => Some(Self::ChfRubExchangeRate),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioProperty {
	pub portfolio: String,
	pub property: PortfolioPropertyType,
	pub value: Decimal,
	pub timestamp: NaiveDate,
}
