//! Typed access to raw cell values.
//!
//! A cell is read once into [`CellValue`] and every typed accessor matches on
//! that variant. Accessors never coerce between incompatible kinds: a request
//! that does not fit the stored kind fails with [`ExtractError::MalformedCell`],
//! which the row pipeline catches per row.

use calamine::Data;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::ExtractError;
use crate::sheet::CellAddress;

/// Cell content as stored in the sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Numbers and Excel serial dates.
    Numeric(f64),
    Text(String),
    Blank,
    /// Booleans, ISO dates, error codes and anything else, kept as rendered text.
    Other(String),
}

impl CellValue {
    pub fn kind(&self) -> &'static str {
        match self {
            CellValue::Numeric(_) => "numeric",
            CellValue::Text(_) => "text",
            CellValue::Blank => "blank",
            CellValue::Other(_) => "other",
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Blank => true,
            CellValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => CellValue::Numeric(*i as f64),
            Data::Float(f) => CellValue::Numeric(*f),
            Data::DateTime(dt) => CellValue::Numeric(dt.as_f64()),
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Empty => CellValue::Blank,
            Data::Bool(b) => CellValue::Other(b.to_string()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Other(s.clone()),
            Data::Error(e) => CellValue::Other(e.to_string()),
        }
    }
}

fn malformed(address: CellAddress, expected: &'static str, cell: Option<&CellValue>) -> ExtractError {
    ExtractError::MalformedCell {
        address,
        expected,
        found: cell.map_or("missing", CellValue::kind),
    }
}

/// Reads an integer, truncating numeric cells toward zero.
pub fn as_integer(address: CellAddress, cell: Option<&CellValue>) -> Result<i64, ExtractError> {
    match cell {
        Some(CellValue::Numeric(value)) => {
            let truncated = value.trunc();
            // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
            if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
                Ok(truncated as i64)
            } else {
                Err(malformed(address, "integer", cell))
            }
        }
        Some(CellValue::Text(text)) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| malformed(address, "integer", cell)),
        _ => Err(malformed(address, "integer", cell)),
    }
}

/// Reads a money amount. Magnitudes below one cent become exact zero.
pub fn as_currency(address: CellAddress, cell: Option<&CellValue>) -> Result<Decimal, ExtractError> {
    let value = match cell {
        // shortest round-trip rendering keeps 1234.56 as 1234.56
        Some(CellValue::Numeric(value)) => Decimal::from_str(&value.to_string()).ok(),
        Some(CellValue::Text(text)) => parse_decimal(text),
        _ => None,
    }
    .ok_or_else(|| malformed(address, "currency", cell))?;

    if value.abs() < Decimal::new(1, 2) {
        Ok(Decimal::ZERO)
    } else {
        Ok(value)
    }
}

/// Reads a cell as text. Missing and blank cells read as an empty string.
pub fn as_text(cell: Option<&CellValue>) -> String {
    match cell {
        None | Some(CellValue::Blank) => String::new(),
        Some(CellValue::Text(text)) | Some(CellValue::Other(text)) => text.clone(),
        Some(CellValue::Numeric(value)) => value.to_string(),
    }
}

/// Parses amounts such as `1 234,56`, `-50` or `1,234.56`.
fn parse_decimal(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\u{202f}')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let normalized = if cleaned.contains('.') {
        cleaned.replace(',', "")
    } else {
        cleaned.replace(',', ".")
    };
    Decimal::from_str(&normalized).ok()
}
