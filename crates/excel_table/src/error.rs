use thiserror::Error;

use crate::sheet::CellAddress;

/// Errors raised while reading a single cell of a located table.
///
/// A missing table or an unmatched header are not errors: they surface as an
/// empty table and as an unresolved column respectively. Only dereferencing an
/// unresolved column or reading a cell of the wrong kind fails, and the row
/// pipeline catches those per row.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("Column {column} of table '{table}' was not found in the header")]
    ColumnUnresolved { table: String, column: String },

    #[error("Cell {address} is {found}, expected {expected}")]
    MalformedCell {
        address: CellAddress,
        expected: &'static str,
        found: &'static str,
    },
}
