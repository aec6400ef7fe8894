//! Row extraction pipeline.
//!
//! Every data row of a table goes through a caller-supplied transform that
//! yields zero or more records. Records equal to an already collected one are
//! merged by a policy, and a row whose transform fails is logged and skipped.

use anyhow::Result;

use crate::column::TableColumnDescription;
use crate::table::{ExcelTable, TableRow};

/// A row skipped because its transform failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    /// Zero-based sheet row number.
    pub row: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction<T> {
    pub records: Vec<T>,
    pub failures: Vec<RowFailure>,
}

impl<T> Default for Extraction<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// Default duplicate policy: both records are kept side by side.
pub fn keep_both<T>(existing: T, candidate: T) -> Vec<T> {
    vec![existing, candidate]
}

/// Duplicate policy collapsing two equal records into one.
pub fn combine<T>(mut combiner: impl FnMut(T, T) -> T) -> impl FnMut(T, T) -> Vec<T> {
    move |existing, candidate| vec![combiner(existing, candidate)]
}

impl<'s, D: TableColumnDescription> ExcelTable<'s, D> {
    /// Extracts at most one record per row.
    pub fn get_data<T, F>(&self, source: &str, mut row_extractor: F) -> Vec<T>
    where
        T: PartialEq,
        F: FnMut(&Self, &TableRow) -> Result<Option<T>>,
    {
        self.get_data_collection(source, |table, row| {
            Ok(row_extractor(table, row)?.into_iter().collect())
        })
    }

    /// Extracts any number of records per row, keeping duplicates.
    pub fn get_data_collection<T, F>(&self, source: &str, row_extractor: F) -> Vec<T>
    where
        T: PartialEq,
        F: FnMut(&Self, &TableRow) -> Result<Vec<T>>,
    {
        self.get_data_collection_with(source, row_extractor, keep_both)
    }

    /// Extracts any number of records per row, merging duplicates with `merge_duplicates`.
    pub fn get_data_collection_with<T, F, M>(
        &self,
        source: &str,
        row_extractor: F,
        merge_duplicates: M,
    ) -> Vec<T>
    where
        T: PartialEq,
        F: FnMut(&Self, &TableRow) -> Result<Vec<T>>,
        M: FnMut(T, T) -> Vec<T>,
    {
        self.extract(source, row_extractor, merge_duplicates).records
    }

    /// Runs the pipeline and reports skipped rows alongside the records.
    ///
    /// A candidate equal to a collected record removes it; the merge result is
    /// appended at the end. `source` names the report in log messages.
    pub fn extract<T, F, M>(&self, source: &str, mut row_extractor: F, mut merge_duplicates: M) -> Extraction<T>
    where
        T: PartialEq,
        F: FnMut(&Self, &TableRow) -> Result<Vec<T>>,
        M: FnMut(T, T) -> Vec<T>,
    {
        let mut extraction = Extraction::default();
        for row in self.rows() {
            let records = match row_extractor(self, &row) {
                Ok(records) => records,
                Err(e) => {
                    let message = format!("{:#}", e);
                    tracing::warn!(
                        table = self.table_name(),
                        source,
                        row = row.index(),
                        error = %message,
                        "Can't parse table row"
                    );
                    extraction.failures.push(RowFailure {
                        row: row.index(),
                        message,
                    });
                    continue;
                }
            };

            for record in records {
                let data = &mut extraction.records;
                match data.iter().position(|existing| *existing == record) {
                    Some(position) => {
                        let existing = data.remove(position);
                        data.extend(merge_duplicates(existing, record));
                    }
                    None => data.push(record),
                }
            }
        }

        if !extraction.failures.is_empty() {
            tracing::info!(
                table = self.table_name(),
                source,
                skipped = extraction.failures.len(),
                extracted = extraction.records.len(),
                "Table extracted with skipped rows"
            );
        }
        extraction
    }
}
