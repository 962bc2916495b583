//! I/O and table validation error types for strata-io.

use std::path::PathBuf;

/// Errors from file I/O, CSV parsing, and table construction.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty table (no data rows) in {path}")]
    EmptyTable {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error("inconsistent row length in {path}: row {row_index} has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when a column that parses as numeric contains NaN or Inf.
    #[error("non-finite value in {path}: row {row_index}, column \"{column}\", raw value \"{raw}\"")]
    NonFiniteValue {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Name of the offending column.
        column: String,
        /// The raw string value that failed the finiteness check.
        raw: String,
    },

    /// Returned when the same column name appears more than once.
    #[error("duplicate column name \"{name}\"")]
    DuplicateColumn {
        /// The duplicated column name.
        name: String,
    },

    /// Returned when a column's row count does not match the rest of the table.
    #[error("column \"{name}\" has {got} rows, expected {expected}")]
    ColumnLengthMismatch {
        /// Name of the offending column.
        name: String,
        /// Expected number of rows.
        expected: usize,
        /// Actual number of rows in this column.
        got: usize,
    },

    /// Returned when an output file cannot be created or written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying CSV/I/O error.
        source: csv::Error,
    },
}
