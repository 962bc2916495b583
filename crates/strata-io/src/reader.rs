//! CSV table reader with column type inference and full input validation.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::domain::{Column, ColumnValues, Dataset};
use crate::IoError;

/// Reads a delimited-text table from a CSV file into a typed [`Dataset`].
///
/// Expected CSV format:
/// - Header row required; header cells become column names
/// - One data row per sample, all rows must have the same number of columns
///
/// Column types are inferred after reading: a column whose every cell parses
/// as `i64` becomes [`ColumnValues::Integer`]; otherwise, if every cell
/// parses as `f64` it becomes [`ColumnValues::Numeric`]; anything else is
/// [`ColumnValues::Text`]. A column that parses as floating point but holds
/// NaN or Inf is rejected rather than silently demoted to text.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::EmptyTable`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::DuplicateColumn`] | Same header name appears twice |
/// | [`IoError::NonFiniteValue`] | Numeric cell is NaN or Inf |
pub struct TableReader {
    path: PathBuf,
}

impl TableReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning a [`Dataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Dataset, IoError> {
        // 1. Open file (FileNotFound on failure)
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // 2. Build CSV reader with headers.
        // flexible(true) allows rows with varying column counts so that our own
        // InconsistentRowLength check fires instead of a low-level CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        // 3. Read header for column names and expected column count
        let header = rdr.headers().map_err(|e| IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        })?;
        let names: Vec<String> = header.iter().map(String::from).collect();
        let expected_cols = names.len();
        debug!(expected_cols, "read CSV header");

        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(IoError::DuplicateColumn { name: name.clone() });
            }
        }

        // 4. Collect raw cells column-wise, validating row shape
        let mut cells: Vec<Vec<String>> = vec![Vec::new(); expected_cols];
        let mut n_rows = 0usize;

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| IoError::CsvParse {
                path: self.path.clone(),
                offset: e.position().map_or(0, |p| p.byte()),
                source: e,
            })?;

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            for (col, cell) in record.iter().enumerate() {
                cells[col].push(cell.to_string());
            }
            n_rows += 1;
        }

        if n_rows == 0 {
            return Err(IoError::EmptyTable {
                path: self.path.clone(),
            });
        }

        // 5. Infer a type per column and build the dataset
        let mut columns = Vec::with_capacity(expected_cols);
        for (name, raw) in names.into_iter().zip(cells) {
            columns.push(self.infer_column(name, raw)?);
        }

        // Duplicate names and row counts were validated above, so this
        // construction should not fail.
        let dataset = Dataset::new(columns)?;

        info!(
            n_rows = dataset.n_rows(),
            n_columns = dataset.n_columns(),
            "table loaded"
        );
        Ok(dataset)
    }

    /// Infer the type of one column from its raw cells.
    fn infer_column(&self, name: String, raw: Vec<String>) -> Result<Column, IoError> {
        if let Some(ints) = parse_all::<i64>(&raw) {
            return Ok(Column::new(name, ColumnValues::Integer(ints)));
        }

        if let Some(floats) = parse_all::<f64>(&raw) {
            // A numeric column must be finite end to end.
            for (row_index, &value) in floats.iter().enumerate() {
                if !value.is_finite() {
                    return Err(IoError::NonFiniteValue {
                        path: self.path.clone(),
                        row_index,
                        column: name,
                        raw: raw[row_index].clone(),
                    });
                }
            }
            return Ok(Column::new(name, ColumnValues::Numeric(floats)));
        }

        Ok(Column::new(name, ColumnValues::Text(raw)))
    }
}

/// Parse every cell as `T`, or return `None` on the first failure.
fn parse_all<T: std::str::FromStr>(raw: &[String]) -> Option<Vec<T>> {
    raw.iter().map(|s| s.trim().parse::<T>().ok()).collect()
}
