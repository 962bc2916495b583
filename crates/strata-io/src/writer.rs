//! CSV table writer for labeled datasets.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::domain::{ColumnValues, Dataset};
use crate::IoError;

/// Writes a [`Dataset`] to a CSV file, preserving column order.
///
/// Integer columns are written without a fractional part; an existing file
/// at the destination is overwritten. The writer does not create missing
/// parent directories; that failure surfaces as [`IoError::WriteFile`].
pub struct TableWriter {
    path: PathBuf,
}

impl TableWriter {
    /// Create a new writer targeting the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Write the dataset as CSV.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the destination cannot be created
    /// or written.
    #[instrument(skip(self, dataset), fields(path = %self.path.display()))]
    pub fn write(&self, dataset: &Dataset) -> Result<(), IoError> {
        let mut wtr = csv::Writer::from_path(&self.path).map_err(|e| IoError::WriteFile {
            path: self.path.clone(),
            source: e,
        })?;

        let header: Vec<&str> = dataset.column_names();
        wtr.write_record(&header).map_err(|e| IoError::WriteFile {
            path: self.path.clone(),
            source: e,
        })?;

        for row in 0..dataset.n_rows() {
            let record: Vec<String> = dataset
                .columns()
                .iter()
                .map(|col| match col.values() {
                    ColumnValues::Numeric(v) => v[row].to_string(),
                    ColumnValues::Integer(v) => v[row].to_string(),
                    ColumnValues::Text(v) => v[row].clone(),
                })
                .collect();
            wtr.write_record(&record).map_err(|e| IoError::WriteFile {
                path: self.path.clone(),
                source: e,
            })?;
        }

        wtr.flush().map_err(|e| IoError::WriteFile {
            path: self.path.clone(),
            source: csv::Error::from(e),
        })?;

        info!(
            n_rows = dataset.n_rows(),
            n_columns = dataset.n_columns(),
            "table written"
        );
        Ok(())
    }
}
