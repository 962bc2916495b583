//! Domain types for strata-io: typed columns and the table they form.

use crate::IoError;

/// The values of a single table column.
///
/// Columns are homogeneously typed. Integer and numeric columns both count
/// as numeric for feature selection; text columns never do.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    /// Floating-point values, all finite.
    Numeric(Vec<f64>),
    /// Integer values (cluster labels, counts, IDs).
    Integer(Vec<i64>),
    /// Free-form text values.
    Text(Vec<String>),
}

impl ColumnValues {
    /// Return the number of rows in this column.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Integer(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
        }
    }

    /// Return true when the column has zero rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named, typed table column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: ColumnValues,
}

impl Column {
    /// Create a new column from a name and its values.
    pub fn new(name: impl Into<String>, values: ColumnValues) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Return the column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the column values.
    #[must_use]
    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    /// Return true when the column holds numeric or integer values.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self.values,
            ColumnValues::Numeric(_) | ColumnValues::Integer(_)
        )
    }

    /// Return the column values as `f64`, converting integers.
    ///
    /// Returns `None` for text columns.
    #[must_use]
    pub fn as_numeric(&self) -> Option<Vec<f64>> {
        match &self.values {
            ColumnValues::Numeric(v) => Some(v.clone()),
            ColumnValues::Integer(v) => Some(v.iter().map(|&x| x as f64).collect()),
            ColumnValues::Text(_) => None,
        }
    }
}

/// A table of named columns, rows aligned by position.
///
/// Columns keep their insertion order. All columns hold the same number of
/// rows; this is enforced at construction and on every append.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Dataset {
    /// Build a dataset from columns.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::DuplicateColumn`] | Two columns share a name |
    /// | [`IoError::ColumnLengthMismatch`] | A column's row count differs from the first column's |
    pub fn new(columns: Vec<Column>) -> Result<Self, IoError> {
        let n_rows = columns.first().map_or(0, |c| c.values.len());
        for (i, col) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(IoError::DuplicateColumn {
                    name: col.name.clone(),
                });
            }
            if col.values.len() != n_rows {
                return Err(IoError::ColumnLengthMismatch {
                    name: col.name.clone(),
                    expected: n_rows,
                    got: col.values.len(),
                });
            }
        }
        Ok(Self { columns, n_rows })
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Return the number of columns.
    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Return the columns in insertion order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Return the column names in insertion order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Look up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Return a new dataset with an integer label column appended.
    ///
    /// The original columns are preserved unchanged, in order.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::DuplicateColumn`] | `name` collides with an existing column |
    /// | [`IoError::ColumnLengthMismatch`] | `labels.len()` differs from the row count |
    pub fn with_label_column(&self, name: &str, labels: &[i64]) -> Result<Dataset, IoError> {
        if self.column(name).is_some() {
            return Err(IoError::DuplicateColumn {
                name: name.to_string(),
            });
        }
        if labels.len() != self.n_rows {
            return Err(IoError::ColumnLengthMismatch {
                name: name.to_string(),
                expected: self.n_rows,
                got: labels.len(),
            });
        }
        let mut columns = self.columns.clone();
        columns.push(Column::new(name, ColumnValues::Integer(labels.to_vec())));
        Ok(Dataset {
            columns,
            n_rows: self.n_rows,
        })
    }
}
