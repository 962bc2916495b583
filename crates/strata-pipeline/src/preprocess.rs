//! Feature selection and standardisation.

use strata_io::Dataset;
use tracing::{debug, info, instrument};

use crate::error::PipelineError;

/// A row-major numeric feature matrix with named columns.
///
/// Column order equals the order the features were requested in; row order
/// equals the source dataset's row order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    column_names: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Return the feature column names, in selection order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Return the row-major matrix: `rows()[sample][feature]`.
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Return the number of samples.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Return the number of features.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.column_names.len()
    }
}

/// Extract the requested columns from `dataset` as a numeric matrix.
///
/// Columns appear in exactly the requested order with all rows preserved;
/// nothing is reordered, dropped, or substituted. Integer columns are
/// converted to `f64`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`PipelineError::NoFeatureColumns`] | `feature_names` is empty |
/// | [`PipelineError::ColumnNotFound`] | A requested name is absent from the dataset |
/// | [`PipelineError::NonNumericColumn`] | A requested column holds text values |
#[instrument(skip(dataset), fields(n_features = feature_names.len(), n_rows = dataset.n_rows()))]
pub fn select_features(
    dataset: &Dataset,
    feature_names: &[String],
) -> Result<FeatureMatrix, PipelineError> {
    if feature_names.is_empty() {
        return Err(PipelineError::NoFeatureColumns);
    }

    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(feature_names.len());
    for name in feature_names {
        let column = dataset
            .column(name)
            .ok_or_else(|| PipelineError::ColumnNotFound { name: name.clone() })?;
        let values = column
            .as_numeric()
            .ok_or_else(|| PipelineError::NonNumericColumn { name: name.clone() })?;
        columns.push(values);
    }

    // Transpose column-major selections into row-major samples.
    let n_rows = dataset.n_rows();
    let rows: Vec<Vec<f64>> = (0..n_rows)
        .map(|r| columns.iter().map(|col| col[r]).collect())
        .collect();

    info!(
        n_rows,
        n_features = feature_names.len(),
        "feature selection complete"
    );

    Ok(FeatureMatrix {
        column_names: feature_names.to_vec(),
        rows,
    })
}

/// Standardise each column to zero mean and unit variance.
///
/// Uses the population standard deviation (divisor `n`). A zero-variance
/// column becomes all zeros instead of failing, matching standard scaler
/// semantics. Shape is preserved exactly.
#[instrument(skip(matrix), fields(n_rows = matrix.n_rows(), n_features = matrix.n_features()))]
#[must_use]
pub fn standardise_features(matrix: &FeatureMatrix) -> FeatureMatrix {
    let n_rows = matrix.n_rows();
    let n_features = matrix.n_features();
    if n_rows == 0 {
        return matrix.clone();
    }

    let n = n_rows as f64;
    let mut means = vec![0.0; n_features];
    let mut stds = vec![0.0; n_features];

    for row in &matrix.rows {
        for (m, v) in means.iter_mut().zip(row) {
            *m += v;
        }
    }
    for m in &mut means {
        *m /= n;
    }

    for row in &matrix.rows {
        for ((s, v), m) in stds.iter_mut().zip(row).zip(&means) {
            *s += (v - m).powi(2);
        }
    }
    for s in &mut stds {
        *s = (*s / n).sqrt();
    }

    for (j, std) in stds.iter().enumerate() {
        if *std == 0.0 {
            debug!(column = %matrix.column_names[j], "zero-variance column zeroed");
        }
    }

    let rows: Vec<Vec<f64>> = matrix
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .zip(means.iter().zip(&stds))
                .map(|(v, (m, s))| if *s == 0.0 { 0.0 } else { (v - m) / s })
                .collect()
        })
        .collect();

    FeatureMatrix {
        column_names: matrix.column_names.clone(),
        rows,
    }
}
