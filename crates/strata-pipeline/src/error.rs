use strata_cluster::ClusterError;
use strata_io::IoError;

/// Errors from the preprocessing and orchestration layer.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Returned when a requested feature column is absent from the dataset.
    #[error("feature column \"{name}\" not found in dataset")]
    ColumnNotFound {
        /// The missing column name.
        name: String,
    },

    /// Returned when a requested feature column holds non-numeric values.
    #[error("feature column \"{name}\" is not numeric")]
    NonNumericColumn {
        /// The offending column name.
        name: String,
    },

    /// Returned when no feature columns are requested.
    #[error("at least one feature column is required")]
    NoFeatureColumns,

    /// A clustering-layer failure (bad cluster count, unknown algorithm, ...).
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    /// An I/O-layer failure (reading the input table, persisting the output).
    #[error(transparent)]
    Io(#[from] IoError),
}
