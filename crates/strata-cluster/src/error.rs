/// Errors from clustering operations.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    /// Returned when the requested cluster count is zero.
    #[error("n_clusters must be at least 1, got {k}")]
    InvalidK {
        /// The invalid cluster count provided.
        k: usize,
    },

    /// Returned when fewer samples are provided than the requested cluster count.
    #[error("need at least {k} samples to form {k} clusters, got {n_samples}")]
    TooFewSamples {
        /// Number of samples provided.
        n_samples: usize,
        /// Requested number of clusters.
        k: usize,
    },

    /// Returned when min_k exceeds max_k in a sweep range.
    #[error("min_k ({min_k}) must not exceed max_k ({max_k})")]
    InvalidKRange {
        /// The minimum k value.
        min_k: usize,
        /// The maximum k value.
        max_k: usize,
    },

    /// Returned when the input matrix has zero rows.
    #[error("empty input: no samples to cluster")]
    EmptyInput,

    /// Returned when sample rows have inconsistent dimensionality.
    #[error("sample {index} has {found} features, expected {expected}")]
    DimensionMismatch {
        /// Index of the offending sample.
        index: usize,
        /// Expected dimensionality (from the first sample).
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },

    /// Returned when an algorithm selector does not match any registered adapter.
    #[error("unknown algorithm \"{name}\": expected one of {supported}")]
    UnknownAlgorithm {
        /// The unrecognized selector.
        name: String,
        /// Comma-separated list of registered algorithm names.
        supported: String,
    },
}
