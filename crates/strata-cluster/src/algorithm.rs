//! The shared adapter contract: one trait, one capability-carrying output.

use std::collections::BTreeMap;

use crate::error::ClusterError;
use crate::label::ClusterLabel;

/// Metric key under which partition-based adapters report their objective.
pub const METRIC_INERTIA: &str = "inertia";

/// The output of one clustering run.
///
/// Capabilities differ per algorithm: every adapter produces `labels`, but
/// only centroid-based ones produce `centroids`, and only adapters with an
/// objective value populate `metrics`. Absence is tagged (`None` / empty
/// map), never an empty placeholder structure, so consumers must handle it
/// explicitly.
#[derive(Debug, Clone)]
pub struct Clustering {
    /// Cluster assignment for each input sample, in input row order.
    pub labels: Vec<ClusterLabel>,
    /// Cluster centers in feature space, for algorithms that define them.
    pub centroids: Option<Vec<Vec<f64>>>,
    /// Named summary metrics (e.g. [`METRIC_INERTIA`]).
    pub metrics: BTreeMap<String, f64>,
}

impl Clustering {
    /// Return the inertia metric, when the algorithm defines one.
    #[must_use]
    pub fn inertia(&self) -> Option<f64> {
        self.metrics.get(METRIC_INERTIA).copied()
    }

    /// Return the number of samples assigned to each cluster.
    ///
    /// The returned vec has one entry per cluster index observed in the
    /// labels (length = max label + 1).
    #[must_use]
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let k = self
            .labels
            .iter()
            .map(|l| l.index() + 1)
            .max()
            .unwrap_or(0);
        let mut sizes = vec![0usize; k];
        for label in &self.labels {
            sizes[label.index()] += 1;
        }
        sizes
    }
}

/// Common interface for hard clustering algorithms (one label per sample).
///
/// Implementations validate their own parameters at construction and their
/// input at `fit`; capabilities beyond labels are declared by what the
/// returned [`Clustering`] carries.
pub trait ClusterAlgorithm {
    /// The registry name of this algorithm.
    fn name(&self) -> &'static str;

    /// Cluster the row-major feature matrix `x` and return one label per row.
    fn fit(&self, x: &[Vec<f64>]) -> Result<Clustering, ClusterError>;
}

impl std::fmt::Debug for dyn ClusterAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterAlgorithm")
            .field("name", &self.name())
            .finish()
    }
}

/// Validate matrix shape against a requested cluster count.
///
/// Returns the feature dimensionality on success.
pub(crate) fn check_matrix(x: &[Vec<f64>], k: usize) -> Result<usize, ClusterError> {
    if x.is_empty() {
        return Err(ClusterError::EmptyInput);
    }
    let dims = x[0].len();
    for (index, row) in x.iter().enumerate() {
        if row.len() != dims {
            return Err(ClusterError::DimensionMismatch {
                index,
                expected: dims,
                found: row.len(),
            });
        }
    }
    if x.len() < k {
        return Err(ClusterError::TooFewSamples {
            n_samples: x.len(),
            k,
        });
    }
    Ok(dims)
}

/// Squared Euclidean distance between two equal-length vectors.
pub(crate) fn sq_dist(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x - y).powi(2))
        .sum()
}
