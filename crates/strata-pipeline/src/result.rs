//! The unified result of one orchestrated clustering run.

use std::collections::BTreeMap;

use strata_cluster::ClusterLabel;
use strata_io::Dataset;

/// Everything a clustering run produced, assembled once and immutable.
///
/// `dataset()` is the caller's original table with the integer label column
/// appended. Centroids and metrics carry over from the adapter: absent
/// capabilities stay absent (`None` / empty map) rather than being filled
/// with placeholders.
#[derive(Debug, Clone)]
pub struct ClusteringRun {
    dataset: Dataset,
    labels: Vec<ClusterLabel>,
    centroids: Option<Vec<Vec<f64>>>,
    metrics: BTreeMap<String, f64>,
}

impl ClusteringRun {
    pub(crate) fn new(
        dataset: Dataset,
        labels: Vec<ClusterLabel>,
        centroids: Option<Vec<Vec<f64>>>,
        metrics: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            dataset,
            labels,
            centroids,
            metrics,
        }
    }

    /// Return the labeled dataset: original columns plus the label column.
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Return the cluster assignment, one label per input row.
    #[must_use]
    pub fn labels(&self) -> &[ClusterLabel] {
        &self.labels
    }

    /// Return the cluster centers, for algorithms that define them.
    #[must_use]
    pub fn centroids(&self) -> Option<&[Vec<f64>]> {
        self.centroids.as_deref()
    }

    /// Return the named metrics the adapter reported.
    #[must_use]
    pub fn metrics(&self) -> &BTreeMap<String, f64> {
        &self.metrics
    }

    /// Return the inertia metric, when present.
    #[must_use]
    pub fn inertia(&self) -> Option<f64> {
        self.metrics.get(strata_cluster::METRIC_INERTIA).copied()
    }

    /// Return the number of samples assigned to each cluster.
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
