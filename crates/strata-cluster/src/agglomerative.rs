//! Hierarchical clustering: bottom-up agglomerative merging.
//!
//! Starts with every sample in its own cluster and repeatedly merges the
//! closest pair under the configured linkage until `k` clusters remain.
//! Deterministic by construction, so no seed is involved.

use std::collections::BTreeMap;

use tracing::{debug, info, instrument};

use crate::algorithm::{check_matrix, sq_dist, ClusterAlgorithm, Clustering};
use crate::error::ClusterError;
use crate::label::ClusterLabel;

/// Inter-cluster distance definition used during merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Linkage {
    /// Distance between the closest pair of members.
    Single,
    /// Distance between the farthest pair of members.
    Complete,
    /// Mean distance over all member pairs.
    #[default]
    Average,
    /// Increase in within-cluster variance caused by the merge.
    Ward,
}

/// Configuration for agglomerative (bottom-up hierarchical) clustering.
///
/// Construct via [`AgglomerativeConfig::new`]; linkage defaults to
/// [`Linkage::Average`].
#[derive(Debug, Clone)]
pub struct AgglomerativeConfig {
    pub(crate) k: usize,
    pub(crate) linkage: Linkage,
}

impl AgglomerativeConfig {
    /// Create a new agglomerative configuration with the given cluster count.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::InvalidK`] | `k` is zero |
    pub fn new(k: usize) -> Result<Self, ClusterError> {
        if k == 0 {
            return Err(ClusterError::InvalidK { k });
        }
        Ok(Self {
            k,
            linkage: Linkage::default(),
        })
    }

    /// Set the linkage criterion.
    #[must_use]
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    /// Return the number of clusters.
    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Return the linkage criterion.
    #[must_use]
    pub fn linkage(&self) -> Linkage {
        self.linkage
    }
}

impl ClusterAlgorithm for AgglomerativeConfig {
    fn name(&self) -> &'static str {
        "agglomerative"
    }

    /// Cluster `x` and return labels only.
    ///
    /// Agglomerative clustering defines no centroids and no objective value,
    /// so `centroids` is `None` and `metrics` is empty in the result.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::EmptyInput`] | `x` has zero rows |
    /// | [`ClusterError::DimensionMismatch`] | Rows differ in length |
    /// | [`ClusterError::TooFewSamples`] | `x.len() < k` |
    #[instrument(skip(self, x), fields(k = self.k, linkage = ?self.linkage, n_samples = x.len()))]
    fn fit(&self, x: &[Vec<f64>]) -> Result<Clustering, ClusterError> {
        check_matrix(x, self.k)?;
        let n = x.len();

        // Each active cluster holds the indices of its members.
        let mut clusters: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();

        while clusters.len() > self.k {
            let (a, b) = closest_pair(x, &clusters, self.linkage);

            debug!(
                merged_a = a,
                merged_b = b,
                remaining = clusters.len() - 1,
                "merged closest pair"
            );

            // Merge b into a; b > a always holds, so removal keeps a valid.
            let absorbed = clusters.swap_remove(b);
            clusters[a].extend(absorbed);
        }

        let labels = assign_labels(n, &clusters);

        info!(
            k = self.k,
            n_samples = n,
            "agglomerative clustering complete"
        );

        Ok(Clustering {
            labels,
            centroids: None,
            metrics: BTreeMap::new(),
        })
    }
}

/// Find the pair of active clusters with minimum linkage distance.
///
/// Ties are broken toward the lexicographically smallest `(a, b)` pair, which
/// keeps the merge order deterministic. Returns `(a, b)` with `a < b`.
fn closest_pair(x: &[Vec<f64>], clusters: &[Vec<usize>], linkage: Linkage) -> (usize, usize) {
    let mut best = (0usize, 1usize);
    let mut best_dist = f64::INFINITY;

    for a in 0..clusters.len() {
        for b in (a + 1)..clusters.len() {
            let d = cluster_distance(x, &clusters[a], &clusters[b], linkage);
            if d < best_dist {
                best_dist = d;
                best = (a, b);
            }
        }
    }

    best
}

/// Linkage distance between two clusters, given their member indices.
fn cluster_distance(x: &[Vec<f64>], a: &[usize], b: &[usize], linkage: Linkage) -> f64 {
    match linkage {
        Linkage::Single => pair_distances(x, a, b).fold(f64::INFINITY, f64::min),
        Linkage::Complete => pair_distances(x, a, b).fold(f64::NEG_INFINITY, f64::max),
        Linkage::Average => {
            let count = (a.len() * b.len()) as f64;
            pair_distances(x, a, b).sum::<f64>() / count
        }
        Linkage::Ward => {
            // Increase in total within-cluster variance when merging a and b:
            // (|a||b| / (|a|+|b|)) * ||mean(a) - mean(b)||^2
            let mean_a = mean_of(x, a);
            let mean_b = mean_of(x, b);
            let na = a.len() as f64;
            let nb = b.len() as f64;
            na * nb / (na + nb) * sq_dist(&mean_a, &mean_b)
        }
    }
}

/// Iterator over Euclidean distances between all cross-cluster member pairs.
fn pair_distances<'a>(
    x: &'a [Vec<f64>],
    a: &'a [usize],
    b: &'a [usize],
) -> impl Iterator<Item = f64> + 'a {
    a.iter()
        .flat_map(move |&i| b.iter().map(move |&j| sq_dist(&x[i], &x[j]).sqrt()))
}

/// Mean point of the given member indices.
fn mean_of(x: &[Vec<f64>], members: &[usize]) -> Vec<f64> {
    let dims = x[0].len();
    let mut mean = vec![0.0; dims];
    for &i in members {
        for (d, v) in mean.iter_mut().zip(&x[i]) {
            *d += v;
        }
    }
    let count = members.len() as f64;
    for d in &mut mean {
        *d /= count;
    }
    mean
}

/// Turn cluster member lists into per-sample labels.
///
/// Labels are renumbered by order of first appearance in the input, so the
/// sample at the lowest row index always gets label 0.
fn assign_labels(n: usize, clusters: &[Vec<usize>]) -> Vec<ClusterLabel> {
    let mut raw = vec![usize::MAX; n];
    for (c, members) in clusters.iter().enumerate() {
        for &i in members {
            raw[i] = c;
        }
    }

    let mut remap: Vec<Option<usize>> = vec![None; clusters.len()];
    let mut next = 0usize;
    raw.into_iter()
        .map(|c| {
            let label = *remap[c].get_or_insert_with(|| {
                let l = next;
                next += 1;
                l
            });
            ClusterLabel::new(label)
        })
        .collect()
}
