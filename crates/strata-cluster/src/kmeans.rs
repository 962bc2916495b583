//! Partition-based clustering: Euclidean K-means.
//!
//! Provides the assign/update Lloyd loop, k-means++ seeding, and
//! multi-restart orchestration behind the [`KMeansConfig`] builder.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::algorithm::{check_matrix, sq_dist, ClusterAlgorithm, Clustering, METRIC_INERTIA};
use crate::error::ClusterError;
use crate::inertia::Inertia;
use crate::init::kmeans_plus_plus;
use crate::label::ClusterLabel;

/// Configuration for Euclidean K-means clustering.
///
/// Construct via [`KMeansConfig::new`], then chain `with_*` methods to
/// override defaults.
///
/// # Defaults
///
/// | Parameter  | Default |
/// |------------|---------|
/// | `n_init`   | 10      |
/// | `max_iter` | 100     |
/// | `tol`      | 1e-4    |
/// | `seed`     | unset (non-reproducible) |
#[derive(Debug, Clone)]
pub struct KMeansConfig {
    pub(crate) k: usize,
    pub(crate) n_init: usize,
    pub(crate) max_iter: usize,
    pub(crate) tol: f64,
    pub(crate) seed: Option<u64>,
}

impl KMeansConfig {
    /// Create a new K-means configuration with the given cluster count.
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
            n_init: 10,
            max_iter: 100,
            tol: 1e-4,
            seed: None,
        })
    }

    /// Set the number of independent restarts. Higher values reduce the risk
    /// of converging to a poor local minimum.
    #[must_use]
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Set the maximum number of Lloyd iterations per restart.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the convergence tolerance. Iteration stops when the inertia
    /// improvement falls below this threshold.
    #[must_use]
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the random seed used for k-means++ seeding and restart derivation.
    ///
    /// When left unset, a master seed is drawn once from the thread RNG and
    /// results are not reproducible across runs.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Return the number of clusters.
    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Return the number of independent restarts.
    #[must_use]
    pub fn n_init(&self) -> usize {
        self.n_init
    }

    /// Return the maximum number of Lloyd iterations per restart.
    #[must_use]
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Return the convergence tolerance.
    #[must_use]
    pub fn tol(&self) -> f64 {
        self.tol
    }

    /// Return the random seed, if one was set.
    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl ClusterAlgorithm for KMeansConfig {
    fn name(&self) -> &'static str {
        "kmeans"
    }

    /// Cluster `x` and return labels, centroids, and the inertia metric.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::EmptyInput`] | `x` has zero rows |
    /// | [`ClusterError::DimensionMismatch`] | Rows differ in length |
    /// | [`ClusterError::TooFewSamples`] | `x.len() < k` |
    fn fit(&self, x: &[Vec<f64>]) -> Result<Clustering, ClusterError> {
        check_matrix(x, self.k)?;
        let best = multi_restart(x, self)?;

        let mut metrics = BTreeMap::new();
        metrics.insert(METRIC_INERTIA.to_string(), best.inertia.value());

        Ok(Clustering {
            labels: best.labels,
            centroids: Some(best.centroids),
            metrics,
        })
    }
}

// ── Internal run result ──────────────────────────────────────────────────────

/// Result of a single K-means restart (and of the best restart overall).
pub(crate) struct BestRun {
    pub(crate) labels: Vec<ClusterLabel>,
    pub(crate) centroids: Vec<Vec<f64>>,
    pub(crate) inertia: Inertia,
}

// ── assign ───────────────────────────────────────────────────────────────────

/// Assign each sample to its nearest centroid and compute total inertia.
///
/// Inertia is the sum of squared Euclidean distances from each sample to its
/// assigned centroid. The per-sample computation is parallelized with rayon.
fn assign(x: &[Vec<f64>], centroids: &[Vec<f64>]) -> (Vec<ClusterLabel>, Inertia) {
    let results: Vec<(ClusterLabel, f64)> = x
        .par_iter()
        .map(|row| {
            let mut best_label = 0usize;
            let mut best_dist = f64::INFINITY;
            for (c_idx, centroid) in centroids.iter().enumerate() {
                let d = sq_dist(row, centroid);
                if d < best_dist {
                    best_dist = d;
                    best_label = c_idx;
                }
            }
            (ClusterLabel::new(best_label), best_dist)
        })
        .collect();

    let inertia_value: f64 = results.iter().map(|(_, d)| d).sum();
    let labels: Vec<ClusterLabel> = results.into_iter().map(|(label, _)| label).collect();

    (labels, Inertia::new(inertia_value))
}

// ── update ───────────────────────────────────────────────────────────────────

/// Recompute centroids as per-cluster means, rescuing any empty cluster by
/// stealing the sample farthest from its centroid in the largest cluster.
fn update(
    x: &[Vec<f64>],
    labels: &[ClusterLabel],
    k: usize,
    prev_centroids: &[Vec<f64>],
) -> Vec<Vec<f64>> {
    let dims = x[0].len();

    // Step 1: build per-cluster index groups.
    let mut groups: Vec<Vec<usize>> = vec![Vec::new(); k];
    for (i, label) in labels.iter().enumerate() {
        groups[label.index()].push(i);
    }

    // Step 2: rescue empty clusters one at a time. More than one cluster may
    // be empty, so repeat until all are occupied or no donor remains.
    while let Some(empty_label) = groups.iter().position(Vec::is_empty) {
        let largest_label = groups
            .iter()
            .enumerate()
            .max_by_key(|(_, g)| g.len())
            .map(|(c, _)| c)
            .expect("k >= 1 guarantees at least one group");

        if groups[largest_label].len() <= 1 {
            // Every occupied cluster is a singleton; leave the remaining
            // empty clusters at their previous centroids.
            break;
        }

        // Steal the member of the largest cluster farthest from its centroid.
        let centroid = &prev_centroids[largest_label];
        let farthest_pos = groups[largest_label]
            .iter()
            .enumerate()
            .max_by(|&(_, a), &(_, b)| {
                sq_dist(&x[*a], centroid).total_cmp(&sq_dist(&x[*b], centroid))
            })
            .map(|(pos, _)| pos)
            .expect("largest group is non-empty");

        let stolen_idx = groups[largest_label].swap_remove(farthest_pos);
        groups[empty_label].push(stolen_idx);

        debug!(
            empty_cluster = empty_label,
            donor_cluster = largest_label,
            stolen_sample = stolen_idx,
            "rescued empty cluster"
        );
    }

    // Step 3: mean of each group; empty groups (unrescuable) keep their
    // previous centroid.
    groups
        .iter()
        .enumerate()
        .map(|(c, group)| {
            if group.is_empty() {
                return prev_centroids[c].clone();
            }
            let mut mean = vec![0.0; dims];
            for &i in group {
                for (d, v) in mean.iter_mut().zip(&x[i]) {
                    *d += v;
                }
            }
            let count = group.len() as f64;
            for d in &mut mean {
                *d /= count;
            }
            mean
        })
        .collect()
}

// ── run_once ─────────────────────────────────────────────────────────────────

/// Run a single K-means restart seeded with `seed`.
#[instrument(skip(x, config), fields(k = config.k, seed))]
fn run_once(x: &[Vec<f64>], config: &KMeansConfig, seed: u64) -> BestRun {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let init_indices = kmeans_plus_plus(x, config.k, &mut rng);
    let mut centroids: Vec<Vec<f64>> = init_indices.iter().map(|&i| x[i].clone()).collect();

    let mut labels: Vec<ClusterLabel> = Vec::new();
    let mut inertia = Inertia::new(f64::INFINITY);
    let mut prev_inertia: Option<f64> = None;
    let mut converged = false;
    let mut iterations = 0usize;

    for iteration in 0..config.max_iter {
        iterations = iteration + 1;

        let (new_labels, new_inertia) = assign(x, &centroids);
        labels = new_labels;

        // Convergence check (skipped on the very first iteration).
        if let Some(prev) = prev_inertia {
            if (prev - new_inertia.value()).abs() < config.tol {
                inertia = new_inertia;
                converged = true;
                debug!(iteration, "converged");
                break;
            }
        }

        prev_inertia = Some(new_inertia.value());
        inertia = new_inertia;

        centroids = update(x, &labels, config.k, &centroids);

        debug!(iteration, inertia = inertia.value(), "iteration complete");
    }

    info!(
        seed,
        iterations,
        inertia = inertia.value(),
        converged,
        "single restart complete"
    );

    BestRun {
        labels,
        centroids,
        inertia,
    }
}

// ── multi_restart ────────────────────────────────────────────────────────────

/// Run `config.n_init` independent K-means restarts and return the best result.
///
/// Restarts are executed in parallel. Sub-seeds are derived deterministically
/// from the master seed, so a configured seed makes the whole computation
/// reproducible; an unset seed draws the master seed from the thread RNG.
#[instrument(skip(x, config), fields(k = config.k, n_init = config.n_init))]
pub(crate) fn multi_restart(x: &[Vec<f64>], config: &KMeansConfig) -> Result<BestRun, ClusterError> {
    check_matrix(x, config.k)?;

    let master_seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut master_rng = ChaCha8Rng::seed_from_u64(master_seed);
    let n_init = config.n_init.max(1);
    let seeds: Vec<u64> = (0..n_init).map(|_| master_rng.gen()).collect();

    let runs: Vec<BestRun> = seeds
        .into_par_iter()
        .map(|seed| run_once(x, config, seed))
        .collect();

    let best = runs
        .into_iter()
        .min_by(|a, b| {
            match a.inertia.total_cmp(&b.inertia) {
                // Ties broken by earlier restart for determinism.
                Ordering::Equal => Ordering::Less,
                other => other,
            }
        })
        .expect("n_init >= 1 guarantees at least one run");

    info!(
        k = config.k,
        n_init,
        best_inertia = best.inertia.value(),
        "multi-restart complete"
    );

    Ok(best)
}

// ── tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::algorithm::ClusterAlgorithm;
    use crate::error::ClusterError;

    use super::KMeansConfig;

    /// Nine points in three tight groups near 0, 5, and 10.
    fn archetype() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.0, 0.1],
            vec![5.0, 5.0],
            vec![5.1, 5.0],
            vec![5.0, 5.1],
            vec![10.0, 10.0],
            vec![10.1, 10.0],
            vec![10.0, 10.1],
        ]
    }

    fn config(k: usize, n_init: usize, seed: u64) -> KMeansConfig {
        KMeansConfig::new(k)
            .unwrap()
            .with_n_init(n_init)
            .with_seed(seed)
    }

    #[test]
    fn new_k_zero() {
        let result = KMeansConfig::new(0);
        assert!(matches!(result, Err(ClusterError::InvalidK { k: 0 })));
    }

    #[test]
    fn builder_chaining() {
        let cfg = KMeansConfig::new(3).unwrap().with_n_init(5).with_seed(99);
        assert_eq!(cfg.n_init(), 5);
        assert_eq!(cfg.seed(), Some(99));
        assert_eq!(cfg.k(), 3);
    }

    #[test]
    fn defaults_are_correct() {
        let cfg = KMeansConfig::new(1).unwrap();
        assert_eq!(cfg.n_init(), 10);
        assert_eq!(cfg.max_iter(), 100);
        assert!((cfg.tol() - 1e-4).abs() < f64::EPSILON);
        assert_eq!(cfg.seed(), None);
    }

    #[test]
    fn trivial_k_one() {
        let x = archetype();
        let result = config(1, 1, 0).fit(&x).unwrap();

        assert_eq!(result.centroids.as_ref().unwrap().len(), 1);
        assert!(result.labels.iter().all(|l| l.index() == 0));
        assert!(result.inertia().unwrap() > 0.0);
    }

    #[test]
    fn three_well_separated_clusters() {
        let x = archetype();
        let result = config(3, 5, 42).fit(&x).unwrap();

        assert_eq!(result.centroids.as_ref().unwrap().len(), 3);
        assert_eq!(result.labels.len(), 9);

        // Each group of three consecutive points must share a label, and the
        // three groups must get three distinct labels.
        for g in 0..3 {
            let base = result.labels[g * 3];
            assert_eq!(result.labels[g * 3 + 1], base, "group {g} split");
            assert_eq!(result.labels[g * 3 + 2], base, "group {g} split");
        }
        let mut seen: Vec<usize> = (0..3).map(|g| result.labels[g * 3].index()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 3, "groups must form distinct clusters");
    }

    #[test]
    fn identical_rows_zero_inertia() {
        let x = vec![vec![1.0, 2.0]; 4];
        let result = config(1, 1, 7).fit(&x).unwrap();
        assert!(result.inertia().unwrap() < 1e-10);
    }

    #[test]
    fn inertia_non_negative() {
        let x = archetype();
        let result = config(2, 3, 1).fit(&x).unwrap();
        assert!(result.inertia().unwrap() >= 0.0);
    }

    #[test]
    fn deterministic_under_fixed_seed() {
        let x = archetype();
        let cfg = config(3, 5, 99);

        let r1 = cfg.fit(&x).unwrap();
        let r2 = cfg.fit(&x).unwrap();

        assert_eq!(r1.labels, r2.labels, "results must be deterministic");
        assert_eq!(r1.inertia(), r2.inertia());
    }

    #[test]
    fn too_few_samples() {
        let x = vec![vec![1.0], vec![2.0]];
        let result = config(3, 1, 0).fit(&x);
        assert!(matches!(
            result,
            Err(ClusterError::TooFewSamples { n_samples: 2, k: 3 })
        ));
    }

    #[test]
    fn label_and_centroid_count_invariants() {
        let x = archetype();
        let result = config(3, 3, 5).fit(&x).unwrap();

        assert_eq!(result.labels.len(), 9, "one label per sample");
        assert_eq!(result.centroids.as_ref().unwrap().len(), 3, "k centroids");
        assert!(result.labels.iter().all(|l| l.index() < 3));
        for centroid in result.centroids.as_ref().unwrap() {
            assert_eq!(centroid.len(), 2, "centroids live in feature space");
        }
    }

    #[test]
    fn centroid_of_single_cluster_is_mean() {
        let x = vec![vec![0.0, 0.0], vec![2.0, 4.0]];
        let result = config(1, 1, 0).fit(&x).unwrap();
        let centroids = result.centroids.unwrap();
        assert!((centroids[0][0] - 1.0).abs() < 1e-12);
        assert!((centroids[0][1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn reports_inertia_metric() {
        let x = archetype();
        let result = config(3, 3, 42).fit(&x).unwrap();
        assert!(result.metrics.contains_key("inertia"));
    }
}
