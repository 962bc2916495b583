//! K-sweep: run K-means across a range of cluster counts and pick the elbow.

use tracing::{info, instrument};

use crate::error::ClusterError;
use crate::kmeans::{multi_restart, KMeansConfig};

/// Configuration for an inertia sweep over a range of cluster counts.
///
/// Each `k` in `min_k..=max_k` is fitted with the same multi-restart K-means
/// settings; a configured seed makes the whole sweep reproducible.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    min_k: usize,
    max_k: usize,
    n_init: usize,
    max_iter: usize,
    tol: f64,
    seed: Option<u64>,
}

impl SweepConfig {
    /// Create a sweep over `min_k..=max_k`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::InvalidK`] | `min_k` is zero |
    /// | [`ClusterError::InvalidKRange`] | `min_k > max_k` |
    pub fn new(min_k: usize, max_k: usize) -> Result<Self, ClusterError> {
        if min_k == 0 {
            return Err(ClusterError::InvalidK { k: min_k });
        }
        if min_k > max_k {
            return Err(ClusterError::InvalidKRange { min_k, max_k });
        }
        Ok(Self {
            min_k,
            max_k,
            n_init: 10,
            max_iter: 100,
            tol: 1e-4,
            seed: None,
        })
    }

    /// Set the number of restarts per k.
    #[must_use]
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Set the maximum Lloyd iterations per restart.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the convergence tolerance.
    #[must_use]
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the random seed shared by every k in the sweep.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Return the inclusive sweep range.
    #[must_use]
    pub fn range(&self) -> (usize, usize) {
        (self.min_k, self.max_k)
    }

    /// Run the sweep over `x` and collect one inertia point per k.
    ///
    /// # Errors
    ///
    /// Propagates any [`ClusterError`] from the underlying K-means runs,
    /// including [`ClusterError::TooFewSamples`] when `max_k` exceeds the
    /// sample count.
    #[instrument(skip(self, x), fields(min_k = self.min_k, max_k = self.max_k))]
    pub fn fit(&self, x: &[Vec<f64>]) -> Result<ElbowCurve, ClusterError> {
        let mut points = Vec::with_capacity(self.max_k - self.min_k + 1);

        for k in self.min_k..=self.max_k {
            let mut config = KMeansConfig::new(k)?
                .with_n_init(self.n_init)
                .with_max_iter(self.max_iter)
                .with_tol(self.tol);
            if let Some(seed) = self.seed {
                config = config.with_seed(seed);
            }

            let best = multi_restart(x, &config)?;
            info!(k, inertia = best.inertia.value(), "sweep point");
            points.push(KPoint {
                k,
                inertia: best.inertia.value(),
            });
        }

        Ok(ElbowCurve { points })
    }
}

/// One point on the inertia-vs-k curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KPoint {
    /// Cluster count.
    pub k: usize,
    /// Best inertia over all restarts at this k.
    pub inertia: f64,
}

/// The inertia-vs-k curve produced by a sweep.
#[derive(Debug, Clone)]
pub struct ElbowCurve {
    points: Vec<KPoint>,
}

impl ElbowCurve {
    /// Return the swept points in ascending k order.
    #[must_use]
    pub fn points(&self) -> &[KPoint] {
        &self.points
    }

    /// Return the elbow: the k with the sharpest bend in the inertia curve,
    /// measured by the largest discrete second difference.
    ///
    /// With fewer than three points there is no interior bend to measure, so
    /// the smallest swept k is returned.
    #[must_use]
    pub fn best_k(&self) -> usize {
        if self.points.len() < 3 {
            return self.points[0].k;
        }

        let mut best_k = self.points[1].k;
        let mut best_bend = f64::NEG_INFINITY;
        for window in self.points.windows(3) {
            let bend = window[0].inertia - 2.0 * window[1].inertia + window[2].inertia;
            if bend > best_bend {
                best_bend = bend;
                best_k = window[1].k;
            }
        }
        best_k
    }
}
