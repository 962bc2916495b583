//! K-means++ initialization (private module).
//!
//! Selects initial centroid indices with probability proportional to the
//! squared Euclidean distance from each candidate to the nearest
//! already-chosen centroid. This improves convergence speed and final
//! clustering quality compared to uniform random initialization.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::algorithm::sq_dist;

/// Select `k` initial centroid indices from `x` using K-means++ seeding.
///
/// Returns a `Vec<usize>` of length `k` containing distinct indices into
/// `x`. The first centroid is chosen uniformly at random; each subsequent
/// centroid is drawn with probability proportional to the squared distance
/// from that sample to the nearest already-chosen centroid.
///
/// # Panics
///
/// Panics in debug mode if `k == 0` or `k > x.len()`.
#[must_use]
pub(crate) fn kmeans_plus_plus(x: &[Vec<f64>], k: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
    let n = x.len();
    debug_assert!(k > 0, "k must be at least 1");
    debug_assert!(k <= n, "k must not exceed the number of samples");

    let mut chosen: Vec<usize> = Vec::with_capacity(k);

    // First centroid: uniform random.
    let first = rng.gen_range(0..n);
    chosen.push(first);

    for _ in 1..k {
        // D²(i) = squared distance to the nearest chosen centroid.
        // Parallelized over the n samples; the inner loop over `chosen` is
        // sequential because chosen.len() <= k-1 is small.
        let weights: Vec<f64> = (0..n)
            .into_par_iter()
            .map(|i| {
                // Already-chosen samples get weight 0 so they are never re-selected.
                if chosen.contains(&i) {
                    return 0.0;
                }
                chosen
                    .iter()
                    .map(|&j| sq_dist(&x[i], &x[j]))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();

        let total_weight: f64 = weights.iter().sum();

        if total_weight == 0.0 {
            // All remaining samples coincide with existing centroids
            // (duplicate rows). Fall back to any unchosen index.
            let fallback = (0..n)
                .find(|i| !chosen.contains(i))
                .expect("k <= n guarantees an unchosen index exists");
            chosen.push(fallback);
            continue;
        }

        // Weighted random sampling: draw a threshold and walk the cumsum.
        let threshold: f64 = rng.gen_range(0.0..total_weight);
        let mut cumsum = 0.0;
        let mut selected = n - 1;
        for (i, &w) in weights.iter().enumerate() {
            cumsum += w;
            if cumsum > threshold {
                selected = i;
                break;
            }
        }

        chosen.push(selected);
    }

    chosen
}
