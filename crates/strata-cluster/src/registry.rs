//! Name-based algorithm lookup.
//!
//! The registry maps selector strings to builder functions so callers can
//! resolve an algorithm by name before any data is loaded. Unknown selectors
//! fail fast with the list of registered names.

use std::collections::BTreeMap;

use crate::agglomerative::AgglomerativeConfig;
use crate::algorithm::ClusterAlgorithm;
use crate::error::ClusterError;
use crate::kmeans::KMeansConfig;

/// Algorithm-agnostic parameters used to build a registered adapter.
///
/// Adapters take what they need and ignore the rest: K-means consumes the
/// seed, agglomerative does not.
#[derive(Debug, Clone)]
pub struct AlgorithmSpec {
    /// Requested number of clusters.
    pub n_clusters: usize,
    /// Random seed for stochastic algorithms; `None` means non-reproducible.
    pub seed: Option<u64>,
}

type BuilderFn = fn(&AlgorithmSpec) -> Result<Box<dyn ClusterAlgorithm>, ClusterError>;

/// Registry of clustering algorithms addressable by name.
pub struct AlgorithmRegistry {
    builders: BTreeMap<&'static str, BuilderFn>,
}

impl Default for AlgorithmRegistry {
    /// Registry with the built-in adapters: `"kmeans"` and `"agglomerative"`.
    fn default() -> Self {
        let mut registry = Self {
            builders: BTreeMap::new(),
        };
        registry.register("kmeans", build_kmeans);
        registry.register("agglomerative", build_agglomerative);
        registry
    }
}

impl AlgorithmRegistry {
    /// Register a builder under `name`, replacing any previous entry.
    pub fn register(&mut self, name: &'static str, builder: BuilderFn) {
        self.builders.insert(name, builder);
    }

    /// Return the registered algorithm names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.builders.keys().copied().collect()
    }

    /// Build the algorithm registered under `name`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::UnknownAlgorithm`] | `name` is not registered |
    /// | [`ClusterError::InvalidK`] | `spec.n_clusters` is zero |
    pub fn build(
        &self,
        name: &str,
        spec: &AlgorithmSpec,
    ) -> Result<Box<dyn ClusterAlgorithm>, ClusterError> {
        let builder = self
            .builders
            .get(name)
            .ok_or_else(|| ClusterError::UnknownAlgorithm {
                name: name.to_string(),
                supported: self.names().join(", "),
            })?;
        builder(spec)
    }
}

fn build_kmeans(spec: &AlgorithmSpec) -> Result<Box<dyn ClusterAlgorithm>, ClusterError> {
    let mut config = KMeansConfig::new(spec.n_clusters)?;
    if let Some(seed) = spec.seed {
        config = config.with_seed(seed);
    }
    Ok(Box::new(config))
}

fn build_agglomerative(spec: &AlgorithmSpec) -> Result<Box<dyn ClusterAlgorithm>, ClusterError> {
    let config = AgglomerativeConfig::new(spec.n_clusters)?;
    Ok(Box::new(config))
}
