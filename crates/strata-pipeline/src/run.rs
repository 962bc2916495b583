//! The orchestrator: select, standardise, cluster, assemble, persist.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use strata_cluster::{AlgorithmRegistry, AlgorithmSpec, ClusterAlgorithm};
use strata_io::{Dataset, TableReader, TableWriter};
use tracing::{info, instrument};

use crate::error::PipelineError;
use crate::preprocess::{select_features, standardise_features};
use crate::result::ClusteringRun;

/// Name of the label column appended to the output dataset.
pub const LABEL_COLUMN: &str = "cluster";

/// Configuration for one orchestrated clustering run.
///
/// Construct via [`RunSpec::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter         | Default |
/// |-------------------|---------|
/// | `standardise`     | `true`  |
/// | `compute_metrics` | `true`  |
/// | `output_path`     | unset (no file written) |
/// | `seed`            | unset (non-reproducible) |
#[derive(Debug, Clone)]
pub struct RunSpec {
    feature_columns: Vec<String>,
    algorithm: String,
    n_clusters: usize,
    standardise: bool,
    output_path: Option<PathBuf>,
    seed: Option<u64>,
    compute_metrics: bool,
}

impl RunSpec {
    /// Create a run spec for the given features, algorithm selector, and
    /// cluster count. The selector is validated when the run starts, not
    /// here, so specs for unregistered algorithms can still be constructed.
    pub fn new(
        feature_columns: Vec<String>,
        algorithm: impl Into<String>,
        n_clusters: usize,
    ) -> Self {
        Self {
            feature_columns,
            algorithm: algorithm.into(),
            n_clusters,
            standardise: true,
            output_path: None,
            seed: None,
            compute_metrics: true,
        }
    }

    /// Enable or disable feature standardisation.
    #[must_use]
    pub fn with_standardise(mut self, standardise: bool) -> Self {
        self.standardise = standardise;
        self
    }

    /// Persist the labeled dataset to `path` after a successful run.
    #[must_use]
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Set the random seed handed to stochastic adapters.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enable or disable metric retention in the result.
    #[must_use]
    pub fn with_compute_metrics(mut self, compute_metrics: bool) -> Self {
        self.compute_metrics = compute_metrics;
        self
    }

    /// Return the requested feature column names.
    #[must_use]
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// Return the algorithm selector.
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Return the requested cluster count.
    #[must_use]
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }
}

/// Run the full pipeline on an already-loaded dataset with the built-in
/// algorithm registry.
///
/// See [`run_clustering_with`] for the step-by-step behavior.
///
/// # Errors
///
/// Propagates every failure from the underlying steps; see
/// [`run_clustering_with`].
pub fn run_clustering(dataset: &Dataset, spec: &RunSpec) -> Result<ClusteringRun, PipelineError> {
    run_clustering_with(dataset, spec, &AlgorithmRegistry::default())
}

/// Run the full pipeline on an already-loaded dataset.
///
/// Steps, in order:
/// 1. Resolve the algorithm selector in `registry` (fail fast: an unknown
///    selector never touches the data or the output destination).
/// 2. Select the requested feature columns.
/// 3. Standardise them, when `spec` requests it.
/// 4. Fit the adapter.
/// 5. Assemble the result: the label column is appended to the *original*
///    dataset, centroids carry over if present, and metrics are retained
///    only when `compute_metrics` is set and the adapter produced any.
/// 6. Persist the labeled dataset when an output path is set. Persistence
///    failure surfaces to the caller; nothing is retried.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`PipelineError::Cluster`] | Unknown selector, bad cluster count, or a fit failure |
/// | [`PipelineError::ColumnNotFound`] | A feature column is missing |
/// | [`PipelineError::NonNumericColumn`] | A feature column holds text |
/// | [`PipelineError::Io`] | Appending the label column or writing the output failed |
#[instrument(skip(dataset, spec, registry), fields(
    algorithm = %spec.algorithm,
    n_clusters = spec.n_clusters,
    n_rows = dataset.n_rows(),
))]
pub fn run_clustering_with(
    dataset: &Dataset,
    spec: &RunSpec,
    registry: &AlgorithmRegistry,
) -> Result<ClusteringRun, PipelineError> {
    let algorithm = registry.build(
        &spec.algorithm,
        &AlgorithmSpec {
            n_clusters: spec.n_clusters,
            seed: spec.seed,
        },
    )?;

    let selected = select_features(dataset, &spec.feature_columns)?;
    let matrix = if spec.standardise {
        standardise_features(&selected)
    } else {
        selected
    };

    let clustering = algorithm.fit(matrix.rows())?;

    let label_values: Vec<i64> = clustering.labels.iter().map(|l| l.index() as i64).collect();
    let labeled = dataset.with_label_column(LABEL_COLUMN, &label_values)?;

    let metrics = if spec.compute_metrics {
        clustering.metrics
    } else {
        BTreeMap::new()
    };

    let run = ClusteringRun::new(labeled, clustering.labels, clustering.centroids, metrics);

    if let Some(path) = &spec.output_path {
        TableWriter::new(path).write(run.dataset())?;
        info!(path = %path.display(), "labeled dataset written");
    }

    info!(
        algorithm = %spec.algorithm,
        n_clusters = spec.n_clusters,
        cluster_sizes = ?run.cluster_sizes(),
        "clustering run complete"
    );

    Ok(run)
}

/// Load a CSV table and run the pipeline on it.
///
/// # Errors
///
/// Propagates [`PipelineError::Io`] from loading plus everything
/// [`run_clustering`] can return.
#[instrument(skip(spec), fields(input = %input.display()))]
pub fn run_clustering_csv(input: &Path, spec: &RunSpec) -> Result<ClusteringRun, PipelineError> {
    let dataset = TableReader::new(input).read()?;
    run_clustering(&dataset, spec)
}

#[cfg(test)]
mod tests {
    use strata_cluster::ClusterError;
    use strata_io::{Column, ColumnValues, Dataset};

    use super::{run_clustering, RunSpec, LABEL_COLUMN};
    use crate::error::PipelineError;

    fn sample() -> Dataset {
        Dataset::new(vec![
            Column::new(
                "site",
                ColumnValues::Text(vec![
                    "a".into(),
                    "b".into(),
                    "c".into(),
                    "d".into(),
                    "e".into(),
                    "f".into(),
                ]),
            ),
            Column::new(
                "x",
                ColumnValues::Numeric(vec![0.0, 0.1, 5.0, 5.1, 10.0, 10.1]),
            ),
            Column::new(
                "y",
                ColumnValues::Numeric(vec![0.0, 0.1, 5.0, 5.1, 10.0, 10.1]),
            ),
        ])
        .unwrap()
    }

    fn spec(algorithm: &str, k: usize) -> RunSpec {
        RunSpec::new(vec!["x".into(), "y".into()], algorithm, k).with_seed(42)
    }

    #[test]
    fn kmeans_run_produces_labels_centroids_metrics() {
        let ds = sample();
        let run = run_clustering(&ds, &spec("kmeans", 3)).unwrap();

        assert_eq!(run.labels().len(), 6);
        assert_eq!(run.centroids().unwrap().len(), 3);
        assert!(run.inertia().is_some());
        assert_eq!(run.cluster_sizes().iter().sum::<usize>(), 6);
    }

    #[test]
    fn agglomerative_run_has_no_centroids_or_metrics() {
        let ds = sample();
        let run = run_clustering(&ds, &spec("agglomerative", 3)).unwrap();

        assert_eq!(run.labels().len(), 6);
        assert!(run.centroids().is_none());
        assert!(run.metrics().is_empty());
        assert!(run.inertia().is_none());
    }

    #[test]
    fn label_column_appended_to_original_dataset() {
        let ds = sample();
        let run = run_clustering(&ds, &spec("kmeans", 2)).unwrap();

        let labeled = run.dataset();
        assert_eq!(labeled.column_names(), vec!["site", "x", "y", LABEL_COLUMN]);
        assert_eq!(labeled.n_rows(), 6);
        // Original dataset untouched.
        assert_eq!(ds.n_columns(), 3);

        let col = labeled.column(LABEL_COLUMN).unwrap();
        match col.values() {
            ColumnValues::Integer(v) => {
                assert_eq!(v.len(), 6);
                let expected: Vec<i64> =
                    run.labels().iter().map(|l| l.index() as i64).collect();
                assert_eq!(v, &expected);
            }
            other => panic!("label column must be integer, got {other:?}"),
        }
    }

    #[test]
    fn unknown_algorithm_fails_fast() {
        let ds = sample();
        let err = run_clustering(&ds, &spec("dbscan", 3)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Cluster(ClusterError::UnknownAlgorithm { .. })
        ));
    }

    #[test]
    fn unknown_algorithm_checked_before_feature_lookup() {
        // Both the selector and the feature list are bad; the selector wins.
        let ds = sample();
        let bad = RunSpec::new(vec!["missing".into()], "dbscan", 3);
        let err = run_clustering(&ds, &bad).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Cluster(ClusterError::UnknownAlgorithm { .. })
        ));
    }

    #[test]
    fn missing_feature_column_propagates() {
        let ds = sample();
        let bad = RunSpec::new(vec!["x".into(), "elevation".into()], "kmeans", 2);
        let err = run_clustering(&ds, &bad).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ColumnNotFound { ref name } if name == "elevation"
        ));
    }

    #[test]
    fn zero_clusters_rejected() {
        let ds = sample();
        let err = run_clustering(&ds, &spec("kmeans", 0)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Cluster(ClusterError::InvalidK { k: 0 })
        ));
    }

    #[test]
    fn compute_metrics_false_strips_metrics() {
        let ds = sample();
        let run = run_clustering(&ds, &spec("kmeans", 2).with_compute_metrics(false)).unwrap();

        assert!(run.metrics().is_empty());
        // Centroids are a capability, not a metric, and survive.
        assert!(run.centroids().is_some());
    }

    #[test]
    fn unstandardised_run_uses_raw_scale() {
        // One dominant-scale feature: without standardisation it decides the
        // clustering alone.
        let ds = Dataset::new(vec![
            Column::new(
                "big",
                ColumnValues::Numeric(vec![0.0, 1000.0, 0.0, 1000.0]),
            ),
            Column::new("small", ColumnValues::Numeric(vec![0.0, 0.0, 1.0, 1.0])),
        ])
        .unwrap();

        let raw = RunSpec::new(vec!["big".into(), "small".into()], "kmeans", 2)
            .with_seed(7)
            .with_standardise(false);
        let run = run_clustering(&ds, &raw).unwrap();

        // Unstandardised: rows 0 and 2 group together (small feature ignored).
        assert_eq!(run.labels()[0], run.labels()[2]);
        assert_eq!(run.labels()[1], run.labels()[3]);
        assert_ne!(run.labels()[0], run.labels()[1]);
    }

    #[test]
    fn deterministic_across_runs_with_seed() {
        let ds = sample();
        let s = spec("kmeans", 3);
        let r1 = run_clustering(&ds, &s).unwrap();
        let r2 = run_clustering(&ds, &s).unwrap();
        assert_eq!(r1.labels(), r2.labels());
        assert_eq!(r1.inertia(), r2.inertia());
    }
}
