//! End-to-end integration tests: CSV -> select -> standardise -> cluster -> CSV.

use std::fs;
use std::io::Write;

use strata_cluster::SweepConfig;
use strata_io::{ColumnValues, TableReader};
use strata_pipeline::{
    run_clustering_csv, select_features, standardise_features, PipelineError, RunSpec,
    LABEL_COLUMN,
};
use tempfile::TempDir;

/// Three well-separated groups of two sites each, plus a text column.
const FIXTURE: &str = "site,x,y\n\
                       a,0.0,0.0\n\
                       b,0.1,0.1\n\
                       c,5.0,5.0\n\
                       d,5.1,5.1\n\
                       e,10.0,10.0\n\
                       f,10.1,10.1\n";

fn write_fixture(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("sites.csv");
    let mut file = fs::File::create(&path).unwrap();
    file.write_all(FIXTURE.as_bytes()).unwrap();
    path
}

#[test]
fn csv_to_labeled_csv_round_trip() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir);
    let output = dir.path().join("labeled.csv");

    let spec = RunSpec::new(vec!["x".into(), "y".into()], "kmeans", 3)
        .with_seed(42)
        .with_output_path(&output);
    let run = run_clustering_csv(&input, &spec).unwrap();

    // Result invariants.
    assert_eq!(run.labels().len(), 6);
    assert!(run.labels().iter().all(|l| l.index() < 3));
    assert_eq!(run.centroids().unwrap().len(), 3);
    assert!(run.inertia().unwrap() >= 0.0);

    // Sites near the same point share a cluster; the three pairs differ.
    assert_eq!(run.labels()[0], run.labels()[1]);
    assert_eq!(run.labels()[2], run.labels()[3]);
    assert_eq!(run.labels()[4], run.labels()[5]);
    let mut distinct: Vec<usize> = [0, 2, 4].iter().map(|&i| run.labels()[i].index()).collect();
    distinct.sort_unstable();
    distinct.dedup();
    assert_eq!(distinct.len(), 3);

    // The written file reads back with the original columns plus the labels.
    let written = TableReader::new(&output).read().unwrap();
    assert_eq!(written.column_names(), vec!["site", "x", "y", LABEL_COLUMN]);
    assert_eq!(written.n_rows(), 6);

    let labels = written.column(LABEL_COLUMN).unwrap();
    match labels.values() {
        ColumnValues::Integer(v) => {
            let expected: Vec<i64> = run.labels().iter().map(|l| l.index() as i64).collect();
            assert_eq!(v, &expected);
        }
        other => panic!("label column should read back as integer, got {other:?}"),
    }
}

#[test]
fn agglomerative_csv_run() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir);

    let spec = RunSpec::new(vec!["x".into(), "y".into()], "agglomerative", 3);
    let run = run_clustering_csv(&input, &spec).unwrap();

    assert_eq!(run.labels().len(), 6);
    assert!(run.centroids().is_none());
    assert!(run.metrics().is_empty());

    // Deterministic without a seed: hierarchical merging has no randomness.
    let again = run_clustering_csv(&input, &spec).unwrap();
    assert_eq!(run.labels(), again.labels());
}

#[test]
fn kmeans_and_agglomerative_agree_on_clean_data() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir);

    let km = run_clustering_csv(
        &input,
        &RunSpec::new(vec!["x".into(), "y".into()], "kmeans", 3).with_seed(42),
    )
    .unwrap();
    let agg = run_clustering_csv(
        &input,
        &RunSpec::new(vec!["x".into(), "y".into()], "agglomerative", 3),
    )
    .unwrap();

    // Same partition up to label renaming: pairs grouped identically.
    for i in 0..6 {
        for j in (i + 1)..6 {
            assert_eq!(
                km.labels()[i] == km.labels()[j],
                agg.labels()[i] == agg.labels()[j],
                "rows {i} and {j} grouped differently across algorithms"
            );
        }
    }
}

#[test]
fn six_rows_two_clusters_shape() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir);

    let spec = RunSpec::new(vec!["x".into(), "y".into()], "kmeans", 2).with_seed(42);
    let run = run_clustering_csv(&input, &spec).unwrap();

    assert_eq!(run.labels().len(), 6);
    assert!(run.labels().iter().all(|l| l.index() < 2));
    let centroids = run.centroids().unwrap();
    assert_eq!(centroids.len(), 2);
    assert!(centroids.iter().all(|c| c.len() == 2));
    assert!(run.inertia().unwrap() >= 0.0);
}

#[test]
fn unknown_algorithm_never_touches_output() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir);
    let output = dir.path().join("labeled.csv");

    let spec = RunSpec::new(vec!["x".into(), "y".into()], "dbscan", 3)
        .with_output_path(&output);
    let err = run_clustering_csv(&input, &spec).unwrap_err();

    assert!(err.to_string().contains("dbscan"), "error names the selector");
    assert!(!output.exists(), "output untouched on unknown algorithm");
}

#[test]
fn persistence_failure_surfaces() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir);
    let output = dir.path().join("no_such_dir").join("labeled.csv");

    let spec = RunSpec::new(vec!["x".into(), "y".into()], "kmeans", 2)
        .with_seed(0)
        .with_output_path(&output);
    let result = run_clustering_csv(&input, &spec);

    assert!(matches!(result, Err(PipelineError::Io(_))));
    assert!(!output.exists(), "no partial output on failure");
}

#[test]
fn text_feature_column_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir);

    let spec = RunSpec::new(vec!["site".into()], "kmeans", 2).with_seed(0);
    let err = run_clustering_csv(&input, &spec).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::NonNumericColumn { ref name } if name == "site"
    ));
}

#[test]
fn missing_input_file_errors() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("absent.csv");

    let spec = RunSpec::new(vec!["x".into()], "kmeans", 2);
    let result = run_clustering_csv(&input, &spec);
    assert!(matches!(result, Err(PipelineError::Io(_))));
}

#[test]
fn standardisation_via_selected_features() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir);

    let dataset = TableReader::new(&input).read().unwrap();
    let matrix = select_features(&dataset, &["x".to_string(), "y".to_string()]).unwrap();
    let scaled = standardise_features(&matrix);

    for j in 0..2 {
        let values: Vec<f64> = scaled.rows().iter().map(|r| r[j]).collect();
        let mean: f64 = values.iter().sum::<f64>() / values.len() as f64;
        assert!(mean.abs() < 1e-12, "column {j} not centered");
    }
}

#[test]
fn elbow_sweep_over_csv_features() {
    // Triangle layout: the k=2 and k=3 inertia drops are comparable, so the
    // bend at the true group count dominates the second difference.
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("triangle.csv");
    let mut file = fs::File::create(&path).unwrap();
    writeln!(file, "x,y").unwrap();
    for (cx, cy) in [(0.0, 0.0), (10.0, 0.0), (5.0, 8.7)] {
        for d in [0.0, 0.1, 0.2] {
            writeln!(file, "{},{}", cx + d, cy).unwrap();
        }
    }

    let dataset = TableReader::new(&path).read().unwrap();
    let matrix = select_features(&dataset, &["x".to_string(), "y".to_string()]).unwrap();

    let elbow = SweepConfig::new(1, 5)
        .unwrap()
        .with_n_init(5)
        .with_seed(42)
        .fit(matrix.rows())
        .unwrap();

    assert_eq!(elbow.points().len(), 5);
    assert_eq!(elbow.best_k(), 3);
}
