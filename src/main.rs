use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use strata_cluster::SweepConfig;
use strata_io::TableReader;
use strata_pipeline::{run_clustering, select_features, standardise_features, RunSpec};

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Feature selection, standardisation, and clustering for tabular data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility (unset = non-reproducible)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Shared K-means tuning parameters.
#[derive(Args, Debug, Clone)]
struct TuningArgs {
    /// Number of independent K-means restarts (best result kept)
    #[arg(long, default_value_t = 10)]
    n_init: usize,

    /// Maximum Lloyd iterations per K-means run
    #[arg(long, default_value_t = 100)]
    max_iter: usize,

    /// Convergence tolerance for inertia change
    #[arg(long, default_value_t = 1e-4)]
    tol: f64,
}

#[derive(Subcommand)]
enum Command {
    /// Cluster rows of a CSV table into k groups
    Cluster {
        /// Path to the input CSV file
        #[arg(long)]
        data: PathBuf,

        /// Feature column names, comma-separated
        #[arg(long, value_delimiter = ',', required = true)]
        features: Vec<String>,

        /// Algorithm selector: "kmeans" or "agglomerative"
        #[arg(long, default_value = "kmeans")]
        algorithm: String,

        /// Number of clusters
        #[arg(long)]
        k: usize,

        /// Write the labeled dataset to this CSV path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Skip feature standardisation
        #[arg(long, default_value_t = false)]
        no_standardise: bool,

        /// Skip metric retention in the result
        #[arg(long, default_value_t = false)]
        no_metrics: bool,
    },

    /// Sweep k over a range and report the elbow of the inertia curve
    Elbow {
        /// Path to the input CSV file
        #[arg(long)]
        data: PathBuf,

        /// Feature column names, comma-separated
        #[arg(long, value_delimiter = ',', required = true)]
        features: Vec<String>,

        /// Minimum number of clusters to try
        #[arg(long)]
        min_k: usize,

        /// Maximum number of clusters to try
        #[arg(long)]
        max_k: usize,

        /// Skip feature standardisation
        #[arg(long, default_value_t = false)]
        no_standardise: bool,

        #[command(flatten)]
        tuning: TuningArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct ClusterOutput {
    algorithm: String,
    k: usize,
    n_rows: usize,
    n_features: usize,
    inertia: Option<f64>,
    cluster_sizes: Vec<usize>,
    output: Option<String>,
}

#[derive(Serialize)]
struct ElbowOutput {
    n_rows: usize,
    best_k: usize,
    results: Vec<KPointOutput>,
}

#[derive(Serialize)]
struct KPointOutput {
    k: usize,
    inertia: f64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Cluster {
            data,
            features,
            algorithm,
            k,
            output,
            no_standardise,
            no_metrics,
        } => {
            let dataset = TableReader::new(&data)
                .read()
                .context("failed to read input CSV")?;
            info!(
                n_rows = dataset.n_rows(),
                n_columns = dataset.n_columns(),
                "dataset loaded"
            );

            let mut spec = RunSpec::new(features.clone(), algorithm.clone(), k)
                .with_standardise(!no_standardise)
                .with_compute_metrics(!no_metrics);
            if let Some(seed) = cli.seed {
                spec = spec.with_seed(seed);
            }
            if let Some(path) = &output {
                spec = spec.with_output_path(path);
            }

            let run = run_clustering(&dataset, &spec).context("clustering failed")?;

            let summary = ClusterOutput {
                algorithm,
                k,
                n_rows: dataset.n_rows(),
                n_features: features.len(),
                inertia: run.inertia(),
                cluster_sizes: run.cluster_sizes(),
                output: output.map(|p| p.display().to_string()),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Command::Elbow {
            data,
            features,
            min_k,
            max_k,
            no_standardise,
            tuning,
        } => {
            let dataset = TableReader::new(&data)
                .read()
                .context("failed to read input CSV")?;
            info!(
                n_rows = dataset.n_rows(),
                n_columns = dataset.n_columns(),
                "dataset loaded"
            );

            let selected =
                select_features(&dataset, &features).context("feature selection failed")?;
            let matrix = if no_standardise {
                selected
            } else {
                standardise_features(&selected)
            };

            let mut config = SweepConfig::new(min_k, max_k)?
                .with_n_init(tuning.n_init)
                .with_max_iter(tuning.max_iter)
                .with_tol(tuning.tol);
            if let Some(seed) = cli.seed {
                config = config.with_seed(seed);
            }

            let elbow = config.fit(matrix.rows()).context("k sweep failed")?;

            let summary = ElbowOutput {
                n_rows: matrix.n_rows(),
                best_k: elbow.best_k(),
                results: elbow
                    .points()
                    .iter()
                    .map(|p| KPointOutput {
                        k: p.k,
                        inertia: p.inertia,
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
