//! Preprocessing and orchestration for the strata clustering pipeline.
//!
//! [`run_clustering`] ties the layers together: feature selection and
//! standardisation from this crate, the algorithm adapters from
//! `strata-cluster`, and table I/O from `strata-io`.

mod error;
mod preprocess;
mod result;
mod run;

pub use error::PipelineError;
pub use preprocess::{select_features, standardise_features, FeatureMatrix};
pub use result::ClusteringRun;
pub use run::{run_clustering, run_clustering_csv, run_clustering_with, RunSpec, LABEL_COLUMN};
