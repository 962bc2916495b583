//! Clustering algorithms behind a uniform adapter contract.
//!
//! Two built-in adapters share the [`ClusterAlgorithm`] trait: multi-restart
//! Euclidean K-means ([`KMeansConfig`]) and bottom-up agglomerative merging
//! ([`AgglomerativeConfig`]). Both produce a [`Clustering`] whose optional
//! fields declare what each algorithm can provide. [`AlgorithmRegistry`]
//! resolves adapters by name, and [`SweepConfig`] runs the inertia sweep
//! used for elbow-based k selection.

mod agglomerative;
mod algorithm;
mod error;
mod inertia;
mod init;
mod kmeans;
mod label;
mod registry;
mod sweep;

pub use agglomerative::{AgglomerativeConfig, Linkage};
pub use algorithm::{ClusterAlgorithm, Clustering, METRIC_INERTIA};
pub use error::ClusterError;
pub use inertia::Inertia;
pub use kmeans::KMeansConfig;
pub use label::ClusterLabel;
pub use registry::{AlgorithmRegistry, AlgorithmSpec};
pub use sweep::{ElbowCurve, KPoint, SweepConfig};
