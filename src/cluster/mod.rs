//! Partitional clustering over feature vectors.

mod kmeans;
mod metrics;

pub use kmeans::{cluster, Cluster, ClusterFit, KMeans};
pub use metrics::{euclidean_distance, inertia, silhouette_score, squared_distance};
