//! Semantic clustering of embedded texts.
//!
//! # Architecture
//! Control flow is strictly linear: a [`VectorSet`] is partitioned by
//! k-means ([`partition`]), each cluster is ranked around its centroid
//! ([`rank`]), and an optional 2-D PCA projection is attached for
//! visualization ([`project`]). [`ClusteringPipeline`] orchestrates the
//! steps and owns all input validation.

mod partition;
mod pipeline;
mod project;
mod rank;
mod types;

// Re-export core types for public API
pub use partition::{
    KMeansParams, Partition, euclidean, kmeans, nearest_centroid, squared_euclidean,
};
pub use pipeline::ClusteringPipeline;
pub use project::{Pca2, build_visualization};
pub use rank::build_ranked_clusters;
pub use types::{ClusterMember, ClusteringResult, RankedCluster, VectorSet, VisualizationData};
