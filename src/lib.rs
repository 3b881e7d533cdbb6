//! Semantic text clustering: partition short texts into k groups, pick a
//! representative per group, and optionally project everything to 2-D for
//! plotting. Each invocation is a pure, stateless function of its inputs;
//! the only shared piece is the read-only embedding model.

pub mod cluster;
pub mod config;
pub mod embedding;
pub mod error;
pub mod init;

// Explicit exports for better API clarity
pub use cluster::{
    ClusterMember, ClusteringPipeline, ClusteringResult, KMeansParams, Partition, RankedCluster,
    VectorSet, VisualizationData,
};
pub use config::Settings;
pub use embedding::{FastEmbedEncoder, TextEncoder, parse_embedding_model};
pub use error::{ClusterError, MAX_CLUSTERS, MIN_CLUSTERS, PipelineResult};
