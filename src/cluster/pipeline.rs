//! End-to-end clustering pipeline.
//!
//! The sole entry point of the crate: validates the request, encodes the
//! texts, partitions the vectors, ranks cluster members, and optionally
//! attaches the 2-D visualization payload. Every inner failure is converted
//! to the crate error taxonomy at this boundary; no partial results escape.

use crate::cluster::partition::{KMeansParams, kmeans};
use crate::cluster::project::build_visualization;
use crate::cluster::rank::build_ranked_clusters;
use crate::cluster::types::{ClusteringResult, VectorSet};
use crate::embedding::TextEncoder;
use crate::error::{ClusterError, MAX_CLUSTERS, MIN_CLUSTERS, PipelineResult};
use std::sync::Arc;
use tracing::{debug, info};

/// Clusters texts into k semantic groups with a representative per group.
///
/// Holds only the injected encoder and the partitioning knobs; every
/// invocation allocates its own working state, so one pipeline value can be
/// shared across threads and called concurrently.
pub struct ClusteringPipeline {
    encoder: Arc<dyn TextEncoder>,
    params: KMeansParams,
}

impl ClusteringPipeline {
    /// Create a pipeline with default partitioning parameters.
    pub fn new(encoder: Arc<dyn TextEncoder>) -> Self {
        Self::with_params(encoder, KMeansParams::default())
    }

    /// Create a pipeline with explicit partitioning parameters.
    pub fn with_params(encoder: Arc<dyn TextEncoder>, params: KMeansParams) -> Self {
        Self { encoder, params }
    }

    /// Cluster `texts` into `k` groups.
    ///
    /// Validates before any computation: the text list must be non-empty,
    /// `k` must lie in [2, 50], and there must be at least `k` texts. With
    /// `want_visualization` the result carries a 2-D projection of points
    /// and centroids from one shared transform.
    ///
    /// Identical inputs always produce identical results; the internal
    /// random search is fully seeded.
    ///
    /// # Errors
    /// Validation failures (`is_validation() == true`) report the violated
    /// constraint. Computation failures cover everything downstream:
    /// encoding, degenerate inputs, and projection.
    pub fn run(
        &self,
        texts: &[String],
        k: usize,
        want_visualization: bool,
    ) -> PipelineResult<ClusteringResult> {
        if texts.is_empty() {
            return Err(ClusterError::EmptyInput);
        }
        if !(MIN_CLUSTERS..=MAX_CLUSTERS).contains(&k) {
            return Err(ClusterError::InvalidClusterCount { k });
        }
        if texts.len() < k {
            return Err(ClusterError::TooFewTexts {
                texts: texts.len(),
                clusters: k,
            });
        }

        debug!(
            texts = texts.len(),
            k, want_visualization, "starting clustering run"
        );

        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let vectors = self.encoder.encode(&refs)?;
        let set = VectorSet::new(texts.to_vec(), vectors)?;

        let partition = kmeans(&set, k, &self.params)?;
        info!(
            inertia = partition.inertia,
            iterations = partition.iterations,
            "partitioning converged"
        );

        let clusters = build_ranked_clusters(&set, &partition);

        let visualization = if want_visualization {
            Some(build_visualization(
                &set,
                &partition,
                &clusters,
                self.params.base_seed,
            )?)
        } else {
            None
        };

        Ok(ClusteringResult {
            clusters,
            labels: partition.assignments,
            n_clusters: k,
            visualization,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockTextEncoder;

    fn pipeline() -> ClusteringPipeline {
        ClusteringPipeline::new(Arc::new(MockTextEncoder::new()))
    }

    fn fruit_and_vehicles() -> Vec<String> {
        ["apple", "banana", "car", "truck"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let err = pipeline().run(&[], 3, false).unwrap_err();
        assert!(matches!(err, ClusterError::EmptyInput));
        assert!(err.is_validation());
    }

    #[test]
    fn test_cluster_count_bounds() {
        let texts = fruit_and_vehicles();
        assert!(matches!(
            pipeline().run(&texts, 1, false),
            Err(ClusterError::InvalidClusterCount { k: 1 })
        ));
        assert!(matches!(
            pipeline().run(&texts, 51, false),
            Err(ClusterError::InvalidClusterCount { k: 51 })
        ));
    }

    #[test]
    fn test_fewer_texts_than_clusters_is_rejected() {
        let texts: Vec<String> = vec!["a".to_string(), "b".to_string()];
        let err = pipeline().run(&texts, 5, false).unwrap_err();
        assert!(matches!(
            err,
            ClusterError::TooFewTexts {
                texts: 2,
                clusters: 5
            }
        ));
        assert!(err.is_validation());
    }

    #[test]
    fn test_semantic_grouping() {
        let texts = fruit_and_vehicles();
        let result = pipeline().run(&texts, 2, false).unwrap();

        assert_eq!(result.n_clusters, 2);
        assert_eq!(result.clusters.len(), 2);
        assert_eq!(result.labels.len(), 4);

        // Fruits together, vehicles together
        assert_eq!(result.labels[0], result.labels[1]);
        assert_eq!(result.labels[2], result.labels[3]);
        assert_ne!(result.labels[0], result.labels[2]);

        for cluster in &result.clusters {
            assert!(cluster.representative_text.is_some());
            for pair in cluster.members.windows(2) {
                assert!(pair[0].distance <= pair[1].distance);
            }
        }
    }

    #[test]
    fn test_labels_agree_with_cluster_membership() {
        let texts = fruit_and_vehicles();
        let result = pipeline().run(&texts, 2, false).unwrap();

        for cluster in &result.clusters {
            for member in &cluster.members {
                assert_eq!(result.labels[member.index], cluster.cluster_idx);
                assert_eq!(texts[member.index], member.text);
            }
        }
        // Every input index appears exactly once across all clusters
        let total: usize = result.clusters.iter().map(|c| c.members.len()).sum();
        assert_eq!(total, texts.len());
    }

    #[test]
    fn test_determinism_across_calls() {
        let texts = fruit_and_vehicles();
        let first = pipeline().run(&texts, 2, true).unwrap();
        let second = pipeline().run(&texts, 2, true).unwrap();

        assert_eq!(first.labels, second.labels);
        let reps1: Vec<_> = first
            .clusters
            .iter()
            .map(|c| c.representative_text.clone())
            .collect();
        let reps2: Vec<_> = second
            .clusters
            .iter()
            .map(|c| c.representative_text.clone())
            .collect();
        assert_eq!(reps1, reps2);

        let viz1 = first.visualization.unwrap();
        let viz2 = second.visualization.unwrap();
        assert_eq!(viz1.points, viz2.points);
        assert_eq!(viz1.centroids, viz2.centroids);
    }

    #[test]
    fn test_visualization_payload_shape() {
        let texts = fruit_and_vehicles();
        let result = pipeline().run(&texts, 2, true).unwrap();
        let viz = result.visualization.expect("visualization was requested");

        assert_eq!(viz.points.len(), texts.len());
        assert_eq!(viz.labels, result.labels);
        assert_eq!(viz.centroids.len(), 2);
        assert_eq!(viz.representative_indices.len(), 2);
        for (cluster, rep) in result.clusters.iter().zip(&viz.representative_indices) {
            assert_eq!(*rep, cluster.representative().map(|m| m.index));
        }
    }

    #[test]
    fn test_visualization_not_built_unless_requested() {
        let texts = fruit_and_vehicles();
        let result = pipeline().run(&texts, 2, false).unwrap();
        assert!(result.visualization.is_none());
    }

    #[test]
    fn test_k_equals_n_boundary() {
        let texts = fruit_and_vehicles();
        let result = pipeline().run(&texts, 4, false).unwrap();

        for cluster in &result.clusters {
            assert_eq!(cluster.members.len(), 1);
            // A singleton sits on its own centroid
            assert!(cluster.members[0].distance.abs() < 1e-3);
        }
    }

    #[test]
    fn test_identical_texts_report_degenerate_input() {
        let texts: Vec<String> = vec!["same".to_string(); 5];
        let err = pipeline().run(&texts, 2, false).unwrap_err();
        assert!(matches!(err, ClusterError::DegenerateInput(_)));
        assert!(!err.is_validation());
    }
}
