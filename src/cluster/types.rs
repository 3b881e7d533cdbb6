//! Data model for clustering inputs and results.
//!
//! Everything here is created fresh per pipeline invocation and dropped once
//! the result is assembled; there is no cross-request state.

use crate::error::{ClusterError, PipelineResult};
use serde::{Deserialize, Serialize};

/// Embedding vectors paired with their source texts, in input order.
///
/// Invariant: all vectors share one dimensionality, validated at construction.
#[derive(Debug, Clone)]
pub struct VectorSet {
    texts: Vec<String>,
    vectors: Vec<Vec<f32>>,
    dimension: usize,
}

impl VectorSet {
    /// Pair texts with their embeddings.
    ///
    /// # Errors
    /// Fails if the encoder returned a different number of vectors than texts,
    /// or if any vector disagrees on dimensionality.
    pub fn new(texts: Vec<String>, vectors: Vec<Vec<f32>>) -> PipelineResult<Self> {
        if texts.len() != vectors.len() {
            return Err(ClusterError::EmbeddingFailed(format!(
                "encoder returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }

        let dimension = vectors.first().map_or(0, Vec::len);
        for vector in &vectors {
            if vector.len() != dimension {
                return Err(ClusterError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
        }

        Ok(Self {
            texts,
            vectors,
            dimension,
        })
    }

    /// Number of (text, vector) pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Shared dimensionality of all vectors (0 when the set is empty).
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[must_use]
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    #[must_use]
    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }
}

/// One text within a ranked cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterMember {
    /// Index of the text in the original input order
    pub index: usize,
    pub text: String,
    /// Euclidean distance to the cluster centroid
    pub distance: f32,
}

/// A cluster with its members sorted ascending by distance to the centroid.
///
/// The first member is the representative (the most "typical" text). An empty
/// cluster has no representative; callers must treat `representative_text:
/// None` as a distinct state rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCluster {
    pub cluster_idx: usize,
    pub representative_text: Option<String>,
    pub members: Vec<ClusterMember>,
}

impl RankedCluster {
    /// The member closest to the centroid, if the cluster is non-empty.
    #[must_use]
    pub fn representative(&self) -> Option<&ClusterMember> {
        self.members.first()
    }
}

/// 2-D projection of the embeddings and centroids for plotting.
///
/// All coordinates come from one linear transform fitted on the points, so
/// spatial proximity in the plot is meaningful relative to the clustering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizationData {
    /// Projected [x, y] per original text index
    pub points: Vec<[f32; 2]>,
    /// Cluster label per original text index
    pub labels: Vec<usize>,
    /// Projected [x, y] per cluster index
    pub centroids: Vec<[f32; 2]>,
    /// Global input index of each cluster's representative
    /// (None for an empty cluster)
    pub representative_indices: Vec<Option<usize>>,
}

/// Final output of a pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringResult {
    /// One ranked cluster per cluster index, 0..k-1
    pub clusters: Vec<RankedCluster>,
    /// Cluster label per text, parallel to the input order
    pub labels: Vec<usize>,
    pub n_clusters: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visualization: Option<VisualizationData>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_set_validates_dimensions() {
        let texts = vec!["a".to_string(), "b".to_string()];
        let vectors = vec![vec![1.0, 2.0], vec![3.0, 4.0, 5.0]];

        let err = VectorSet::new(texts, vectors).unwrap_err();
        assert!(matches!(
            err,
            ClusterError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_vector_set_validates_pairing() {
        let texts = vec!["a".to_string()];
        let vectors = vec![vec![1.0], vec![2.0]];

        let err = VectorSet::new(texts, vectors).unwrap_err();
        assert_eq!(err.status_code(), "EMBEDDING_FAILED");
    }

    #[test]
    fn test_vector_set_accessors() {
        let set = VectorSet::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        )
        .unwrap();

        assert_eq!(set.len(), 2);
        assert!(!set.is_empty());
        assert_eq!(set.dimension(), 2);
        assert_eq!(set.texts()[1], "b");
        assert_eq!(set.vectors()[0], vec![1.0, 0.0]);
    }

    #[test]
    fn test_empty_cluster_has_no_representative() {
        let cluster = RankedCluster {
            cluster_idx: 3,
            representative_text: None,
            members: Vec::new(),
        };
        assert!(cluster.representative().is_none());
    }

    #[test]
    fn test_result_serializes_with_reference_field_names() {
        let result = ClusteringResult {
            clusters: vec![RankedCluster {
                cluster_idx: 0,
                representative_text: Some("apple".to_string()),
                members: vec![ClusterMember {
                    index: 0,
                    text: "apple".to_string(),
                    distance: 0.0,
                }],
            }],
            labels: vec![0],
            n_clusters: 1,
            visualization: None,
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["n_clusters"], 1);
        assert_eq!(json["clusters"][0]["cluster_idx"], 0);
        assert_eq!(json["clusters"][0]["representative_text"], "apple");
        // Visualization is omitted entirely when not requested
        assert!(json.get("visualization").is_none());
    }
}
