//! Distance ranking and representative selection within clusters.
//!
//! Turns a raw partition into the canonical per-cluster presentation: members
//! sorted from most to least typical, with the nearest-to-centroid member as
//! the representative.

use crate::cluster::partition::{Partition, euclidean};
use crate::cluster::types::{ClusterMember, RankedCluster, VectorSet};

/// Build one ranked cluster per cluster index.
///
/// Members sort ascending by distance to their centroid; ties break toward
/// the lowest original index, so the ordering (and therefore the
/// representative) is deterministic. An empty cluster comes back with
/// `representative_text: None` and no members, never a fabricated entry.
pub fn build_ranked_clusters(set: &VectorSet, partition: &Partition) -> Vec<RankedCluster> {
    let k = partition.centroids.len();
    let mut clusters = Vec::with_capacity(k);

    for cluster_idx in 0..k {
        let centroid = &partition.centroids[cluster_idx];
        let mut members: Vec<ClusterMember> = set
            .vectors()
            .iter()
            .enumerate()
            .filter(|(idx, _)| partition.assignments[*idx] == cluster_idx)
            .map(|(idx, vector)| ClusterMember {
                index: idx,
                text: set.texts()[idx].clone(),
                distance: euclidean(vector, centroid),
            })
            .collect();

        members.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.index.cmp(&b.index)));

        let representative_text = members.first().map(|member| member.text.clone());
        clusters.push(RankedCluster {
            cluster_idx,
            representative_text,
            members,
        });
    }

    clusters
}
