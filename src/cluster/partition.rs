//! K-means partitioning over embedding vectors.
//!
//! This module provides a pure Rust implementation of K-means clustering
//! over squared Euclidean distance. It uses K-means++ for centroid
//! initialization and runs the whole algorithm several times from derived
//! seeds, keeping the lowest-inertia run.
//!
//! # Algorithm Details
//! - Distance metric: squared Euclidean
//! - Initialization: K-means++
//! - Restarts: 20 by default, best inertia wins
//! - Max iterations per run: 500
//! - Convergence tolerance: 1e-5 (relative inertia improvement)
//!
//! The search is fully deterministic: every restart derives its seed from a
//! fixed base seed, so identical inputs always produce identical partitions.

use crate::cluster::types::VectorSet;
use crate::config::ClusteringConfig;
use crate::error::{ClusterError, PipelineResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use tracing::debug;

/// Tuning knobs for the k-means search.
#[derive(Debug, Clone)]
pub struct KMeansParams {
    /// Base seed all restart seeds derive from
    pub base_seed: u64,
    /// Number of independent runs; the lowest-inertia run is kept
    pub restarts: usize,
    /// Iteration cap per run
    pub max_iterations: usize,
    /// Relative inertia improvement below which a run stops
    pub tolerance: f32,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            base_seed: 42,
            restarts: 20,
            max_iterations: 500,
            tolerance: 1e-5,
        }
    }
}

impl From<&ClusteringConfig> for KMeansParams {
    fn from(config: &ClusteringConfig) -> Self {
        Self {
            base_seed: config.base_seed,
            restarts: config.restarts,
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
        }
    }
}

/// Result of a k-means run: a total assignment plus the final centroids.
///
/// Assignments are always consistent with the centroids: each index maps to
/// its nearest centroid, and `inertia` is the summed squared distance under
/// that mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// One centroid per cluster, same dimensionality as the input vectors
    pub centroids: Vec<Vec<f32>>,
    /// Cluster index in [0, k) for every input index
    pub assignments: Vec<usize>,
    /// Total within-cluster squared distance
    pub inertia: f32,
    /// Iterations until the winning run converged
    pub iterations: usize,
}

/// Partition a vector set into `k` clusters.
///
/// Runs k-means `params.restarts` times from seeds derived from
/// `params.base_seed` and keeps the run with the lowest inertia. Ties in
/// nearest-centroid assignment break toward the lowest cluster index.
///
/// # Errors
/// Fails when the set is empty, `k` is zero or exceeds the number of vectors,
/// or fewer than `k` distinct vectors exist (no non-degenerate partition can
/// be produced from such input).
pub fn kmeans(set: &VectorSet, k: usize, params: &KMeansParams) -> PipelineResult<Partition> {
    let vectors = set.vectors();
    if vectors.is_empty() {
        return Err(ClusterError::EmptyInput);
    }
    if k == 0 {
        return Err(ClusterError::InvalidClusterCount { k });
    }
    if vectors.len() < k {
        return Err(ClusterError::TooFewTexts {
            texts: vectors.len(),
            clusters: k,
        });
    }

    let distinct = count_distinct(vectors);
    if distinct < k {
        return Err(ClusterError::DegenerateInput(format!(
            "only {distinct} distinct embedding vectors for {k} clusters"
        )));
    }

    let mut best: Option<Partition> = None;
    for restart in 0..params.restarts.max(1) {
        let seed = derive_seed(params.base_seed, restart as u64);
        let run = run_single(vectors, k, params, seed);
        debug!(
            restart,
            inertia = run.inertia,
            iterations = run.iterations,
            "k-means restart finished"
        );
        // Strict comparison: the earliest run wins ties, keeping the
        // search deterministic.
        if best.as_ref().is_none_or(|b| run.inertia < b.inertia) {
            best = Some(run);
        }
    }

    best.ok_or_else(|| ClusterError::DegenerateInput("no k-means run converged".to_string()))
}

/// One seeded k-means run: assign, update, repeat until stable.
fn run_single(vectors: &[Vec<f32>], k: usize, params: &KMeansParams, seed: u64) -> Partition {
    let dim = vectors[0].len();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = seed_centroids(vectors, k, &mut rng);

    let (mut assignments, mut inertia) = assign(vectors, &centroids);
    let mut iterations = 0;

    loop {
        update_centroids(vectors, &assignments, &mut centroids, dim);
        let (new_assignments, new_inertia) = assign(vectors, &centroids);
        iterations += 1;

        let unchanged = new_assignments == assignments;
        // Relative improvement; a negative value means a centroid was
        // reseeded, which is never treated as convergence.
        let improvement = inertia - new_inertia;
        let floor = params.tolerance * inertia.max(f32::MIN_POSITIVE);
        let converged = (0.0..=floor).contains(&improvement);

        assignments = new_assignments;
        inertia = new_inertia;

        if unchanged || converged || iterations >= params.max_iterations {
            break;
        }
    }

    Partition {
        centroids,
        assignments,
        inertia,
        iterations,
    }
}

/// Assign every vector to its nearest centroid.
///
/// Returns the assignment vector plus the total inertia under it.
fn assign(vectors: &[Vec<f32>], centroids: &[Vec<f32>]) -> (Vec<usize>, f32) {
    let mut assignments = Vec::with_capacity(vectors.len());
    let mut inertia = 0.0f32;
    for vector in vectors {
        let (cluster, d2) = nearest_centroid(vector, centroids);
        assignments.push(cluster);
        inertia += d2;
    }
    (assignments, inertia)
}

/// Index of the nearest centroid by squared Euclidean distance,
/// plus that distance. Ties break toward the lowest cluster index.
pub fn nearest_centroid(vector: &[f32], centroids: &[Vec<f32>]) -> (usize, f32) {
    let mut best = 0;
    let mut best_d2 = f32::INFINITY;
    for (idx, centroid) in centroids.iter().enumerate() {
        let d2 = squared_euclidean(vector, centroid);
        if d2 < best_d2 {
            best_d2 = d2;
            best = idx;
        }
    }
    (best, best_d2)
}

/// Recompute each centroid as the mean of its assigned vectors.
///
/// A cluster that lost all members is reseeded to the point currently
/// farthest from its own centroid, so the algorithm keeps k live clusters.
fn update_centroids(
    vectors: &[Vec<f32>],
    assignments: &[usize],
    centroids: &mut [Vec<f32>],
    dim: usize,
) {
    let k = centroids.len();
    let mut sums = vec![vec![0.0f32; dim]; k];
    let mut counts = vec![0usize; k];

    for (vector, &cluster) in vectors.iter().zip(assignments) {
        counts[cluster] += 1;
        for (sum, &value) in sums[cluster].iter_mut().zip(vector) {
            *sum += value;
        }
    }

    for (cluster, count) in counts.iter().enumerate() {
        if *count == 0 {
            let idx = farthest_member(vectors, assignments, centroids);
            centroids[cluster] = vectors[idx].clone();
        } else {
            let inv = 1.0 / *count as f32;
            centroids[cluster] = sums[cluster].iter().map(|sum| sum * inv).collect();
        }
    }
}

/// Index of the point farthest from its own centroid.
/// Ties break toward the lowest input index.
fn farthest_member(vectors: &[Vec<f32>], assignments: &[usize], centroids: &[Vec<f32>]) -> usize {
    let mut best = 0;
    let mut best_d2 = -1.0f32;
    for (idx, vector) in vectors.iter().enumerate() {
        let d2 = squared_euclidean(vector, &centroids[assignments[idx]]);
        if d2 > best_d2 {
            best_d2 = d2;
            best = idx;
        }
    }
    best
}

/// K-means++ initialization: after a random first pick, each further centroid
/// is drawn with probability proportional to its squared distance from the
/// nearest already-chosen centroid.
fn seed_centroids(vectors: &[Vec<f32>], k: usize, rng: &mut StdRng) -> Vec<Vec<f32>> {
    let mut centroids = Vec::with_capacity(k);
    let first = rng.random_range(0..vectors.len());
    centroids.push(vectors[first].clone());

    // Running minimum squared distance to the chosen centroids
    let mut min_d2: Vec<f32> = vectors
        .iter()
        .map(|v| squared_euclidean(v, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f32 = min_d2.iter().sum();
        let chosen = if total <= f32::EPSILON {
            // Every remaining point coincides with a chosen centroid. The
            // caller verified there are at least k distinct vectors, so an
            // unused one must exist.
            first_unused(vectors, &centroids)
        } else {
            let target = rng.random::<f32>() * total;
            let mut cumulative = 0.0f32;
            let mut selected = vectors.len() - 1;
            for (idx, &d2) in min_d2.iter().enumerate() {
                cumulative += d2;
                if cumulative >= target {
                    selected = idx;
                    break;
                }
            }
            selected
        };

        centroids.push(vectors[chosen].clone());
        let latest = centroids.len() - 1;
        for (idx, vector) in vectors.iter().enumerate() {
            let d2 = squared_euclidean(vector, &centroids[latest]);
            if d2 < min_d2[idx] {
                min_d2[idx] = d2;
            }
        }
    }

    centroids
}

fn first_unused(vectors: &[Vec<f32>], centroids: &[Vec<f32>]) -> usize {
    vectors
        .iter()
        .position(|v| centroids.iter().all(|c| c != v))
        .unwrap_or(0)
}

/// Derive the seed for one restart from the base seed (SplitMix64 finalizer).
fn derive_seed(base: u64, restart: u64) -> u64 {
    let mut z = base.wrapping_add(restart.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Number of bit-exact distinct vectors.
fn count_distinct(vectors: &[Vec<f32>]) -> usize {
    let mut seen: HashSet<Vec<u32>> = HashSet::with_capacity(vectors.len());
    for vector in vectors {
        seen.insert(vector.iter().map(|value| value.to_bits()).collect());
    }
    seen.len()
}

/// Squared Euclidean distance between two equal-length vectors.
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must share a dimension");
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Euclidean distance between two equal-length vectors.
pub fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    squared_euclidean(a, b).sqrt()
}
