//! 2-D PCA projection for visualization.
//!
//! Fits the two directions of maximum variance on the embeddings and applies
//! the same transform to points and centroids. The projection is only for
//! plotting; clustering decisions never touch it.
//!
//! The top components come from power iteration on the centered data, with
//! the second direction deflated against the first. Start vectors are drawn
//! from a seeded generator and each component's sign is normalized, so the
//! fit is deterministic.

use crate::cluster::partition::Partition;
use crate::cluster::types::{RankedCluster, VectorSet, VisualizationData};
use crate::error::{ClusterError, PipelineResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Iteration cap for a single power-iteration fit.
const POWER_ITERATIONS: usize = 200;

/// Alignment drift below which a direction is considered converged.
const POWER_TOLERANCE: f32 = 1e-7;

/// A 2-component PCA transform fitted on one set of vectors.
#[derive(Debug, Clone)]
pub struct Pca2 {
    mean: Vec<f32>,
    components: [Vec<f32>; 2],
}

impl Pca2 {
    /// Fit the transform on the given vectors.
    ///
    /// # Errors
    /// Fails when fewer than 2 vectors are given (two variance directions
    /// need at least two points) or when the dimensionality is below 2.
    pub fn fit(vectors: &[Vec<f32>], seed: u64) -> PipelineResult<Self> {
        if vectors.len() < 2 {
            return Err(ClusterError::ProjectionFailed(format!(
                "need at least 2 points to fit a 2-D projection, got {}",
                vectors.len()
            )));
        }
        let dim = vectors[0].len();
        if dim < 2 {
            return Err(ClusterError::ProjectionFailed(format!(
                "embedding dimensionality {dim} is below 2"
            )));
        }

        let inv_n = 1.0 / vectors.len() as f32;
        let mut mean = vec![0.0f32; dim];
        for vector in vectors {
            for (m, &value) in mean.iter_mut().zip(vector) {
                *m += value * inv_n;
            }
        }

        let centered: Vec<Vec<f32>> = vectors
            .iter()
            .map(|vector| vector.iter().zip(&mean).map(|(x, m)| x - m).collect())
            .collect();

        let first = dominant_direction(&centered, None, seed);
        let second = dominant_direction(
            &centered,
            Some(first.as_slice()),
            seed ^ 0xA5A5_5A5A_A5A5_5A5A,
        );

        Ok(Self {
            mean,
            components: [first, second],
        })
    }

    /// Project one vector into the fitted 2-D space.
    #[must_use]
    pub fn transform(&self, vector: &[f32]) -> [f32; 2] {
        let mut out = [0.0f32; 2];
        for (axis, component) in self.components.iter().enumerate() {
            out[axis] = vector
                .iter()
                .zip(&self.mean)
                .zip(component)
                .map(|((x, m), c)| (x - m) * c)
                .sum();
        }
        out
    }

    /// Project a batch of vectors.
    #[must_use]
    pub fn transform_all(&self, vectors: &[Vec<f32>]) -> Vec<[f32; 2]> {
        vectors.iter().map(|v| self.transform(v)).collect()
    }
}

/// Assemble the visualization payload for a finished clustering.
///
/// The transform is fitted on the embeddings only; centroids are pushed
/// through that same transform so both coordinate systems align.
pub fn build_visualization(
    set: &VectorSet,
    partition: &Partition,
    clusters: &[RankedCluster],
    seed: u64,
) -> PipelineResult<VisualizationData> {
    let pca = Pca2::fit(set.vectors(), seed)?;

    Ok(VisualizationData {
        points: pca.transform_all(set.vectors()),
        labels: partition.assignments.clone(),
        centroids: pca.transform_all(&partition.centroids),
        representative_indices: clusters
            .iter()
            .map(|cluster| cluster.representative().map(|member| member.index))
            .collect(),
    })
}

/// Leading variance direction of the centered data by power iteration.
///
/// `deflate` removes an already-extracted component so the second direction
/// comes out orthogonal to the first. When the data carries no variance in
/// the remaining subspace, falls back to a fixed axis direction instead of
/// returning a garbage vector.
fn dominant_direction(centered: &[Vec<f32>], deflate: Option<&[f32]>, seed: u64) -> Vec<f32> {
    let dim = centered[0].len();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut direction: Vec<f32> = (0..dim).map(|_| rng.random::<f32>() - 0.5).collect();
    if let Some(prev) = deflate {
        subtract_projection(&mut direction, prev);
    }
    if !normalize(&mut direction) {
        return axis_fallback(dim, deflate);
    }

    for _ in 0..POWER_ITERATIONS {
        // next = X^T (X v), without materializing the covariance matrix
        let mut next = vec![0.0f32; dim];
        for row in centered {
            let score: f32 = row.iter().zip(&direction).map(|(x, v)| x * v).sum();
            for (n, &x) in next.iter_mut().zip(row) {
                *n += score * x;
            }
        }
        if let Some(prev) = deflate {
            subtract_projection(&mut next, prev);
        }
        if !normalize(&mut next) {
            return axis_fallback(dim, deflate);
        }

        let alignment: f32 = next.iter().zip(&direction).map(|(a, b)| a * b).sum();
        let drift = 1.0 - alignment.abs();
        direction = next;
        if drift < POWER_TOLERANCE {
            break;
        }
    }

    fix_sign(&mut direction);
    direction
}

/// Remove the component of `vector` along the unit vector `basis`.
fn subtract_projection(vector: &mut [f32], basis: &[f32]) {
    let dot: f32 = vector.iter().zip(basis).map(|(v, b)| v * b).sum();
    for (v, &b) in vector.iter_mut().zip(basis) {
        *v -= dot * b;
    }
}

/// Scale to unit length. Returns false when the vector is effectively zero.
fn normalize(vector: &mut [f32]) -> bool {
    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        return false;
    }
    for value in vector.iter_mut() {
        *value /= norm;
    }
    true
}

/// Deterministic unit direction for variance-free subspaces: the first axis
/// vector with a non-zero residual after deflation.
fn axis_fallback(dim: usize, deflate: Option<&[f32]>) -> Vec<f32> {
    for axis in 0..dim {
        let mut candidate = vec![0.0f32; dim];
        candidate[axis] = 1.0;
        if let Some(prev) = deflate {
            subtract_projection(&mut candidate, prev);
        }
        if normalize(&mut candidate) {
            fix_sign(&mut candidate);
            return candidate;
        }
    }
    let mut fallback = vec![0.0f32; dim];
    fallback[0] = 1.0;
    fallback
}

/// Flip the component so its largest-magnitude coefficient is positive,
/// making the projection reproducible across fits.
fn fix_sign(component: &mut [f32]) {
    let mut extreme = 0.0f32;
    for &value in component.iter() {
        if value.abs() > extreme.abs() {
            extreme = value;
        }
    }
    if extreme < 0.0 {
        for value in component.iter_mut() {
            *value = -*value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_with_noise() -> Vec<Vec<f32>> {
        // Variance overwhelmingly along the x axis, slight spread in y
        vec![
            vec![-4.0, 0.1, 0.0],
            vec![-2.0, -0.1, 0.0],
            vec![0.0, 0.2, 0.0],
            vec![2.0, -0.2, 0.0],
            vec![4.0, 0.0, 0.0],
        ]
    }

    #[test]
    fn test_first_component_follows_max_variance() {
        let pca = Pca2::fit(&line_with_noise(), 42).unwrap();
        let first = &pca.components[0];

        // The x coefficient should dominate the component
        assert!(first[0].abs() > 0.99, "component was {first:?}");
        // Sign convention makes the dominant coefficient positive
        assert!(first[0] > 0.0);
    }

    #[test]
    fn test_components_are_orthonormal() {
        let pca = Pca2::fit(&line_with_noise(), 42).unwrap();
        let [first, second] = &pca.components;

        let norm1: f32 = first.iter().map(|v| v * v).sum::<f32>().sqrt();
        let norm2: f32 = second.iter().map(|v| v * v).sum::<f32>().sqrt();
        let dot: f32 = first.iter().zip(second).map(|(a, b)| a * b).sum();

        assert!((norm1 - 1.0).abs() < 1e-4);
        assert!((norm2 - 1.0).abs() < 1e-4);
        assert!(dot.abs() < 1e-4);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let vectors = line_with_noise();
        let first = Pca2::fit(&vectors, 42).unwrap();
        let second = Pca2::fit(&vectors, 42).unwrap();

        assert_eq!(first.components, second.components);
        assert_eq!(
            first.transform_all(&vectors),
            second.transform_all(&vectors)
        );
    }

    #[test]
    fn test_mean_of_projections_is_projection_of_mean() {
        // The transform is linear, so both paths must agree up to float noise
        let vectors = line_with_noise();
        let pca = Pca2::fit(&vectors, 42).unwrap();

        let dim = vectors[0].len();
        let mut mean = vec![0.0f32; dim];
        for vector in &vectors {
            for (m, &value) in mean.iter_mut().zip(vector) {
                *m += value / vectors.len() as f32;
            }
        }
        let projected_mean = pca.transform(&mean);

        let projections = pca.transform_all(&vectors);
        let mut mean_of_projections = [0.0f32; 2];
        for point in &projections {
            mean_of_projections[0] += point[0] / projections.len() as f32;
            mean_of_projections[1] += point[1] / projections.len() as f32;
        }

        assert!((projected_mean[0] - mean_of_projections[0]).abs() < 1e-4);
        assert!((projected_mean[1] - mean_of_projections[1]).abs() < 1e-4);
    }

    #[test]
    fn test_rejects_single_point() {
        let err = Pca2::fit(&[vec![1.0, 2.0, 3.0]], 42).unwrap_err();
        assert_eq!(err.status_code(), "PROJECTION_FAILED");
    }

    #[test]
    fn test_rejects_one_dimensional_embeddings() {
        let err = Pca2::fit(&[vec![1.0], vec![2.0], vec![3.0]], 42).unwrap_err();
        assert_eq!(err.status_code(), "PROJECTION_FAILED");
    }

    #[test]
    fn test_collinear_points_project_without_garbage() {
        // Rank-1 data: the second direction has nothing to explain, but the
        // projection must still come back finite and deterministic
        let vectors = vec![
            vec![0.0, 0.0, 0.0],
            vec![1.0, 1.0, 1.0],
            vec![2.0, 2.0, 2.0],
        ];
        let pca = Pca2::fit(&vectors, 42).unwrap();
        let points = pca.transform_all(&vectors);

        for point in &points {
            assert!(point[0].is_finite());
            assert!(point[1].is_finite());
            // Second coordinate carries (almost) no variance
            assert!(point[1].abs() < 1e-3);
        }
    }
}
