//! Embedding generation for the clustering pipeline.
//!
//! This module provides the trait and implementations for turning raw texts
//! into fixed-dimensionality vectors. It uses fastembed with the AllMiniLML6V2
//! model by default. The pipeline takes the encoder as an injected dependency,
//! so tests run against a deterministic mock instead of a downloaded model.

use crate::error::{ClusterError, PipelineResult};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Mutex;

/// Trait for encoding texts into embedding vectors.
///
/// Implementations must be thread-safe for concurrent read-only use: the
/// pipeline may be invoked from several threads sharing one encoder, and no
/// call may observe state mutated by another.
pub trait TextEncoder: Send + Sync {
    /// Encode a batch of texts, one vector per input text, order-preserving.
    ///
    /// All returned vectors share the dimensionality reported by
    /// [`dimension`](Self::dimension).
    fn encode(&self, texts: &[&str]) -> PipelineResult<Vec<Vec<f32>>>;

    /// Get the dimension of vectors produced by this encoder.
    #[must_use]
    fn dimension(&self) -> usize;
}

/// FastEmbed implementation, AllMiniLML6V2 by default.
///
/// The model is loaded once at construction and cached on disk under the
/// global models directory, so only the first run downloads anything.
pub struct FastEmbedEncoder {
    model: Mutex<TextEmbedding>,
    dimension: usize,
}

impl FastEmbedEncoder {
    /// Create a new encoder with the default AllMiniLML6V2 model.
    ///
    /// # Errors
    /// Returns an error if the model fails to initialize or download.
    pub fn new() -> PipelineResult<Self> {
        Self::with_model(EmbeddingModel::AllMiniLML6V2)
    }

    /// Create an encoder with a specific fastembed model.
    ///
    /// # Errors
    /// Returns an error if the model fails to initialize or download.
    pub fn with_model(model: EmbeddingModel) -> PipelineResult<Self> {
        crate::init::init_global_dirs().map_err(|e| {
            ClusterError::EmbeddingFailed(format!("failed to create model cache directory: {e}"))
        })?;

        let mut text_model = TextEmbedding::try_new(
            InitOptions::new(model)
                .with_cache_dir(crate::init::models_dir())
                .with_show_download_progress(false),
        )
        .map_err(|e| ClusterError::EmbeddingFailed(
            format!("failed to initialize embedding model: {e}. Ensure you have internet connection for first-time model download")
        ))?;

        // fastembed does not expose the output width, so probe it once.
        let probe = text_model
            .embed(vec!["dimension probe"], None)
            .map_err(|e| ClusterError::EmbeddingFailed(e.to_string()))?;
        let dimension = probe
            .into_iter()
            .next()
            .ok_or_else(|| {
                ClusterError::EmbeddingFailed("model returned no embedding for probe text".into())
            })?
            .len();

        Ok(Self {
            model: Mutex::new(text_model),
            dimension,
        })
    }
}

impl TextEncoder for FastEmbedEncoder {
    fn encode(&self, texts: &[&str]) -> PipelineResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // fastembed expects owned strings for the embed method
        let owned: Vec<String> = texts.iter().map(|&s| s.to_string()).collect();

        let embeddings = self
            .model
            .lock()
            .map_err(|_| {
                ClusterError::EmbeddingFailed(
                    "failed to acquire embedding model lock - model may be poisoned".to_string(),
                )
            })?
            .embed(owned, None)
            .map_err(|e| ClusterError::EmbeddingFailed(e.to_string()))?;

        for embedding in &embeddings {
            if embedding.len() != self.dimension {
                return Err(ClusterError::DimensionMismatch {
                    expected: self.dimension,
                    actual: embedding.len(),
                });
            }
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Resolve a configured model name to a fastembed model.
///
/// Accepts the names used in `settings.toml` under `embedding.model`.
pub fn parse_embedding_model(name: &str) -> PipelineResult<EmbeddingModel> {
    match name {
        "AllMiniLML6V2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "AllMiniLML6V2Q" => Ok(EmbeddingModel::AllMiniLML6V2Q),
        "AllMiniLML12V2" => Ok(EmbeddingModel::AllMiniLML12V2),
        "BGESmallENV15" => Ok(EmbeddingModel::BGESmallENV15),
        other => Err(ClusterError::EmbeddingFailed(format!(
            "unknown embedding model '{other}'; supported: AllMiniLML6V2, AllMiniLML6V2Q, AllMiniLML12V2, BGESmallENV15"
        ))),
    }
}

/// Mock encoder for unit tests.
///
/// Produces deterministic unit-length vectors where a few coordinates are
/// boosted per topic keyword, so semantically "close" test texts land close
/// in embedding space without any model download.
#[cfg(test)]
pub struct MockTextEncoder {
    dimension: usize,
}

#[cfg(test)]
impl MockTextEncoder {
    #[must_use]
    pub fn new() -> Self {
        Self { dimension: 8 }
    }

    #[must_use]
    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[cfg(test)]
impl TextEncoder for MockTextEncoder {
    fn encode(&self, texts: &[&str]) -> PipelineResult<Vec<Vec<f32>>> {
        let dim = self.dimension;
        let mut embeddings = Vec::with_capacity(texts.len());

        for text in texts {
            let mut embedding = vec![0.05; dim];

            if (text.contains("fruit") || text.contains("apple") || text.contains("banana"))
                && dim > 1
            {
                embedding[0] = 0.9;
                embedding[1] = 0.8;
            }
            if (text.contains("vehicle") || text.contains("car") || text.contains("truck"))
                && dim > 3
            {
                embedding[2] = 0.9;
                embedding[3] = 0.8;
            }
            // Per-text jitter keeps duplicate-free inputs distinct
            let salt = (text.len() % dim) as f32;
            embedding[text.len() % dim] += 0.01 * (salt + 1.0);

            let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
            if magnitude > 0.0 {
                for val in &mut embedding {
                    *val /= magnitude;
                }
            }

            embeddings.push(embedding);
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_encoder_is_deterministic() {
        let encoder = MockTextEncoder::new();
        let texts = vec!["apple", "car"];

        let first = encoder.encode(&texts).unwrap();
        let second = encoder.encode(&texts).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_mock_encoder_separates_topics() {
        let encoder = MockTextEncoder::new();
        let embeddings = encoder.encode(&["apple", "banana", "truck"]).unwrap();

        let dot = |a: &[f32], b: &[f32]| -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() };
        let fruit_pair = dot(&embeddings[0], &embeddings[1]);
        let cross_pair = dot(&embeddings[0], &embeddings[2]);
        assert!(
            fruit_pair > cross_pair,
            "fruit texts should be closer to each other than to a vehicle text"
        );
    }

    #[test]
    fn test_mock_encoder_normalizes() {
        let encoder = MockTextEncoder::new();
        let embeddings = encoder.encode(&["apple pie recipe"]).unwrap();

        let magnitude: f32 = embeddings[0].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 0.01);
        assert_eq!(embeddings[0].len(), encoder.dimension());
    }

    #[test]
    fn test_parse_embedding_model() {
        assert!(parse_embedding_model("AllMiniLML6V2").is_ok());
        assert!(parse_embedding_model("BGESmallENV15").is_ok());

        let err = parse_embedding_model("DoesNotExist").unwrap_err();
        assert_eq!(err.status_code(), "EMBEDDING_FAILED");
    }
}
