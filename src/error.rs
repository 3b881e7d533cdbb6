//! Error types for the clustering pipeline
//!
//! This module provides structured error types using thiserror. The taxonomy
//! distinguishes validation failures (bad request inputs, checked before any
//! computation) from computation failures (anything that goes wrong while
//! embedding, partitioning, or projecting). A serving wrapper maps the former
//! to client errors and the latter to server errors via `is_validation()`.

use thiserror::Error;

/// Minimum number of clusters a caller may request.
pub const MIN_CLUSTERS: usize = 2;

/// Maximum number of clusters a caller may request.
pub const MAX_CLUSTERS: usize = 50;

/// Main error type for clustering operations.
///
/// All error messages include actionable suggestions for resolution.
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Input text list is empty\nSuggestion: Provide at least one text to cluster")]
    EmptyInput,

    #[error(
        "Invalid cluster count: {k}\nSuggestion: Request between {MIN_CLUSTERS} and {MAX_CLUSTERS} clusters"
    )]
    InvalidClusterCount { k: usize },

    #[error(
        "Not enough texts: {texts} provided for {clusters} clusters\nSuggestion: Provide at least as many texts as requested clusters"
    )]
    TooFewTexts { texts: usize, clusters: usize },

    #[error(
        "Embedding dimension mismatch: expected {expected}, got {actual}\nSuggestion: Ensure all vectors come from the same embedding model"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error(
        "Degenerate input: {0}\nSuggestion: Provide more distinct texts or request fewer clusters"
    )]
    DegenerateInput(String),

    #[error(
        "Embedding generation failed: {0}\nSuggestion: Verify the embedding model is properly initialized"
    )]
    EmbeddingFailed(String),

    #[error(
        "Projection failed: {0}\nSuggestion: Visualization requires at least 2 points and 2 embedding dimensions"
    )]
    ProjectionFailed(String),
}

impl ClusterError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::EmptyInput => "EMPTY_INPUT",
            Self::InvalidClusterCount { .. } => "INVALID_CLUSTER_COUNT",
            Self::TooFewTexts { .. } => "TOO_FEW_TEXTS",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::DegenerateInput(_) => "DEGENERATE_INPUT",
            Self::EmbeddingFailed(_) => "EMBEDDING_FAILED",
            Self::ProjectionFailed(_) => "PROJECTION_FAILED",
        }
    }

    /// True for errors a caller can fix by changing the request.
    ///
    /// Validation errors are detected before any computation starts; a serving
    /// layer should report them as client errors. Everything else is a
    /// computation failure and belongs in the server-error category.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput | Self::InvalidClusterCount { .. } | Self::TooFewTexts { .. }
        )
    }
}

/// Result type alias for clustering operations
pub type PipelineResult<T> = Result<T, ClusterError>;
