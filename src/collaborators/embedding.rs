//! Embedding model boundary for vector similarity search.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

/// Embedding dimension of the hosted model the support index is built for.
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;

/// Narrow interface to a text embedding model.
///
/// The dimension is fixed per index: every vector an implementation
/// returns must have exactly [`dimension`](Self::dimension) components,
/// and [`VectorIndex`](crate::collaborators::VectorIndex) rejects vectors
/// that do not.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one text into a vector of [`dimension`](Self::dimension) floats.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// The fixed dimensionality of vectors this embedder produces.
    fn dimension(&self) -> usize;
}

/// Failures surfaced by an [`Embedder`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum EmbeddingError {
    /// The call exceeded its bounded timeout.
    #[error("embedding request timed out after {waited_ms} ms")]
    #[diagnostic(code(supportflow::collaborators::embedding_timeout))]
    Timeout { waited_ms: u64 },

    /// The provider failed in a way that will not succeed on retry.
    #[error("embedding provider rejected the request: {message}")]
    #[diagnostic(code(supportflow::collaborators::embedding_provider))]
    Provider { message: String },

    /// A returned vector did not match the index dimension.
    #[error("embedding has {actual} dimensions, the index expects {expected}")]
    #[diagnostic(
        code(supportflow::collaborators::embedding_dimension),
        help("An index is bound to one embedding model. Rebuild the index rather than mixing models.")
    )]
    DimensionMismatch { expected: usize, actual: usize },
}

impl EmbeddingError {
    /// Whether a retry with backoff has a chance of succeeding.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, EmbeddingError::Timeout { .. })
    }
}
