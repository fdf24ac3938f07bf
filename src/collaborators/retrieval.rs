//! Retrieval boundary and the in-memory vector index reference backend.

use async_trait::async_trait;
use miette::Diagnostic;
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;

use super::embedding::{Embedder, EmbeddingError};

/// One scored document returned by a similarity search.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentHit {
    /// The stored document text.
    pub text: String,
    /// Caller-supplied metadata stored alongside the document.
    pub metadata: serde_json::Value,
    /// Cosine similarity against the query, higher is closer.
    pub score: f32,
}

/// Narrow interface to a similarity search backend.
///
/// Hits come back ordered by descending score. Searching an empty index is
/// not an error; it returns an empty list and the caller proceeds without
/// retrieved context.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `k` documents most similar to `query`.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<DocumentHit>, RetrievalError>;
}

/// Failures surfaced by a [`Retriever`].
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum RetrievalError {
    /// Embedding the query or a document failed.
    #[error("retrieval embedding failed: {0}")]
    #[diagnostic(code(supportflow::collaborators::retrieval_embedding))]
    Embedding(#[from] EmbeddingError),

    /// The search backend itself failed.
    #[error("retrieval backend failed: {message}")]
    #[diagnostic(code(supportflow::collaborators::retrieval_backend))]
    Backend { message: String },
}

impl RetrievalError {
    /// Whether a retry with backoff has a chance of succeeding.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            RetrievalError::Embedding(err) => err.is_transient(),
            RetrievalError::Backend { .. } => false,
        }
    }
}

struct IndexedDocument {
    text: String,
    metadata: serde_json::Value,
    vector: Vec<f32>,
}

/// In-memory cosine similarity index over an [`Embedder`].
///
/// The reference retrieval backend: documents are embedded when added and
/// scored against the embedded query on search. Suitable for catalogs of
/// up to a few thousand snippets; larger corpora belong in a dedicated
/// vector store behind the same [`Retriever`] trait.
///
/// # Examples
///
/// ```rust
/// use supportflow::collaborators::{Embedder, EmbeddingError, VectorIndex};
/// use async_trait::async_trait;
/// use std::sync::Arc;
///
/// /// Maps text length onto a two-dimensional vector.
/// struct ToyEmbedder;
///
/// #[async_trait]
/// impl Embedder for ToyEmbedder {
///     async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
///         Ok(vec![text.len() as f32, 1.0])
///     }
///
///     fn dimension(&self) -> usize {
///         2
///     }
/// }
///
/// let index = VectorIndex::new(Arc::new(ToyEmbedder));
/// assert!(index.is_empty());
/// ```
pub struct VectorIndex {
    embedder: Arc<dyn Embedder>,
    documents: RwLock<Vec<IndexedDocument>>,
}

impl VectorIndex {
    /// Creates an empty index bound to one embedding model.
    #[must_use]
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            documents: RwLock::new(Vec::new()),
        }
    }

    /// Embeds and stores one document with its metadata.
    pub async fn add_document(
        &self,
        text: impl Into<String>,
        metadata: serde_json::Value,
    ) -> Result<(), RetrievalError> {
        let text = text.into();
        let vector = self.embed_checked(&text).await?;
        self.documents.write().push(IndexedDocument {
            text,
            metadata,
            vector,
        });
        Ok(())
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Whether the index holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    async fn embed_checked(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let vector = self.embedder.embed(text).await?;
        let expected = self.embedder.dimension();
        if vector.len() != expected {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: vector.len(),
            }
            .into());
        }
        Ok(vector)
    }
}

#[async_trait]
impl Retriever for VectorIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<DocumentHit>, RetrievalError> {
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }
        let query_vector = self.embed_checked(query).await?;

        let mut hits: Vec<DocumentHit> = self
            .documents
            .read()
            .iter()
            .map(|doc| DocumentHit {
                text: doc.text.clone(),
                metadata: doc.metadata.clone(),
                score: cosine_similarity(&query_vector, &doc.vector),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }
}

/// Cosine similarity between two equal-length vectors.
///
/// A zero vector has no direction; its similarity against anything is 0.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Projects text onto a fixed 3-dimensional direction per keyword.
    struct KeywordEmbedder;

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![
                if text.contains("price") { 1.0 } else { 0.0 },
                if text.contains("setup") { 1.0 } else { 0.0 },
                if text.contains("refund") { 1.0 } else { 0.0 },
            ])
        }

        fn dimension(&self) -> usize {
            3
        }
    }

    /// Always returns one dimension too few.
    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![1.0, 0.0])
        }

        fn dimension(&self) -> usize {
            3
        }
    }

    #[tokio::test]
    async fn search_orders_by_descending_similarity_and_clamps_k() {
        let index = VectorIndex::new(Arc::new(KeywordEmbedder));
        index
            .add_document("price list for packages", json!({"plan": "S"}))
            .await
            .unwrap();
        index
            .add_document("setup guide", json!({"topic": "install"}))
            .await
            .unwrap();
        index
            .add_document("price and setup bundle", json!({"plan": "M"}))
            .await
            .unwrap();

        let hits = index.search("what is the price", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "price list for packages");
        assert!(hits[0].score >= hits[1].score);

        let all = index.search("price", 10).await.unwrap();
        assert_eq!(all.len(), 3, "k larger than the index returns everything");
    }

    #[tokio::test]
    async fn empty_index_returns_no_hits() {
        let index = VectorIndex::new(Arc::new(KeywordEmbedder));
        let hits = index.search("anything", 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected_on_add() {
        let index = VectorIndex::new(Arc::new(ShortEmbedder));
        let err = index.add_document("doc", json!({})).await.unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::Embedding(EmbeddingError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn zero_vector_has_zero_similarity() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
