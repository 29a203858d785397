//! Embedding boundary contract.

use crate::BoxFuture;
use knowledge_search_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::sync::Arc;

/// A dense query embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingVector {
    vector: Arc<[f32]>,
}

impl EmbeddingVector {
    /// Build an embedding vector from a shared slice.
    #[must_use]
    pub const fn new(vector: Arc<[f32]>) -> Self {
        Self { vector }
    }

    /// Build an embedding vector from an owned vector.
    #[must_use]
    pub fn from_vec(vector: Vec<f32>) -> Self {
        Self::new(Arc::from(vector))
    }

    /// Borrow the vector as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.vector
    }

    /// Borrow the shared vector buffer.
    #[must_use]
    pub const fn vector(&self) -> &Arc<[f32]> {
        &self.vector
    }

    /// Vector dimensionality.
    #[must_use]
    pub fn dimension(&self) -> u32 {
        u32::try_from(self.vector.len()).unwrap_or(u32::MAX)
    }

    /// Fail unless the vector has the expected dimension.
    pub fn ensure_dimension(&self, expected: u32) -> Result<()> {
        let actual = self.dimension();
        if actual == expected {
            return Ok(());
        }
        Err(ErrorEnvelope::expected(
            ErrorCode::embedding_failed(),
            format!("embedding dimension mismatch (expected {expected}, got {actual})"),
        )
        .with_metadata("expected", expected.to_string())
        .with_metadata("actual", actual.to_string()))
    }
}

/// Describes the model behind an embedding provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingModelInfo {
    /// Provider label (e.g. `openai-compatible`).
    pub provider: Box<str>,
    /// Model identifier.
    pub model: Box<str>,
    /// Vector dimension the model produces.
    pub dimension: u32,
}

/// Owned request to embed a single text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedRequest {
    /// Text to embed.
    pub text: Box<str>,
}

impl From<&str> for EmbedRequest {
    fn from(text: &str) -> Self {
        Self { text: text.into() }
    }
}

impl From<String> for EmbedRequest {
    fn from(text: String) -> Self {
        Self {
            text: text.into_boxed_str(),
        }
    }
}

/// Owned request to embed a batch of texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedBatchRequest {
    /// Texts to embed, in output order.
    pub texts: Vec<Box<str>>,
}

impl From<Vec<String>> for EmbedBatchRequest {
    fn from(texts: Vec<String>) -> Self {
        Self {
            texts: texts.into_iter().map(String::into_boxed_str).collect(),
        }
    }
}

/// Boundary contract for turning text into vectors.
pub trait EmbeddingPort: Send + Sync {
    /// Model descriptor for this implementation.
    fn model_info(&self) -> &EmbeddingModelInfo;

    /// Embed a single text.
    fn embed(
        &self,
        ctx: &RequestContext,
        request: EmbedRequest,
    ) -> BoxFuture<'_, Result<EmbeddingVector>>;

    /// Embed multiple texts, preserving input order.
    fn embed_batch(
        &self,
        ctx: &RequestContext,
        request: EmbedBatchRequest,
    ) -> BoxFuture<'_, Result<Vec<EmbeddingVector>>>;
}
