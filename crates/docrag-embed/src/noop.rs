//! No-op embedder for running the pipeline without a model server.

use async_trait::async_trait;
use docrag_core::{EmbedError, Embedder};

/// Embedder that returns zero-vectors.
///
/// Every chunk scores the same against every query, so search returns chunks
/// in insertion order. Useful for dry runs and for stubbing embeddings in
/// tests.
///
/// # Example
///
/// ```rust
/// use docrag_embed::NoopEmbedder;
/// use docrag_core::Embedder;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let embedder = NoopEmbedder::new();
/// let vectors = embedder.embed_text(&["Hello", "World"]).await?;
///
/// assert_eq!(vectors.len(), 2);
/// assert_eq!(vectors[0].len(), 384);
/// assert!(vectors[0].iter().all(|&v| v == 0.0));
/// # Ok(())
/// # }
/// ```
pub struct NoopEmbedder {
    dimension: usize,
}

impl NoopEmbedder {
    /// Create a new no-op embedder with default dimension (384).
    #[must_use]
    pub fn new() -> Self {
        Self { dimension: 384 }
    }

    /// Create a new no-op embedder with custom dimension.
    #[must_use]
    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl Default for NoopEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for NoopEmbedder {
    fn model_name(&self) -> &str {
        "noop"
    }

    async fn embed_text(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|_| vec![0.0; self.dimension]).collect())
    }
}
