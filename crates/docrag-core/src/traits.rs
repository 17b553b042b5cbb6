//! Capability traits for docrag components.
//!
//! - [`Extractor`]: produce a [`Document`] from a file of one kind
//! - [`Embedder`]: turn text into vectors
//! - [`LanguageModel`]: turn a prompt into an answer
//!
//! The model-backed traits describe external services; docrag calls them
//! once per request and never retries.

use async_trait::async_trait;
use std::path::Path;

use crate::error::{EmbedError, ExtractError, GenerateError};
use crate::types::{Document, DocumentKind};

// ============================================================================
// Extraction
// ============================================================================

/// Produces documents from files of one [`DocumentKind`].
#[async_trait]
pub trait Extractor: Send + Sync {
    /// The kind of file this extractor handles.
    fn kind(&self) -> DocumentKind;

    /// Check if this extractor handles the given file.
    fn can_extract(&self, path: &Path) -> bool {
        DocumentKind::from_path(path) == Some(self.kind())
    }

    /// Extract one document from `path`, identified by `source`.
    async fn extract(&self, path: &Path, source: &str) -> Result<Document, ExtractError>;
}

// ============================================================================
// Embedding
// ============================================================================

/// Embedding capability.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model name/identifier, recorded in the persisted index.
    fn model_name(&self) -> &str;

    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed_text(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError>;

    /// Embed a search query.
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, EmbedError> {
        self.embed_text(&[query])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::InvalidResponse("empty embedding result".to_string()))
    }
}

// ============================================================================
// Generation
// ============================================================================

/// Language-model capability.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Complete `prompt` and return the model's text.
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentMetadata;
    use std::path::PathBuf;

    struct StubExtractor;

    #[async_trait]
    impl Extractor for StubExtractor {
        fn kind(&self) -> DocumentKind {
            DocumentKind::Image
        }

        async fn extract(&self, _path: &Path, source: &str) -> Result<Document, ExtractError> {
            Ok(Document::new(
                "stub",
                DocumentMetadata::new(source, DocumentKind::Image, "PNG"),
            ))
        }
    }

    struct EmptyEmbedder;

    #[async_trait]
    impl Embedder for EmptyEmbedder {
        fn model_name(&self) -> &str {
            "empty"
        }

        async fn embed_text(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
            Ok(vec![])
        }
    }

    #[test]
    fn test_can_extract_matches_kind() {
        let extractor = StubExtractor;
        assert!(extractor.can_extract(&PathBuf::from("scan.PNG")));
        assert!(extractor.can_extract(&PathBuf::from("photo.jpeg")));
        assert!(!extractor.can_extract(&PathBuf::from("notes.txt")));
        assert!(!extractor.can_extract(&PathBuf::from("clip.gif")));
    }

    #[tokio::test]
    async fn test_embed_query_rejects_empty_result() {
        let result = EmptyEmbedder.embed_query("anything").await;
        assert!(matches!(result, Err(EmbedError::InvalidResponse(_))));
    }
}
