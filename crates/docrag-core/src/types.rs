//! Core types for docrag.
//!
//! ## Documents
//! - [`Document`]: content extracted from one source file
//! - [`DocumentKind`]: text or image, chosen by file extension
//! - [`DocumentMetadata`]: source, kind, format and derived flags
//! - [`Extraction`]: outcome of a single extraction capability call
//!
//! ## Chunks
//! - [`ChunkOutput`]: a slice of a document before it has an identity
//! - [`Chunk`]: an identified slice, ready for embedding
//! - [`ChunkConfig`]: splitting parameters
//!
//! ## Retrieval
//! - [`EmbeddingConfig`]: batching for the embedding capability
//! - [`SearchHit`]: a retrieved chunk with its similarity score
//! - [`QueryResult`]: an answer with optional attribution

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Returned by the vision model when an image holds no text.
pub const NO_TEXT_FOUND: &str = "NO_TEXT_FOUND";

/// Stands in for OCR output when the OCR call failed.
pub const ERROR_EXTRACTING_TEXT: &str = "ERROR_EXTRACTING_TEXT";

/// Stands in for the image description when the description call failed.
pub const ERROR_GENERATING_DESCRIPTION: &str = "ERROR_GENERATING_DESCRIPTION";

// ============================================================================
// Documents
// ============================================================================

/// Category of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Plain text, markdown and PDF documents
    Text,
    /// PNG and JPEG images
    Image,
}

impl DocumentKind {
    /// Map a file extension to the kind of extractor that handles it.
    ///
    /// Unrecognized extensions return `None` and are ignored during ingestion.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" | "md" | "markdown" | "pdf" => Some(Self::Text),
            "png" | "jpg" | "jpeg" => Some(Self::Image),
            _ => None,
        }
    }

    /// Map a path to a kind by its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata attached to a document and inherited by its chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Source identifier: path relative to the corpus root
    pub source: String,
    /// Text or image
    #[serde(rename = "type")]
    pub kind: DocumentKind,
    /// Upper-cased format name (TXT, MD, PDF, PNG, JPEG)
    pub format: String,
    /// Whether OCR produced usable text (images only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_ocr: Option<bool>,
    /// Further derived flags (image dimensions, page count)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl DocumentMetadata {
    /// Create metadata with no derived flags.
    pub fn new(source: impl Into<String>, kind: DocumentKind, format: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            kind,
            format: format.into(),
            has_ocr: None,
            extra: BTreeMap::new(),
        }
    }
}

/// Content extracted from a single source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.metadata.source
    }
}

/// Outcome of one extraction capability call (an OCR pass, a description).
///
/// Failures are values, not errors: the document builder decides how a
/// failed call is rendered into content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The capability answered with this text (trimmed)
    Extracted(String),
    /// The capability call failed for the given reason
    Failed(String),
}

impl Extraction {
    /// Wrap a capability result, trimming successful output.
    pub fn from_result<E: fmt::Display>(result: std::result::Result<String, E>) -> Self {
        match result {
            Ok(text) => Self::Extracted(text.trim().to_string()),
            Err(e) => Self::Failed(e.to_string()),
        }
    }

    /// The extracted text, if the call succeeded.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Extracted(text) => Some(text),
            Self::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

// ============================================================================
// Chunks
// ============================================================================

/// Configuration for recursive splitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum chunk length in characters
    pub chunk_size: usize,
    /// Characters shared between adjacent chunks of one document
    pub chunk_overlap: usize,
    /// Separators tried in order, coarsest first; `""` splits characters
    pub separators: Vec<String>,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 80,
            separators: vec![
                "\n\n".to_string(),
                "\n".to_string(),
                " ".to_string(),
                String::new(),
            ],
        }
    }
}

/// A slice of a document that has not been assigned an identity yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOutput {
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl ChunkOutput {
    #[must_use]
    pub fn source(&self) -> &str {
        &self.metadata.source
    }
}

/// An identified chunk: `chunk_id` is `"<source>:<n>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl Chunk {
    #[must_use]
    pub fn source(&self) -> &str {
        &self.metadata.source
    }

    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        self.metadata.kind
    }
}

// ============================================================================
// Embedding
// ============================================================================

/// Configuration for embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Chunk contents sent per embedding request
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { batch_size: 32 }
    }
}

// ============================================================================
// Search
// ============================================================================

/// A chunk returned by similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk_id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
    /// Cosine similarity to the query
    pub score: f32,
}

/// Answer to a question, with attribution when it was requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    /// Chunk ids in retrieval order; empty in plain mode
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    /// Retrieved chunk contents joined by blank lines; empty in plain mode
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,
}

impl QueryResult {
    /// An answer without attribution.
    pub fn plain(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            ..Default::default()
        }
    }
}
