//! Error types for docrag.
//!
//! Each pipeline stage has its own error enum; [`Error`] aggregates them for
//! callers that drive the whole pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for docrag operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Content extraction failed
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractError),

    /// Chunking failed
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkError),

    /// Embedding generation failed
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbedError),

    /// Language or vision model call failed
    #[error("generation error: {0}")]
    Generation(#[from] GenerateError),

    /// Persisted index could not be read or written
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Index build failed
    #[error("indexing error: {0}")]
    Indexing(#[from] IndexError),

    /// Query failed
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-file extraction errors.
///
/// These never abort an ingestion run; the extractor registry records them
/// and moves on to the next file.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("extraction failed: {0}")]
    Failed(String),
}

/// Chunking errors.
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Embedding capability errors.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("embedding service unreachable: {0}")]
    Unreachable(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
}

/// Language-model and vision capability errors.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("model service unreachable: {0}")]
    Unreachable(String),

    #[error("model returned an error: {0}")]
    Model(String),

    #[error("invalid model response: {0}")]
    InvalidResponse(String),
}

/// Persisted index errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The location holds no usable index. Callers rebuild instead of failing.
    #[error("no index at {path}: {reason}")]
    IndexNotFound { path: PathBuf, reason: String },

    #[error("persist failed: {0}")]
    Persist(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether this error means "no index yet" rather than a storage fault.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::IndexNotFound { .. })
    }
}

/// Index build errors. A failed build never publishes a partial index.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("no documents indexed: the corpus produced no chunks")]
    EmptyCorpus,

    #[error("duplicate chunk id: {0}")]
    DuplicateChunkId(String),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbedError),

    #[error("embedding count mismatch: expected {expected}, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("embedding dimension mismatch for {chunk_id}: expected {expected}, got {actual}")]
    DimensionMismatch {
        chunk_id: String,
        expected: usize,
        actual: usize,
    },
}

/// Query-time errors, surfaced to the caller as a single failure.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("no index is loaded; run a reindex first")]
    NoIndex,

    #[error("query embedding failed: {0}")]
    Embedding(#[from] EmbedError),

    #[error("answer generation failed: {0}")]
    Generation(#[from] GenerateError),

    #[error("query vector has dimension {actual}, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Result type alias for docrag operations.
pub type Result<T> = std::result::Result<T, Error>;
