//! # docrag-core
//!
//! Core types and traits for docrag, a retrieval-augmented question answering
//! pipeline over a private document collection.
//!
//! ## Architecture
//!
//! ```text
//! File → Extractor → Document → split → ChunkOutput → assign ids → Chunk
//!                                                                   ↓
//!                         question → embed → VectorIndex::search ← build
//!                                                   ↓
//!                                   context + prompt → LanguageModel → answer
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Document`] | Content extracted from one source file |
//! | [`Extraction`] | Outcome of one extraction capability call |
//! | [`ChunkOutput`] | A slice of a document before it has an id |
//! | [`Chunk`] | An identified slice (`"<source>:<n>"`) |
//! | [`SearchHit`] | A retrieved chunk with its similarity score |
//! | [`QueryResult`] | An answer, optionally with sources and context |
//!
//! ## Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`Extractor`] | Produce documents from files of one kind |
//! | [`Embedder`] | Embedding capability |
//! | [`LanguageModel`] | Language-model capability |
//!
//! ## Related Crates
//!
//! - `docrag-extract`: text and image extractors
//! - `docrag-chunker`: recursive splitting and chunk ids
//! - `docrag-embed`: embedding capability clients
//! - `docrag-store`: persisted vector index
//! - `docrag-query`: answer synthesis
//! - `docrag-index`: ingestion pipeline and service context

pub mod error;
pub mod traits;
pub mod types;

pub use error::{
    ChunkError, EmbedError, Error, ExtractError, GenerateError, IndexError, QueryError, Result,
    StoreError,
};
pub use traits::*;
pub use types::*;
