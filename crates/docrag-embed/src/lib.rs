//! Embedding capability clients for docrag.
//!
//! - [`OllamaEmbedder`]: talks to an Ollama-compatible embedding endpoint
//! - [`NoopEmbedder`]: zero-vectors, no model server needed

pub mod noop;
pub mod ollama;

pub use noop::NoopEmbedder;
pub use ollama::{OllamaEmbedder, DEFAULT_EMBEDDING_MODEL};
