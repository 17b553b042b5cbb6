//! Vector index storage for docrag.
//!
//! [`VectorIndex`] holds `(chunk_id, content, metadata, embedding)` entries
//! for one corpus snapshot, answers top-k cosine similarity queries, and is
//! persisted to and loaded from a directory as a single unit.

pub mod index;
pub mod persist;

pub use index::{cosine_similarity, IndexEntry, IndexStats, VectorIndex, FORMAT_VERSION};
pub use persist::{index_path, INDEX_FILE};
