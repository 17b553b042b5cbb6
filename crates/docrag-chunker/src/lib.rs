//! Document chunking for docrag.
//!
//! [`split_documents`] turns documents into bounded, overlapping chunks with
//! [`RecursiveSplitter`]; [`assign_chunk_ids`] gives the combined stream its
//! `"<source>:<n>"` identities.

pub mod ids;
pub mod recursive;

pub use ids::assign_chunk_ids;
pub use recursive::RecursiveSplitter;

use docrag_core::{ChunkConfig, ChunkError, ChunkOutput, Document};
use tracing::info;

/// Split every document with one splitter, in input order.
pub fn split_documents(
    documents: &[Document],
    config: &ChunkConfig,
) -> Result<Vec<ChunkOutput>, ChunkError> {
    let splitter = RecursiveSplitter::new(config.clone())?;
    let chunks: Vec<ChunkOutput> = documents
        .iter()
        .flat_map(|document| splitter.split_document(document))
        .collect();

    info!(
        "Split {} documents into {} chunks",
        documents.len(),
        chunks.len()
    );
    Ok(chunks)
}
