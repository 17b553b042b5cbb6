//! Chunk identity.

use docrag_core::{Chunk, ChunkOutput};

/// Assign `"<source>:<n>"` ids to a chunk stream.
///
/// Chunks are stable-sorted by source first, so `n` counts from 0 within each
/// source in production order no matter how the input interleaves sources.
#[must_use]
pub fn assign_chunk_ids(mut chunks: Vec<ChunkOutput>) -> Vec<Chunk> {
    chunks.sort_by(|a, b| a.metadata.source.cmp(&b.metadata.source));

    let mut last_source: Option<String> = None;
    let mut index = 0usize;

    chunks
        .into_iter()
        .map(|chunk| {
            if last_source.as_deref() == Some(chunk.source()) {
                index += 1;
            } else {
                index = 0;
                last_source = Some(chunk.metadata.source.clone());
            }

            Chunk {
                chunk_id: format!("{}:{}", chunk.metadata.source, index),
                content: chunk.content,
                metadata: chunk.metadata,
            }
        })
        .collect()
}
