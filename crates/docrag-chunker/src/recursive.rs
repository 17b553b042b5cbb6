//! Recursive character splitting with overlap.
//!
//! Content is split on the coarsest separator that occurs in it, small
//! pieces are merged back up to `chunk_size` characters, and pieces that are
//! still too large are split again with the remaining, finer separators.

use docrag_core::{ChunkConfig, ChunkError, ChunkOutput, Document};
use tracing::{debug, warn};

/// Splits documents into overlapping, size-bounded chunks.
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    config: ChunkConfig,
}

impl RecursiveSplitter {
    /// Create a splitter, rejecting configurations that cannot make progress.
    pub fn new(config: ChunkConfig) -> Result<Self, ChunkError> {
        if config.chunk_size == 0 {
            return Err(ChunkError::InvalidConfig(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(ChunkError::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Split one document; every chunk carries a copy of its metadata.
    #[must_use]
    pub fn split_document(&self, document: &Document) -> Vec<ChunkOutput> {
        let chunks: Vec<ChunkOutput> = self
            .split_text(&document.content)
            .into_iter()
            .map(|content| ChunkOutput {
                content,
                metadata: document.metadata.clone(),
            })
            .collect();

        debug!(
            "Split {} into {} chunks",
            document.metadata.source,
            chunks.len()
        );
        chunks
    }

    /// Split raw text into trimmed, non-empty chunks.
    #[must_use]
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if self.config.separators.is_empty() {
            return trimmed(text).into_iter().collect();
        }
        let separators: Vec<&str> = self.config.separators.iter().map(String::as_str).collect();
        self.split_recursive(text, &separators)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (separator, finer) = choose_separator(text, separators);
        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.config.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge(&pending));
                pending.clear();
            }
            if finer.is_empty() {
                chunks.extend(trimmed(piece));
            } else {
                chunks.extend(self.split_recursive(piece, finer));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(&pending));
        }
        chunks
    }

    /// Greedily join pieces up to `chunk_size`, carrying up to
    /// `chunk_overlap` characters of trailing pieces into the next chunk.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut chunks = Vec::new();
        let mut window: Vec<(&str, usize)> = Vec::new();
        let mut total = 0usize;
        let mut front = 0usize;

        for &piece in pieces {
            let len = char_len(piece);

            if total + len > size && front < window.len() {
                if total > size {
                    warn!("Created a chunk of {} characters, above the limit of {}", total, size);
                }
                chunks.extend(join_window(&window[front..]));

                while front < window.len()
                    && (total > overlap || (total + len > size && total > 0))
                {
                    total -= window[front].1;
                    front += 1;
                }
            }

            window.push((piece, len));
            total += len;
        }

        chunks.extend(join_window(&window[front..]));
        chunks
    }
}

/// Pick the first separator present in `text`; the empty separator always
/// matches. Returns it with the finer separators left for oversized pieces.
fn choose_separator<'a, 's>(text: &str, separators: &'s [&'a str]) -> (&'a str, &'s [&'a str]) {
    for (i, &separator) in separators.iter().enumerate() {
        if separator.is_empty() {
            return (separator, &[]);
        }
        if text.contains(separator) {
            return (separator, &separators[i + 1..]);
        }
    }
    (separators[separators.len() - 1], &[])
}

/// Split on `separator`, attaching each occurrence to the start of the
/// piece that follows it. The empty separator splits into characters.
fn split_keeping_separator<'t>(text: &'t str, separator: &str) -> Vec<&'t str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (index, _) in text.match_indices(separator) {
        if index > start {
            pieces.push(&text[start..index]);
        }
        start = index;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

fn join_window(window: &[(&str, usize)]) -> Option<String> {
    let joined: String = window.iter().map(|(piece, _)| *piece).collect();
    trimmed(&joined)
}

fn trimmed(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
