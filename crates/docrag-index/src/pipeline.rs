//! Ingestion pipeline: scan, extract, split, identify.

use docrag_chunker::{assign_chunk_ids, split_documents, RecursiveSplitter};
use docrag_core::{Chunk, ChunkConfig, ChunkError, DocumentKind, Error};
use docrag_extract::{scan_corpus, ExtractionFailure, ExtractorRegistry};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Chunks produced from one corpus snapshot.
#[derive(Debug, Default)]
pub struct IngestOutput {
    /// Identified chunks, grouped by source
    pub chunks: Vec<Chunk>,
    /// Files that contributed nothing
    pub failures: Vec<ExtractionFailure>,
    /// Text documents extracted
    pub text_documents: usize,
    /// Image documents extracted
    pub image_documents: usize,
}

impl IngestOutput {
    /// Number of chunks of one kind.
    #[must_use]
    pub fn chunk_count(&self, kind: DocumentKind) -> usize {
        self.chunks.iter().filter(|c| c.kind() == kind).count()
    }
}

/// Turns a data directory into identified chunks.
pub struct IngestPipeline {
    extractors: Arc<ExtractorRegistry>,
    chunk_config: ChunkConfig,
    max_concurrent: usize,
}

impl IngestPipeline {
    /// Create a pipeline; the chunk configuration is checked here, before any
    /// file is read.
    pub fn new(
        extractors: Arc<ExtractorRegistry>,
        chunk_config: ChunkConfig,
        max_concurrent: usize,
    ) -> Result<Self, ChunkError> {
        RecursiveSplitter::new(chunk_config.clone())?;
        Ok(Self {
            extractors,
            chunk_config,
            max_concurrent,
        })
    }

    /// Run extraction and chunking over every recognized file in `data_dir`.
    pub async fn run(&self, data_dir: &Path) -> Result<IngestOutput, Error> {
        let files = scan_corpus(data_dir).await?;
        info!("Ingesting {} files from {:?}", files.len(), data_dir);

        let report = self.extractors.extract_all(files, self.max_concurrent).await;
        let text_documents = report.count(DocumentKind::Text);
        let image_documents = report.count(DocumentKind::Image);

        let chunks = assign_chunk_ids(split_documents(&report.documents, &self.chunk_config)?);

        Ok(IngestOutput {
            chunks,
            failures: report.failures,
            text_documents,
            image_documents,
        })
    }
}
