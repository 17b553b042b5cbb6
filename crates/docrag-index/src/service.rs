//! Service context owning the current index.
//!
//! [`RagService`] is what a transport layer calls. It holds the published
//! index behind an `Arc`; queries take a snapshot of that reference and a
//! reindex replaces it in one assignment after the new index is fully built
//! and persisted.

use docrag_core::{ChunkConfig, DocumentKind, Embedder, EmbeddingConfig, Error, LanguageModel};
use docrag_core::{QueryError, QueryResult};
use docrag_extract::{ExtractionFailure, ExtractorRegistry};
use docrag_query::{AnswerSynthesizer, DEFAULT_PLAIN_K, DEFAULT_SOURCED_K};
use docrag_store::{IndexStats, VectorIndex};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::pipeline::IngestPipeline;

/// Settings for a [`RagService`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory scanned for source files
    pub data_dir: PathBuf,
    /// Directory holding the persisted index
    pub index_dir: PathBuf,
    /// Splitting parameters
    pub chunk: ChunkConfig,
    /// Embedding batch size
    pub embedding: EmbeddingConfig,
    /// Chunks retrieved for plain answers
    pub plain_k: usize,
    /// Chunks retrieved for answers with sources
    pub sourced_k: usize,
    /// Files extracted concurrently
    pub max_concurrent_extractions: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            index_dir: PathBuf::from("rag_index"),
            chunk: ChunkConfig::default(),
            embedding: EmbeddingConfig::default(),
            plain_k: DEFAULT_PLAIN_K,
            sourced_k: DEFAULT_SOURCED_K,
            max_concurrent_extractions: 4,
        }
    }
}

/// Result of a reindex.
#[derive(Debug, Clone, Serialize)]
pub struct ReindexReport {
    /// Documents extracted from text files
    pub text_documents: usize,
    /// Documents extracted from images
    pub image_documents: usize,
    pub chunk_count: usize,
    pub text_chunks: usize,
    pub image_chunks: usize,
    pub failed_files: Vec<ExtractionFailure>,
}

/// Snapshot of the service state.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub data_dir: PathBuf,
    pub index_dir: PathBuf,
    /// Embedding model currently configured
    pub embedding_model: String,
    /// Published index, if any
    pub index: Option<IndexStats>,
}

/// Owns the pipeline components and the published index.
pub struct RagService {
    config: ServiceConfig,
    pipeline: IngestPipeline,
    embedder: Arc<dyn Embedder>,
    synthesizer: AnswerSynthesizer,
    /// Published index
    index: RwLock<Option<Arc<VectorIndex>>>,
    /// Serializes builds so two reindexes never race to publish
    build_lock: Mutex<()>,
}

impl RagService {
    /// Create a service; fails if the chunk configuration is invalid.
    pub fn new(
        config: ServiceConfig,
        extractors: ExtractorRegistry,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LanguageModel>,
    ) -> Result<Self, Error> {
        let pipeline = IngestPipeline::new(
            Arc::new(extractors),
            config.chunk.clone(),
            config.max_concurrent_extractions,
        )?;
        let synthesizer = AnswerSynthesizer::new(embedder.clone(), llm)
            .with_k(config.plain_k, config.sourced_k);

        Ok(Self {
            config,
            pipeline,
            embedder,
            synthesizer,
            index: RwLock::new(None),
            build_lock: Mutex::new(()),
        })
    }

    /// The published index, if any.
    pub async fn current(&self) -> Option<Arc<VectorIndex>> {
        self.index.read().await.clone()
    }

    async fn publish(&self, index: VectorIndex) -> Arc<VectorIndex> {
        let index = Arc::new(index);
        *self.index.write().await = Some(index.clone());
        index
    }

    /// Load the persisted index and publish it, without building.
    ///
    /// Returns `Ok(None)` when there is no usable index on disk, including an
    /// index built with a different embedding model.
    pub async fn load(&self) -> Result<Option<Arc<VectorIndex>>, Error> {
        match VectorIndex::load(&self.config.index_dir).await {
            Ok(index) if index.model() == self.embedder.model_name() => {
                Ok(Some(self.publish(index).await))
            }
            Ok(index) => {
                warn!(
                    "Index at {:?} was built with {}, current model is {}; treating as stale",
                    self.config.index_dir,
                    index.model(),
                    self.embedder.model_name()
                );
                Ok(None)
            }
            Err(e) if e.is_not_found() => {
                info!("{}", e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Make sure an index is published: reuse it, load it, or build it.
    pub async fn ensure_index(&self) -> Result<Arc<VectorIndex>, Error> {
        if let Some(index) = self.current().await {
            return Ok(index);
        }

        let _guard = self.build_lock.lock().await;
        if let Some(index) = self.current().await {
            return Ok(index);
        }
        if let Some(index) = self.load().await? {
            return Ok(index);
        }

        info!("No usable index found, building from {:?}", self.config.data_dir);
        let (index, _) = self.build_and_publish().await?;
        Ok(index)
    }

    /// Rebuild the index from the corpus, persist it and publish it.
    ///
    /// The previous index stays published until the new one is complete; a
    /// failed build leaves it in place.
    pub async fn reindex(&self) -> Result<ReindexReport, Error> {
        let _guard = self.build_lock.lock().await;
        let (_, report) = self.build_and_publish().await?;
        Ok(report)
    }

    async fn build_and_publish(&self) -> Result<(Arc<VectorIndex>, ReindexReport), Error> {
        let output = self.pipeline.run(&self.config.data_dir).await?;
        let report = ReindexReport {
            text_documents: output.text_documents,
            image_documents: output.image_documents,
            chunk_count: output.chunks.len(),
            text_chunks: output.chunk_count(DocumentKind::Text),
            image_chunks: output.chunk_count(DocumentKind::Image),
            failed_files: output.failures,
        };

        let index =
            VectorIndex::build(output.chunks, self.embedder.as_ref(), &self.config.embedding)
                .await?;
        index.persist(&self.config.index_dir).await?;
        let index = self.publish(index).await;

        info!(
            "Reindexed {} chunks ({} text, {} image, {} files failed)",
            report.chunk_count,
            report.text_chunks,
            report.image_chunks,
            report.failed_files.len()
        );
        Ok((index, report))
    }

    /// Answer a question from the published index.
    pub async fn query(&self, question: &str) -> Result<QueryResult, QueryError> {
        let index = self.current().await.ok_or(QueryError::NoIndex)?;
        self.synthesizer.answer(&index, question).await
    }

    /// Answer a question with the chunk ids and context that were used.
    pub async fn query_with_sources(&self, question: &str) -> Result<QueryResult, QueryError> {
        let index = self.current().await.ok_or(QueryError::NoIndex)?;
        self.synthesizer.answer_with_sources(&index, question).await
    }

    pub async fn status(&self) -> ServiceStatus {
        ServiceStatus {
            data_dir: self.config.data_dir.clone(),
            index_dir: self.config.index_dir.clone(),
            embedding_model: self.embedder.model_name().to_string(),
            index: self.current().await.map(|index| index.stats()),
        }
    }
}
