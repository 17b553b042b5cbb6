//! In-memory vector index with brute-force cosine search.

use chrono::{DateTime, Utc};
use docrag_core::{
    Chunk, DocumentKind, DocumentMetadata, Embedder, EmbeddingConfig, IndexError, QueryError,
    SearchHit,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// Version written into every persisted index.
pub const FORMAT_VERSION: u32 = 1;

/// One indexed chunk with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk_id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
    pub embedding: Vec<f32>,
}

/// Summary of an index for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub chunk_count: usize,
    pub text_chunks: usize,
    pub image_chunks: usize,
    pub model: String,
    pub dimension: usize,
    pub built_at: DateTime<Utc>,
}

/// Vector similarity index over one corpus snapshot.
///
/// Built once, persisted and loaded as a unit, never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorIndex {
    /// Persisted format version
    pub(crate) format_version: u32,
    /// Embedding model that produced the vectors
    pub(crate) model: String,
    /// Length of every embedding
    pub(crate) dimension: usize,
    /// When the index was built
    pub(crate) built_at: DateTime<Utc>,
    /// Entries in insertion order
    pub(crate) entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Embed every chunk and build an index.
    ///
    /// Fails without producing an index if there are no chunks, a chunk id
    /// repeats, or the embedder fails or returns inconsistent vectors.
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: &dyn Embedder,
        config: &EmbeddingConfig,
    ) -> Result<Self, IndexError> {
        if chunks.is_empty() {
            return Err(IndexError::EmptyCorpus);
        }

        let mut seen = HashSet::with_capacity(chunks.len());
        for chunk in &chunks {
            if !seen.insert(chunk.chunk_id.as_str()) {
                return Err(IndexError::DuplicateChunkId(chunk.chunk_id.clone()));
            }
        }

        let batch_size = config.batch_size.max(1);
        let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.content.as_str()).collect();
            let vectors = embedder.embed_text(&texts).await?;
            if vectors.len() != texts.len() {
                return Err(IndexError::CountMismatch {
                    expected: texts.len(),
                    actual: vectors.len(),
                });
            }
            embeddings.extend(vectors);
            debug!("Embedded {}/{} chunks", embeddings.len(), chunks.len());
        }

        let dimension = embeddings.first().map_or(0, Vec::len);
        let mut entries = Vec::with_capacity(chunks.len());
        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            if embedding.len() != dimension || dimension == 0 {
                return Err(IndexError::DimensionMismatch {
                    chunk_id: chunk.chunk_id,
                    expected: dimension,
                    actual: embedding.len(),
                });
            }
            entries.push(IndexEntry {
                chunk_id: chunk.chunk_id,
                content: chunk.content,
                metadata: chunk.metadata,
                embedding,
            });
        }

        info!(
            "Built index of {} chunks ({} dimensions, model {})",
            entries.len(),
            dimension,
            embedder.model_name()
        );

        Ok(Self {
            format_version: FORMAT_VERSION,
            model: embedder.model_name().to_string(),
            dimension,
            built_at: Utc::now(),
            entries,
        })
    }

    /// Embed `query` with `embedder` and return the `k` nearest chunks.
    pub async fn search(
        &self,
        embedder: &dyn Embedder,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchHit>, QueryError> {
        let vector = embedder.embed_query(query).await?;
        self.search_by_vector(&vector, k)
    }

    /// The `k` entries most similar to `query`, nearest first.
    ///
    /// Equal scores keep insertion order; `k` beyond the index size returns
    /// every entry.
    pub fn search_by_vector(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, QueryError> {
        if query.len() != self.dimension {
            return Err(QueryError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query, &entry.embedding)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, score)| {
                let entry = &self.entries[i];
                SearchHit {
                    chunk_id: entry.chunk_id.clone(),
                    content: entry.content.clone(),
                    metadata: entry.metadata.clone(),
                    score,
                }
            })
            .collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[must_use]
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    #[must_use]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Look up an entry by chunk id.
    #[must_use]
    pub fn get(&self, chunk_id: &str) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.chunk_id == chunk_id)
    }

    #[must_use]
    pub fn stats(&self) -> IndexStats {
        let count = |kind: DocumentKind| {
            self.entries
                .iter()
                .filter(|e| e.metadata.kind == kind)
                .count()
        };
        IndexStats {
            chunk_count: self.entries.len(),
            text_chunks: count(DocumentKind::Text),
            image_chunks: count(DocumentKind::Image),
            model: self.model.clone(),
            dimension: self.dimension,
            built_at: self.built_at,
        }
    }
}

/// Cosine similarity; 0 for mismatched lengths, zero vectors, or a
/// non-finite result.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let score = dot / (norm_a * norm_b);
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use docrag_core::EmbedError;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    /// One axis per keyword plus a constant axis, so every vector is non-zero.
    pub(crate) struct KeywordEmbedder {
        pub(crate) calls: AtomicUsize,
    }

    const KEYWORDS: [&str; 3] = ["france", "invoice", "weather"];

    impl KeywordEmbedder {
        pub(crate) fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        fn model_name(&self) -> &str {
            "keyword"
        }

        async fn embed_text(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            Ok(texts
                .iter()
                .map(|text| {
                    let lower = text.to_lowercase();
                    let mut vector: Vec<f32> = KEYWORDS
                        .iter()
                        .map(|k| if lower.contains(k) { 1.0 } else { 0.0 })
                        .collect();
                    vector.push(0.1);
                    vector
                })
                .collect())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        fn model_name(&self) -> &str {
            "failing"
        }

        async fn embed_text(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
            Err(EmbedError::Unreachable("connection refused".to_string()))
        }
    }

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        fn model_name(&self) -> &str {
            "short"
        }

        async fn embed_text(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
            Ok(texts.iter().skip(1).map(|_| vec![1.0]).collect())
        }
    }

    struct RaggedEmbedder;

    #[async_trait]
    impl Embedder for RaggedEmbedder {
        fn model_name(&self) -> &str {
            "ragged"
        }

        async fn embed_text(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
            Ok(texts.iter().map(|t| vec![1.0; t.len()]).collect())
        }
    }

    pub(crate) fn chunk(chunk_id: &str, content: &str) -> Chunk {
        let source = chunk_id.rsplit_once(':').map_or(chunk_id, |(s, _)| s);
        let kind = DocumentKind::from_extension(source.rsplit('.').next().unwrap_or_default())
            .unwrap_or(DocumentKind::Text);
        Chunk {
            chunk_id: chunk_id.to_string(),
            content: content.to_string(),
            metadata: DocumentMetadata::new(source, kind, "TXT"),
        }
    }

    pub(crate) fn sample_chunks() -> Vec<Chunk> {
        vec![
            chunk("france.txt:0", "Paris is the capital of France."),
            chunk("invoice.png:0", "[Image: invoice.png]\nINVOICE #123"),
            chunk("weather.md:0", "The weather today is sunny."),
            chunk("misc.txt:0", "Nothing relevant here."),
        ]
    }

    pub(crate) async fn build_sample(embedder: &dyn Embedder) -> VectorIndex {
        VectorIndex::build(sample_chunks(), embedder, &EmbeddingConfig::default())
            .await
            .unwrap()
    }

    async fn build_with(chunks: Vec<Chunk>, embedder: &dyn Embedder) -> Result<VectorIndex, IndexError> {
        VectorIndex::build(chunks, embedder, &EmbeddingConfig::default()).await
    }

    // ==================== Cosine Tests ====================

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_non_finite_is_zero() {
        assert_eq!(cosine_similarity(&[f32::INFINITY, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 1.0]), 0.0);
    }

    // ==================== Build Tests ====================

    #[tokio::test]
    async fn test_build_empty_fails() {
        let result = build_with(vec![], &KeywordEmbedder::new()).await;
        assert!(matches!(result, Err(IndexError::EmptyCorpus)));
    }

    #[tokio::test]
    async fn test_build_records_manifest() {
        let index = build_sample(&KeywordEmbedder::new()).await;

        assert_eq!(index.len(), 4);
        assert_eq!(index.model(), "keyword");
        assert_eq!(index.dimension(), 4);
        assert_eq!(index.format_version, FORMAT_VERSION);
        assert_eq!(index.entries()[1].chunk_id, "invoice.png:0");
    }

    #[tokio::test]
    async fn test_build_batches_requests() {
        let embedder = KeywordEmbedder::new();
        let config = EmbeddingConfig { batch_size: 3 };

        VectorIndex::build(sample_chunks(), &embedder, &config).await.unwrap();

        assert_eq!(embedder.calls.load(AtomicOrdering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_build_rejects_duplicate_ids() {
        let chunks = vec![chunk("a.txt:0", "one"), chunk("a.txt:0", "two")];
        let result = build_with(chunks, &KeywordEmbedder::new()).await;
        assert!(matches!(result, Err(IndexError::DuplicateChunkId(id)) if id == "a.txt:0"));
    }

    #[tokio::test]
    async fn test_build_embedding_failure_is_fatal() {
        let result = build_with(sample_chunks(), &FailingEmbedder).await;
        assert!(matches!(result, Err(IndexError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_build_count_mismatch() {
        let result = build_with(sample_chunks(), &ShortEmbedder).await;
        assert!(matches!(
            result,
            Err(IndexError::CountMismatch { expected: 4, actual: 3 })
        ));
    }

    #[tokio::test]
    async fn test_build_dimension_mismatch() {
        let chunks = vec![chunk("a.txt:0", "abc"), chunk("a.txt:1", "abcdef")];
        let result = build_with(chunks, &RaggedEmbedder).await;
        assert!(matches!(
            result,
            Err(IndexError::DimensionMismatch { expected: 3, actual: 6, .. })
        ));
    }

    // ==================== Search Tests ====================

    #[tokio::test]
    async fn test_search_ranks_by_similarity() {
        let embedder = KeywordEmbedder::new();
        let index = build_sample(&embedder).await;

        let hits = index
            .search(&embedder, "What is the capital of France?", 2)
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk_id, "france.txt:0");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_search_ties_keep_insertion_order() {
        let embedder = KeywordEmbedder::new();
        let index = build_sample(&embedder).await;

        // Matches only the constant axis, which every entry shares.
        let hits = index.search_by_vector(&[0.0, 0.0, 0.0, 1.0], 10).unwrap();

        let ids: Vec<&str> = hits.iter().map(|h| h.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["misc.txt:0", "france.txt:0", "invoice.png:0", "weather.md:0"]);
    }

    #[tokio::test]
    async fn test_search_with_non_finite_embedding() {
        let embedder = KeywordEmbedder::new();
        let mut index = build_sample(&embedder).await;
        index.entries[3].embedding = vec![f32::INFINITY, 0.0, 0.0, 0.1];

        let hits = index.search_by_vector(&[1.0, 0.0, 0.0, 0.1], 10).unwrap();

        assert_eq!(hits.len(), 4);
        assert_eq!(hits[0].chunk_id, "france.txt:0");
        assert_eq!(hits[3].chunk_id, "misc.txt:0");
        assert!(hits.iter().all(|h| h.score.is_finite()));
    }

    #[tokio::test]
    async fn test_search_k_larger_than_index() {
        let embedder = KeywordEmbedder::new();
        let index = build_sample(&embedder).await;

        let hits = index.search(&embedder, "invoice", 100).await.unwrap();
        assert_eq!(hits.len(), 4);
        assert_eq!(hits[0].chunk_id, "invoice.png:0");
    }

    #[tokio::test]
    async fn test_search_wrong_dimension() {
        let index = build_sample(&KeywordEmbedder::new()).await;

        let result = index.search_by_vector(&[1.0, 0.0], 3);
        assert!(matches!(
            result,
            Err(QueryError::DimensionMismatch { expected: 4, actual: 2 })
        ));
    }

    #[tokio::test]
    async fn test_stats_counts_kinds() {
        let index = build_sample(&KeywordEmbedder::new()).await;

        let stats = index.stats();
        assert_eq!(stats.chunk_count, 4);
        assert_eq!(stats.image_chunks, 1);
        assert_eq!(stats.text_chunks, 3);
        assert_eq!(stats.model, "keyword");
    }
}
