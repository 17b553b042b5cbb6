//! Retrieval-grounded answer synthesis.

use docrag_core::{Embedder, LanguageModel, QueryError, QueryResult, SearchHit};
use docrag_store::VectorIndex;
use std::sync::Arc;
use tracing::{debug, info};

use crate::prompt::{build_context, plain_prompt, sourced_prompt};

/// Chunks retrieved for a plain answer.
pub const DEFAULT_PLAIN_K: usize = 4;

/// Chunks retrieved for an answer with sources.
pub const DEFAULT_SOURCED_K: usize = 3;

/// Answers questions from an index with a language model.
pub struct AnswerSynthesizer {
    /// Embedder used to build the index
    embedder: Arc<dyn Embedder>,
    /// Model that writes the answer
    llm: Arc<dyn LanguageModel>,
    /// Retrieval depth in plain mode
    plain_k: usize,
    /// Retrieval depth in sourced mode
    sourced_k: usize,
}

impl AnswerSynthesizer {
    pub fn new(embedder: Arc<dyn Embedder>, llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            embedder,
            llm,
            plain_k: DEFAULT_PLAIN_K,
            sourced_k: DEFAULT_SOURCED_K,
        }
    }

    /// Override retrieval depths for both modes.
    #[must_use]
    pub fn with_k(mut self, plain_k: usize, sourced_k: usize) -> Self {
        self.plain_k = plain_k;
        self.sourced_k = sourced_k;
        self
    }

    /// Answer from the top `plain_k` chunks. No sources or context returned.
    pub async fn answer(&self, index: &VectorIndex, question: &str) -> Result<QueryResult, QueryError> {
        let hits = self.retrieve(index, question, self.plain_k).await?;
        let context = build_context(&hits);

        let answer = self.llm.generate(&plain_prompt(&context, question)).await?;
        info!("Answered from {} chunks", hits.len());
        Ok(QueryResult::plain(answer))
    }

    /// Answer from the top `sourced_k` chunks, returning their ids and the
    /// assembled context.
    pub async fn answer_with_sources(
        &self,
        index: &VectorIndex,
        question: &str,
    ) -> Result<QueryResult, QueryError> {
        let hits = self.retrieve(index, question, self.sourced_k).await?;
        let context = build_context(&hits);

        let answer = self.llm.generate(&sourced_prompt(&context, question)).await?;
        info!("Answered from {} chunks with sources", hits.len());
        Ok(QueryResult {
            answer,
            sources: hits.into_iter().map(|hit| hit.chunk_id).collect(),
            context,
        })
    }

    async fn retrieve(
        &self,
        index: &VectorIndex,
        question: &str,
        k: usize,
    ) -> Result<Vec<SearchHit>, QueryError> {
        debug!("Retrieving top {} chunks for: {}", k, question);
        let hits = index.search(self.embedder.as_ref(), question, k).await?;
        for hit in &hits {
            debug!("  {} (score {:.3})", hit.chunk_id, hit.score);
        }
        Ok(hits)
    }
}
