//! Extractor registry and batch extraction.

use docrag_core::{Document, DocumentKind, ExtractError, Extractor};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tracing::{debug, info, warn};

use crate::scan::SourceFile;

/// Registry of extractors, one per document kind.
pub struct ExtractorRegistry {
    extractors: HashMap<DocumentKind, Arc<dyn Extractor>>,
}

/// A file that contributed no document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionFailure {
    pub source: String,
    pub reason: String,
}

/// Outcome of extracting a whole corpus.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    /// Extracted documents, sorted by source
    pub documents: Vec<Document>,
    /// Files that failed, sorted by source
    pub failures: Vec<ExtractionFailure>,
}

impl ExtractionReport {
    /// Number of documents of one kind.
    #[must_use]
    pub fn count(&self, kind: DocumentKind) -> usize {
        self.documents
            .iter()
            .filter(|d| d.metadata.kind == kind)
            .count()
    }
}

impl ExtractorRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Register an extractor for the kind it reports, replacing any previous one.
    pub fn register<E: Extractor + 'static>(&mut self, extractor: E) {
        self.register_arc(Arc::new(extractor));
    }

    pub fn register_arc(&mut self, extractor: Arc<dyn Extractor>) {
        self.extractors.insert(extractor.kind(), extractor);
    }

    /// Get the extractor for a kind.
    #[must_use]
    pub fn get(&self, kind: DocumentKind) -> Option<Arc<dyn Extractor>> {
        self.extractors.get(&kind).cloned()
    }

    /// Extract every file with at most `max_concurrent` extractions in flight.
    ///
    /// Per-file failures are logged and recorded; they never abort the batch.
    pub async fn extract_all(&self, files: Vec<SourceFile>, max_concurrent: usize) -> ExtractionReport {
        let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
        let mut tasks = JoinSet::new();
        let mut sources: HashMap<task::Id, String> = HashMap::new();
        let mut report = ExtractionReport::default();

        for file in files {
            let Some(extractor) = self.get(file.kind) else {
                warn!("No extractor registered for {} file {}", file.kind, file.source);
                report.failures.push(ExtractionFailure {
                    source: file.source,
                    reason: ExtractError::UnsupportedType(file.kind.to_string()).to_string(),
                });
                continue;
            };

            let semaphore = semaphore.clone();
            let source = file.source.clone();
            let handle = tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                extractor.extract(&file.path, &file.source).await
            });
            sources.insert(handle.id(), source);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, result) = match joined {
                Ok((id, result)) => (id, result),
                Err(e) => {
                    let reason = format!("extraction task failed: {e}");
                    (e.id(), Err(ExtractError::Failed(reason)))
                }
            };
            let source = sources.remove(&id).unwrap_or_default();

            match result {
                Ok(document) => {
                    debug!("Extracted {}", document.source());
                    report.documents.push(document);
                }
                Err(e) => {
                    warn!("Failed to extract {}: {}", source, e);
                    report.failures.push(ExtractionFailure {
                        source,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report.documents.sort_by(|a, b| a.source().cmp(b.source()));
        report.failures.sort_by(|a, b| a.source.cmp(&b.source));

        info!(
            "Extracted {} documents ({} text, {} image), {} failed",
            report.documents.len(),
            report.count(DocumentKind::Text),
            report.count(DocumentKind::Image),
            report.failures.len()
        );
        report
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
