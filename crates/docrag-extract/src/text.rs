//! Text document extractor.

use async_trait::async_trait;
use docrag_core::{Document, DocumentKind, DocumentMetadata, ExtractError, Extractor};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Extractor for plain text, markdown and PDF files.
pub struct TextExtractor;

impl TextExtractor {
    /// Create a new text extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for TextExtractor {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Text
    }

    async fn extract(&self, path: &Path, source: &str) -> Result<Document, ExtractError> {
        debug!("Extracting text: {:?}", path);

        let format = text_format(path);
        let mut metadata = DocumentMetadata::new(source, DocumentKind::Text, format.clone());

        let content = if format == "PDF" {
            let bytes = fs::read(path).await?;
            let pages = tokio::task::spawn_blocking(move || extract_pdf_pages(&bytes))
                .await
                .map_err(|e| ExtractError::Failed(format!("Task join error: {e}")))?
                .map_err(|e| ExtractError::Parse(format!("PDF extraction failed: {e}")))?;

            metadata
                .extra
                .insert("pages".to_string(), pages.len().to_string());
            join_pages(&pages)
        } else {
            fs::read_to_string(path).await?
        };

        Ok(Document::new(content, metadata))
    }
}

/// Upper-cased extension (`TXT`, `MD`, `MARKDOWN`, `PDF`).
fn text_format(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_uppercase()
}

/// Extract the text of each PDF page (blocking).
fn extract_pdf_pages(bytes: &[u8]) -> Result<Vec<String>, String> {
    pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| e.to_string())
}

/// Join trimmed pages with blank lines; pages without text are skipped.
fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|page| page.trim())
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
