//! Prompt templates for answer generation.

use docrag_core::SearchHit;

/// Join retrieved chunk contents with blank lines, in retrieval order.
#[must_use]
pub fn build_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| hit.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Prompt for plain answers: restricts the model to the given context.
#[must_use]
pub fn plain_prompt(context: &str, question: &str) -> String {
    format!(
        "Context from documents:\n{context}\n\nQuestion: {question}\n\nAnswer using only the context above:"
    )
}

/// Prompt for answers returned together with their sources.
#[must_use]
pub fn sourced_prompt(context: &str, question: &str) -> String {
    format!("Context:\n{context}\n\nQuestion: {question}\n\nAnswer:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrag_core::{DocumentKind, DocumentMetadata};

    fn hit(chunk_id: &str, content: &str) -> SearchHit {
        SearchHit {
            chunk_id: chunk_id.to_string(),
            content: content.to_string(),
            metadata: DocumentMetadata::new("a.txt", DocumentKind::Text, "TXT"),
            score: 0.5,
        }
    }

    #[test]
    fn test_build_context_joins_with_blank_lines() {
        let hits = vec![hit("a.txt:0", "first"), hit("a.txt:1", "second")];
        assert_eq!(build_context(&hits), "first\n\nsecond");
    }

    #[test]
    fn test_build_context_empty() {
        assert_eq!(build_context(&[]), "");
    }

    #[test]
    fn test_plain_prompt() {
        assert_eq!(
            plain_prompt("Paris is the capital of France.", "What is the capital of France?"),
            "Context from documents:\nParis is the capital of France.\n\n\
             Question: What is the capital of France?\n\n\
             Answer using only the context above:"
        );
    }

    #[test]
    fn test_sourced_prompt() {
        assert_eq!(
            sourced_prompt("INVOICE #123", "Which invoice?"),
            "Context:\nINVOICE #123\n\nQuestion: Which invoice?\n\nAnswer:"
        );
    }
}
