//! Embeddings served by an Ollama-compatible `/api/embed` endpoint.

use async_trait::async_trait;
use docrag_core::{EmbedError, Embedder};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "embeddinggemma:300m-bf16";

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
    #[serde(default)]
    error: Option<String>,
}

/// Embedding client for one Ollama model.
#[derive(Clone)]
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    client: Client,
}

impl OllamaEmbedder {
    /// Create a client for `model` at `base_url` with a per-request timeout.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, EmbedError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbedError::Unreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed_text(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let url = format!("{}/api/embed", self.base_url);
        debug!("Embedding {} texts with {}", texts.len(), self.model);

        let res = self
            .client
            .post(&url)
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    EmbedError::Unreachable(e.to_string())
                } else {
                    EmbedError::Inference(e.to_string())
                }
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(EmbedError::Inference(format!("Ollama embed error ({status}): {text}")));
        }

        let body = res
            .text()
            .await
            .map_err(|e| EmbedError::InvalidResponse(e.to_string()))?;
        parse_embed_response(&body, texts.len())
    }
}

fn parse_embed_response(body: &str, expected: usize) -> Result<Vec<Vec<f32>>, EmbedError> {
    let response: EmbedResponse =
        serde_json::from_str(body).map_err(|e| EmbedError::InvalidResponse(e.to_string()))?;

    if let Some(error) = response.error {
        return Err(EmbedError::Inference(error));
    }
    if response.embeddings.len() != expected {
        return Err(EmbedError::InvalidResponse(format!(
            "expected {expected} embeddings, got {}",
            response.embeddings.len()
        )));
    }
    Ok(response.embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let input = ["first", "second"];
        let body = serde_json::to_value(EmbedRequest {
            model: "embeddinggemma",
            input: &input,
        })
        .unwrap();

        assert_eq!(body["model"], "embeddinggemma");
        assert_eq!(body["input"][1], "second");
    }

    #[test]
    fn test_parse_embeddings() {
        let body = r#"{"model":"m","embeddings":[[0.1,0.2],[0.3,0.4]]}"#;
        let vectors = parse_embed_response(body, 2).unwrap();
        assert_eq!(vectors, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[test]
    fn test_parse_count_mismatch() {
        let body = r#"{"embeddings":[[0.1,0.2]]}"#;
        assert!(matches!(
            parse_embed_response(body, 2),
            Err(EmbedError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_error_field() {
        let body = r#"{"error":"model \"x\" not found, try pulling it first"}"#;
        let err = parse_embed_response(body, 1).unwrap_err();
        assert!(matches!(err, EmbedError::Inference(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_parse_malformed_body() {
        assert!(matches!(
            parse_embed_response("<html>", 1),
            Err(EmbedError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let embedder =
            OllamaEmbedder::new("http://127.0.0.1:9", "m", Duration::from_millis(100)).unwrap();
        assert!(embedder.embed_text(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let embedder =
            OllamaEmbedder::new("http://127.0.0.1:9", "m", Duration::from_millis(500)).unwrap();
        let result = embedder.embed_text(&["hello"]).await;
        assert!(matches!(result, Err(EmbedError::Unreachable(_))));
    }
}
