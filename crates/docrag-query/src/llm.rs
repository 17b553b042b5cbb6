//! Language model served by an Ollama-compatible `/api/generate` endpoint.

use async_trait::async_trait;
use docrag_core::{GenerateError, LanguageModel};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default answer model.
pub const DEFAULT_LLM_MODEL: &str = "llama3.2:3b-instruct-q8_0";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Text generation client for one Ollama model.
#[derive(Clone)]
pub struct OllamaGenerator {
    base_url: String,
    model: String,
    client: Client,
}

impl OllamaGenerator {
    /// Create a client for `model` at `base_url` with a per-request timeout.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GenerateError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerateError::Unreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
        })
    }
}

#[async_trait]
impl LanguageModel for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let url = format!("{}/api/generate", self.base_url);
        debug!("Generating with {} ({} prompt chars)", self.model, prompt.len());

        let res = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    GenerateError::Unreachable(e.to_string())
                } else {
                    GenerateError::Model(e.to_string())
                }
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(GenerateError::Model(format!("Ollama generate error ({status}): {text}")));
        }

        let body = res
            .text()
            .await
            .map_err(|e| GenerateError::InvalidResponse(e.to_string()))?;
        parse_generate_response(&body)
    }
}

fn parse_generate_response(body: &str) -> Result<String, GenerateError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| GenerateError::InvalidResponse(e.to_string()))?;

    if let Some(error) = response.error {
        return Err(GenerateError::Model(error));
    }
    response
        .response
        .ok_or_else(|| GenerateError::InvalidResponse("missing response field".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_is_non_streaming() {
        let body = serde_json::to_value(GenerateRequest {
            model: "llama3.2",
            prompt: "Question?",
            stream: false,
        })
        .unwrap();
        assert_eq!(body["stream"], false);
        assert_eq!(body["prompt"], "Question?");
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{"model":"llama3.2","response":"Paris.","done":true}"#;
        assert_eq!(parse_generate_response(body).unwrap(), "Paris.");
    }

    #[test]
    fn test_parse_error() {
        let body = r#"{"error":"model not found"}"#;
        assert!(matches!(
            parse_generate_response(body),
            Err(GenerateError::Model(msg)) if msg == "model not found"
        ));
    }

    #[test]
    fn test_parse_missing_response() {
        assert!(matches!(
            parse_generate_response(r#"{"done":true}"#),
            Err(GenerateError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let llm = OllamaGenerator::new("http://127.0.0.1:9", "m", Duration::from_millis(500)).unwrap();
        assert!(matches!(
            llm.generate("hi").await,
            Err(GenerateError::Unreachable(_))
        ));
    }
}
