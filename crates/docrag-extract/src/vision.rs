//! Vision model access for image extraction.
//!
//! [`VisionModel`] answers one instruction about one image. [`OllamaVision`]
//! implements it over an Ollama-compatible `/api/chat` endpoint, sending the
//! image base64-encoded alongside the instruction.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use docrag_core::GenerateError;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Default vision model.
pub const DEFAULT_VISION_MODEL: &str = "qwen3-vl:2b-instruct-q4_K_M";

/// Vision-capable language model.
#[async_trait]
pub trait VisionModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Answer `instruction` about the encoded image in `image`.
    async fn describe(&self, image: &[u8], instruction: &str) -> Result<String, GenerateError>;
}

/// Vision model served by Ollama.
#[derive(Clone)]
pub struct OllamaVision {
    base_url: String,
    model: String,
    client: Client,
}

impl OllamaVision {
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
impl VisionModel for OllamaVision {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn describe(&self, image: &[u8], instruction: &str) -> Result<String, GenerateError> {
        let url = format!("{}/api/chat", self.base_url);
        debug!("Vision request to {} ({} image bytes)", url, image.len());

        let res = self
            .client
            .post(&url)
            .json(&chat_request(&self.model, instruction, image))
            .send()
            .await
            .map_err(request_error)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(GenerateError::Model(format!("Ollama chat error ({status}): {text}")));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| GenerateError::InvalidResponse(e.to_string()))?;
        parse_chat_response(&payload)
    }
}

/// Build a non-streaming chat request carrying one image.
fn chat_request(model: &str, instruction: &str, image: &[u8]) -> Value {
    json!({
        "model": model,
        "messages": [{
            "role": "user",
            "content": instruction,
            "images": [STANDARD.encode(image)],
        }],
        "stream": false,
    })
}

fn parse_chat_response(payload: &Value) -> Result<String, GenerateError> {
    if let Some(error) = payload["error"].as_str() {
        return Err(GenerateError::Model(error.to_string()));
    }
    payload["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| GenerateError::InvalidResponse("missing message.content".to_string()))
}

fn request_error(e: reqwest::Error) -> GenerateError {
    if e.is_connect() || e.is_timeout() {
        GenerateError::Unreachable(e.to_string())
    } else {
        GenerateError::Model(e.to_string())
    }
}
