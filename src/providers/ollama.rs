//! Ollama adapter (transform)
//!
//! Local inference server; no authentication. Sampling parameters travel in
//! a nested `options` block.

use super::http::{ErrorShape, send_json};
use super::{AdapterCredential, ChatAdapter, ProviderError, ProviderId};
use crate::chat::{ChatMessage, ChatRequest, ChatResponse, FinishReason, Usage, completion_id};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const SUPPORTED_MODELS: &[&str] = &[
    "llama2",
    "llama2:7b",
    "llama2:13b",
    "codellama",
    "codellama:7b",
    "codellama:13b",
    "mistral",
    "mistral:7b",
    "neural-chat",
    "starling-lm",
    "dolphin-mixtral",
    "phi",
    "gemma:2b",
    "gemma:7b",
];

const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_TOP_P: f64 = 0.9;
/// Ollama's "generate until the model stops"
const UNLIMITED_PREDICT: i64 = -1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OllamaOptions {
    pub temperature: f64,
    pub num_predict: i64,
    pub top_p: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OllamaRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub options: OllamaOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OllamaMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OllamaResponse {
    #[serde(default)]
    pub message: Option<OllamaMessage>,
    #[serde(default)]
    pub done: Option<bool>,
    #[serde(default)]
    pub prompt_eval_count: Option<u32>,
    #[serde(default)]
    pub eval_count: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct OllamaAdapter {
    credential: AdapterCredential,
    http: reqwest::Client,
}

impl OllamaAdapter {
    pub fn new(credential: AdapterCredential, http: reqwest::Client) -> Self {
        Self { credential, http }
    }

    pub fn to_provider_format(request: &ChatRequest) -> OllamaRequest {
        OllamaRequest {
            model: request.model().to_string(),
            messages: request.messages().to_vec(),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature().unwrap_or(DEFAULT_TEMPERATURE),
                num_predict: request
                    .max_tokens()
                    .map(i64::from)
                    .unwrap_or(UNLIMITED_PREDICT),
                top_p: request.top_p().unwrap_or(DEFAULT_TOP_P),
            },
        }
    }

    pub fn to_canonical_format(response: OllamaResponse, model: &str) -> ChatResponse {
        let finish_reason = match response.done {
            Some(false) => FinishReason::Length,
            _ => FinishReason::Stop,
        };

        ChatResponse::single(
            completion_id("ollama"),
            model,
            response
                .message
                .and_then(|m| m.content)
                .unwrap_or_default()
                .trim(),
            finish_reason,
            Usage::new(
                response.prompt_eval_count.unwrap_or(0),
                response.eval_count.unwrap_or(0),
            ),
        )
    }
}

#[async_trait]
impl ChatAdapter for OllamaAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Ollama
    }

    fn catalog(&self) -> &'static [&'static str] {
        SUPPORTED_MODELS
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let body = Self::to_provider_format(request);
        let http_request = self.http.post(self.credential.url("api/chat")).json(&body);

        let response: OllamaResponse = send_json(http_request, ErrorShape::Error).await?;
        Ok(Self::to_canonical_format(response, request.model()))
    }
}
