//! HuggingFace Inference API adapter (transform)
//!
//! Text-generation endpoints take a single prompt, so the conversation is
//! flattened into a `Human:` / `Assistant:` transcript.

use super::http::{ErrorShape, send_json};
use super::{AdapterCredential, ChatAdapter, ProviderError, ProviderId};
use crate::chat::{ChatRequest, ChatResponse, FinishReason, MessageRole, Usage, completion_id};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const SUPPORTED_MODELS: &[&str] = &[
    "microsoft/DialoGPT-medium",
    "microsoft/DialoGPT-large",
    "facebook/blenderbot-400M-distill",
    "facebook/blenderbot-1B-distill",
    "google/flan-t5-base",
    "google/flan-t5-large",
    "mistralai/Mistral-7B-Instruct-v0.1",
    "meta-llama/Llama-2-7b-chat-hf",
    "HuggingFaceH4/zephyr-7b-beta",
];

const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_NEW_TOKENS: u32 = 150;
const DEFAULT_TOP_P: f64 = 0.9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HuggingFaceParameters {
    pub temperature: f64,
    pub max_new_tokens: u32,
    pub top_p: f64,
    pub return_full_text: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HuggingFaceRequest {
    pub inputs: String,
    pub parameters: HuggingFaceParameters,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HuggingFaceGeneration {
    #[serde(default)]
    pub generated_text: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl HuggingFaceGeneration {
    fn into_text(self) -> String {
        self.generated_text.or(self.text).unwrap_or_default()
    }
}

/// The endpoint answers with a list, a bare object or a plain string
/// depending on the model's pipeline
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HuggingFaceResponse {
    Batch(Vec<HuggingFaceGeneration>),
    Single(HuggingFaceGeneration),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct HuggingFaceAdapter {
    credential: AdapterCredential,
    http: reqwest::Client,
}

impl HuggingFaceAdapter {
    pub fn new(credential: AdapterCredential, http: reqwest::Client) -> Self {
        Self { credential, http }
    }

    /// Render the conversation as a single prompt ending in an open
    /// `Assistant:` turn
    pub fn transcript(request: &ChatRequest) -> String {
        let mut prompt = request
            .messages()
            .iter()
            .map(|m| {
                let speaker = match m.role() {
                    MessageRole::User => "Human",
                    _ => "Assistant",
                };
                format!("{}: {}", speaker, m.content())
            })
            .collect::<Vec<_>>()
            .join("\n");
        prompt.push_str("\nAssistant:");
        prompt
    }

    pub fn to_provider_format(request: &ChatRequest) -> HuggingFaceRequest {
        HuggingFaceRequest {
            inputs: Self::transcript(request),
            parameters: HuggingFaceParameters {
                temperature: request.temperature().unwrap_or(DEFAULT_TEMPERATURE),
                max_new_tokens: request.max_tokens().unwrap_or(DEFAULT_MAX_NEW_TOKENS),
                top_p: request.top_p().unwrap_or(DEFAULT_TOP_P),
                return_full_text: false,
            },
        }
    }

    pub fn to_canonical_format(response: HuggingFaceResponse, model: &str) -> ChatResponse {
        let content = match response {
            HuggingFaceResponse::Batch(generations) => generations
                .into_iter()
                .next()
                .map(HuggingFaceGeneration::into_text)
                .unwrap_or_default(),
            HuggingFaceResponse::Single(generation) => generation.into_text(),
            HuggingFaceResponse::Text(text) => text,
        };

        ChatResponse::single(
            completion_id("hf"),
            model,
            content.trim(),
            FinishReason::Stop,
            Usage::unreported(),
        )
    }
}

#[async_trait]
impl ChatAdapter for HuggingFaceAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::HuggingFace
    }

    fn catalog(&self) -> &'static [&'static str] {
        SUPPORTED_MODELS
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let body = Self::to_provider_format(request);
        let http_request = self
            .http
            .post(self.credential.url(request.model()))
            .bearer_auth(self.credential.api_key())
            .json(&body);

        let response: HuggingFaceResponse = send_json(http_request, ErrorShape::Error).await?;
        Ok(Self::to_canonical_format(response, request.model()))
    }
}
