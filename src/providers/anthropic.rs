//! Anthropic adapter (transform)
//!
//! The Messages API takes the system prompt as a top-level `system` field and
//! requires `max_tokens`. Only the first system message is honored.

use super::http::{ErrorShape, send_json};
use super::{AdapterCredential, ChatAdapter, ProviderError, ProviderId};
use crate::chat::{ChatRequest, ChatResponse, FinishReason, MessageRole, Usage, completion_id};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const SUPPORTED_MODELS: &[&str] = &[
    "claude-3-5-sonnet-20241022",
    "claude-3-opus-20240229",
    "claude-3-sonnet-20240229",
    "claude-3-haiku-20240307",
    "claude-2.1",
    "claude-2.0",
    "claude-instant-1.2",
];

pub const API_VERSION: &str = "2023-06-01";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnthropicMessage {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnthropicRequest {
    pub model: String,
    pub messages: Vec<AnthropicMessage>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicContentBlock {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnthropicUsage {
    #[serde(default)]
    pub input_tokens: Option<u32>,
    #[serde(default)]
    pub output_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnthropicResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub content: Vec<AnthropicContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: AnthropicUsage,
}

#[derive(Debug, Clone)]
pub struct AnthropicAdapter {
    credential: AdapterCredential,
    http: reqwest::Client,
}

impl AnthropicAdapter {
    pub fn new(credential: AdapterCredential, http: reqwest::Client) -> Self {
        Self { credential, http }
    }

    pub fn to_provider_format(request: &ChatRequest) -> AnthropicRequest {
        let system = request
            .messages()
            .iter()
            .find(|m| m.role() == MessageRole::System)
            .map(|m| m.content().to_string());

        let messages = request
            .messages()
            .iter()
            .filter(|m| m.role() != MessageRole::System)
            .map(|m| AnthropicMessage {
                role: m.role(),
                content: m.content().to_string(),
            })
            .collect();

        AnthropicRequest {
            model: request.model().to_string(),
            messages,
            max_tokens: request.max_tokens().unwrap_or(DEFAULT_MAX_TOKENS),
            system,
            temperature: request.temperature(),
            top_p: request.top_p(),
        }
    }

    pub fn to_canonical_format(response: AnthropicResponse, requested_model: &str) -> ChatResponse {
        let content = response
            .content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .unwrap_or_default();

        // "end_turn" and a missing reason are natural stops; anything else
        // ("max_tokens", "stop_sequence") is treated as truncation
        let finish_reason = match response.stop_reason.as_deref() {
            None | Some("end_turn") => FinishReason::Stop,
            Some(_) => FinishReason::Length,
        };

        ChatResponse::single(
            response.id.unwrap_or_else(|| completion_id("anthropic")),
            requested_model,
            content.trim(),
            finish_reason,
            Usage::new(
                response.usage.input_tokens.unwrap_or(0),
                response.usage.output_tokens.unwrap_or(0),
            ),
        )
    }
}

#[async_trait]
impl ChatAdapter for AnthropicAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    fn catalog(&self) -> &'static [&'static str] {
        SUPPORTED_MODELS
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let body = Self::to_provider_format(request);
        let http_request = self
            .http
            .post(self.credential.url("messages"))
            .header("x-api-key", self.credential.api_key())
            .header("anthropic-version", API_VERSION)
            .json(&body);

        let response: AnthropicResponse =
            send_json(http_request, ErrorShape::NestedMessage).await?;
        Ok(Self::to_canonical_format(response, request.model()))
    }
}
