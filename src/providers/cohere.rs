//! Cohere adapter (transform)
//!
//! Cohere's chat API is single-turn: the latest message is sent as `message`
//! and everything before it as `chat_history` with Cohere's own role tags.
//! The first system message becomes the `preamble`; further system messages
//! are dropped.

use super::http::{ErrorShape, send_json};
use super::{AdapterCredential, ChatAdapter, ProviderError, ProviderId};
use crate::chat::{ChatRequest, ChatResponse, FinishReason, MessageRole, Usage, completion_id};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const SUPPORTED_MODELS: &[&str] = &[
    "command",
    "command-nightly",
    "command-light",
    "command-light-nightly",
];

/// Role tags used in Cohere's chat history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CohereRole {
    User,
    Chatbot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohereHistoryEntry {
    pub role: CohereRole,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohereChatRequest {
    pub model: String,
    pub message: String,
    pub chat_history: Vec<CohereHistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preamble: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CohereChatResponse {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub generation_id: Option<String>,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub meta: Option<CohereMeta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CohereMeta {
    #[serde(default)]
    pub billed_units: Option<CohereBilledUnits>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CohereBilledUnits {
    #[serde(default)]
    pub input_tokens: Option<u32>,
    #[serde(default)]
    pub output_tokens: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct CohereAdapter {
    credential: AdapterCredential,
    http: reqwest::Client,
}

impl CohereAdapter {
    pub fn new(credential: AdapterCredential, http: reqwest::Client) -> Self {
        Self { credential, http }
    }

    /// Split the conversation into `message` + `chat_history`
    ///
    /// # Errors
    /// Fails when the request holds only system messages, since Cohere needs
    /// a conversational turn to answer.
    pub fn to_provider_format(request: &ChatRequest) -> Result<CohereChatRequest, ProviderError> {
        let preamble = request
            .messages()
            .iter()
            .find(|m| m.role() == MessageRole::System)
            .map(|m| m.content().to_string());

        let mut turns: Vec<_> = request
            .messages()
            .iter()
            .filter(|m| m.role() != MessageRole::System)
            .collect();

        let last = turns.pop().ok_or_else(|| {
            ProviderError::InvalidRequest(
                "Cohere requires at least one user or assistant message".to_string(),
            )
        })?;

        let chat_history = turns
            .into_iter()
            .map(|m| CohereHistoryEntry {
                role: match m.role() {
                    MessageRole::Assistant => CohereRole::Chatbot,
                    _ => CohereRole::User,
                },
                message: m.content().to_string(),
            })
            .collect();

        Ok(CohereChatRequest {
            model: request.model().to_string(),
            message: last.content().to_string(),
            chat_history,
            preamble,
            temperature: request.temperature(),
            max_tokens: request.max_tokens(),
            p: request.top_p(),
        })
    }

    pub fn to_canonical_format(response: CohereChatResponse, model: &str) -> ChatResponse {
        let billed = response
            .meta
            .and_then(|m| m.billed_units)
            .unwrap_or_default();
        let finish_reason = match response.finish_reason.as_deref() {
            Some("MAX_TOKENS") => FinishReason::Length,
            _ => FinishReason::Stop,
        };

        ChatResponse::single(
            response
                .generation_id
                .unwrap_or_else(|| completion_id("cohere")),
            model,
            response.text.unwrap_or_default().trim(),
            finish_reason,
            Usage::new(
                billed.input_tokens.unwrap_or(0),
                billed.output_tokens.unwrap_or(0),
            ),
        )
    }
}

#[async_trait]
impl ChatAdapter for CohereAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Cohere
    }

    fn catalog(&self) -> &'static [&'static str] {
        SUPPORTED_MODELS
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let body = Self::to_provider_format(request)?;
        let http_request = self
            .http
            .post(self.credential.url("chat"))
            .bearer_auth(self.credential.api_key())
            .json(&body);

        let response: CohereChatResponse = send_json(http_request, ErrorShape::Message).await?;
        Ok(Self::to_canonical_format(response, request.model()))
    }
}
