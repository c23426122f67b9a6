//! Shared wire format for OpenAI-compatible providers
//!
//! The provider's request and response bodies already match the canonical
//! model, so translation is a field-for-field copy on the way out and the
//! identity on the way back.

use super::http::{ErrorShape, send_json};
use super::{AdapterCredential, ProviderError};
use crate::chat::{ChatMessage, ChatResponse};
use serde::Serialize;

/// OpenAI-compatible chat completion request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassthroughRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    /// Always false: responses are read as a single JSON document
    pub stream: bool,
}

/// The provider response already satisfies the canonical shape
pub fn to_canonical_format(response: ChatResponse) -> ChatResponse {
    response
}

/// POST `{base_url}/chat/completions` with bearer auth
pub(crate) async fn complete(
    http: &reqwest::Client,
    credential: &AdapterCredential,
    body: &PassthroughRequest,
) -> Result<ChatResponse, ProviderError> {
    let request = http
        .post(credential.url("chat/completions"))
        .bearer_auth(credential.api_key())
        .json(body);

    let response: ChatResponse = send_json(request, ErrorShape::NestedMessage).await?;
    Ok(to_canonical_format(response))
}
