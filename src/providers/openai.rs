//! OpenAI adapter (passthrough)

use super::passthrough::{self, PassthroughRequest};
use super::{AdapterCredential, ChatAdapter, ProviderError, ProviderId};
use crate::chat::{ChatRequest, ChatResponse};
use async_trait::async_trait;

pub const SUPPORTED_MODELS: &[&str] = &[
    "gpt-4",
    "gpt-4-turbo",
    "gpt-3.5-turbo",
    "gpt-4o",
    "gpt-4o-mini",
];

#[derive(Debug, Clone)]
pub struct OpenAiAdapter {
    credential: AdapterCredential,
    http: reqwest::Client,
}

impl OpenAiAdapter {
    pub fn new(credential: AdapterCredential, http: reqwest::Client) -> Self {
        Self { credential, http }
    }

    /// Every canonical field maps 1:1
    pub fn to_provider_format(request: &ChatRequest) -> PassthroughRequest {
        PassthroughRequest {
            model: request.model().to_string(),
            messages: request.messages().to_vec(),
            temperature: request.temperature(),
            max_tokens: request.max_tokens(),
            top_p: request.top_p(),
            frequency_penalty: request.frequency_penalty(),
            presence_penalty: request.presence_penalty(),
            stream: false,
        }
    }
}

#[async_trait]
impl ChatAdapter for OpenAiAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn catalog(&self) -> &'static [&'static str] {
        SUPPORTED_MODELS
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let body = Self::to_provider_format(request);
        passthrough::complete(&self.http, &self.credential, &body).await
    }
}
