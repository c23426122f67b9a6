//! Groq adapter (passthrough over Groq's OpenAI-compatible endpoint)

use super::passthrough::{self, PassthroughRequest};
use super::{AdapterCredential, ChatAdapter, ProviderError, ProviderId};
use crate::chat::{ChatRequest, ChatResponse};
use async_trait::async_trait;

pub const SUPPORTED_MODELS: &[&str] = &[
    "llama2-70b-4096",
    "mixtral-8x7b-32768",
    "gemma-7b-it",
    "llama3-8b-8192",
    "llama3-70b-8192",
];

#[derive(Debug, Clone)]
pub struct GroqAdapter {
    credential: AdapterCredential,
    http: reqwest::Client,
}

impl GroqAdapter {
    pub fn new(credential: AdapterCredential, http: reqwest::Client) -> Self {
        Self { credential, http }
    }

    /// Groq does not accept the penalty parameters, so they are not forwarded
    pub fn to_provider_format(request: &ChatRequest) -> PassthroughRequest {
        PassthroughRequest {
            model: request.model().to_string(),
            messages: request.messages().to_vec(),
            temperature: request.temperature(),
            max_tokens: request.max_tokens(),
            top_p: request.top_p(),
            frequency_penalty: None,
            presence_penalty: None,
            stream: false,
        }
    }
}

#[async_trait]
impl ChatAdapter for GroqAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Groq
    }

    fn catalog(&self) -> &'static [&'static str] {
        SUPPORTED_MODELS
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let body = Self::to_provider_format(request);
        passthrough::complete(&self.http, &self.credential, &body).await
    }
}
