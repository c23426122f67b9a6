//! Together AI adapter (passthrough with provider defaults)

use super::passthrough::{self, PassthroughRequest};
use super::{AdapterCredential, ChatAdapter, ProviderError, ProviderId};
use crate::chat::{ChatRequest, ChatResponse};
use async_trait::async_trait;

pub const SUPPORTED_MODELS: &[&str] = &[
    "togethercomputer/RedPajama-INCITE-Chat-3B-v1",
    "togethercomputer/RedPajama-INCITE-7B-Chat",
    "togethercomputer/falcon-7b-instruct",
    "togethercomputer/falcon-40b-instruct",
    "meta-llama/Llama-2-7b-chat-hf",
    "meta-llama/Llama-2-13b-chat-hf",
    "meta-llama/Llama-2-70b-chat-hf",
    "mistralai/Mistral-7B-Instruct-v0.1",
    "mistralai/Mixtral-8x7B-Instruct-v0.1",
    "NousResearch/Nous-Hermes-2-Mixtral-8x7B-DPO",
    "openchat/openchat-3.5-1210",
    "teknium/OpenHermes-2.5-Mistral-7B",
];

const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 512;
const DEFAULT_TOP_P: f64 = 0.7;

#[derive(Debug, Clone)]
pub struct TogetherAdapter {
    credential: AdapterCredential,
    http: reqwest::Client,
}

impl TogetherAdapter {
    pub fn new(credential: AdapterCredential, http: reqwest::Client) -> Self {
        Self { credential, http }
    }

    /// Unset sampling fields are filled with Together's recommended defaults
    pub fn to_provider_format(request: &ChatRequest) -> PassthroughRequest {
        PassthroughRequest {
            model: request.model().to_string(),
            messages: request.messages().to_vec(),
            temperature: Some(request.temperature().unwrap_or(DEFAULT_TEMPERATURE)),
            max_tokens: Some(request.max_tokens().unwrap_or(DEFAULT_MAX_TOKENS)),
            top_p: Some(request.top_p().unwrap_or(DEFAULT_TOP_P)),
            frequency_penalty: Some(request.frequency_penalty().unwrap_or(0.0)),
            presence_penalty: Some(request.presence_penalty().unwrap_or(0.0)),
            stream: false,
        }
    }
}

#[async_trait]
impl ChatAdapter for TogetherAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Together
    }

    fn catalog(&self) -> &'static [&'static str] {
        SUPPORTED_MODELS
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let body = Self::to_provider_format(request);
        passthrough::complete(&self.http, &self.credential, &body).await
    }
}
