//! Provider adapters
//!
//! Each adapter translates the canonical [`ChatRequest`] into one provider's
//! wire format, performs the call, and translates the reply back into a
//! [`ChatResponse`]. Adapters come in three shapes:
//!
//! - passthrough (`openai`, `groq`, `together`): wire format already canonical
//! - transform (`cohere`, `anthropic`, `huggingface`, `ollama`): fields restructured
//! - polling (`replicate`): submit a job, then poll it to a terminal status
//!
//! [`Adapter`] is the closed set of dispatchable adapters; [`AdapterFactory`]
//! maps a [`ProviderId`] onto it.

pub mod anthropic;
pub mod cohere;
pub mod factory;
pub mod groq;
pub(crate) mod http;
pub mod huggingface;
pub mod ollama;
pub mod openai;
pub mod passthrough;
pub mod poll;
pub mod replicate;
pub mod together;

pub use anthropic::AnthropicAdapter;
pub use cohere::CohereAdapter;
pub use factory::AdapterFactory;
pub use groq::GroqAdapter;
pub use huggingface::HuggingFaceAdapter;
pub use ollama::OllamaAdapter;
pub use openai::OpenAiAdapter;
pub use poll::{PollError, PollPolicy, PollStep, Polled, poll_until};
pub use replicate::ReplicateAdapter;
pub use together::TogetherAdapter;

use crate::chat::{ChatRequest, ChatResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Provider identifier
///
/// Closed enumeration of every provider the gateway recognizes. `Corcel` is
/// recognized but has no adapter; the factory reports it as unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAi,
    Cohere,
    Groq,
    Corcel,
    HuggingFace,
    Ollama,
    Anthropic,
    Replicate,
    Together,
}

impl ProviderId {
    /// Every recognized provider, in declaration order
    pub const ALL: [ProviderId; 9] = [
        ProviderId::OpenAi,
        ProviderId::Cohere,
        ProviderId::Groq,
        ProviderId::Corcel,
        ProviderId::HuggingFace,
        ProviderId::Ollama,
        ProviderId::Anthropic,
        ProviderId::Replicate,
        ProviderId::Together,
    ];

    /// Selector string used in URLs and config sections
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Cohere => "cohere",
            Self::Groq => "groq",
            Self::Corcel => "corcel",
            Self::HuggingFace => "huggingface",
            Self::Ollama => "ollama",
            Self::Anthropic => "anthropic",
            Self::Replicate => "replicate",
            Self::Together => "together",
        }
    }

    /// Human-readable name used in error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Cohere => "Cohere",
            Self::Groq => "Groq",
            Self::Corcel => "Corcel",
            Self::HuggingFace => "HuggingFace",
            Self::Ollama => "Ollama",
            Self::Anthropic => "Anthropic",
            Self::Replicate => "Replicate",
            Self::Together => "Together",
        }
    }

    /// Environment variable holding this provider's API key
    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Cohere => "COHERE_API_KEY",
            Self::Groq => "GROQ_API_KEY",
            Self::Corcel => "CORCEL_API_KEY",
            Self::HuggingFace => "HUGGINGFACE_API_KEY",
            Self::Ollama => "OLLAMA_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::Replicate => "REPLICATE_API_KEY",
            Self::Together => "TOGETHER_API_KEY",
        }
    }

    /// Base URL used when config does not override it
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Cohere => "https://api.cohere.ai/v1",
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::Corcel => "https://api.corcel.io/v1",
            Self::HuggingFace => "https://api-inference.huggingface.co/models",
            Self::Ollama => "http://localhost:11434",
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::Replicate => "https://api.replicate.com/v1",
            Self::Together => "https://api.together.xyz/v1",
        }
    }

    /// Self-hosted providers run without an API key
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a selector names no known provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown provider '{0}'")]
pub struct UnknownProviderName(pub String);

impl FromStr for ProviderId {
    type Err = UnknownProviderName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderId::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownProviderName(s.to_string()))
    }
}

/// Resolved credential for one provider
///
/// Immutable once built. The API key may be empty for self-hosted providers.
#[derive(Clone, PartialEq, Eq)]
pub struct AdapterCredential {
    api_key: String,
    base_url: String,
}

impl AdapterCredential {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join a path onto the base URL without doubling slashes
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl fmt::Debug for AdapterCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterCredential")
            .field("api_key", &if self.api_key.is_empty() { "<empty>" } else { "<redacted>" })
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Failure raised by a provider adapter
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Network or protocol failure before a response was received
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    /// Provider answered with a body we could not interpret
    #[error("invalid response: {0}")]
    Decode(String),

    /// Request could not be expressed in the provider's wire format
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Asynchronous job reached the failed terminal state
    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    /// Asynchronous job never reached a terminal state within the attempt budget
    #[error("Prediction timed out: exceeded wait budget of {attempts} status checks")]
    PredictionTimedOut { attempts: u32 },
}

impl ProviderError {
    /// Short label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Api { .. } => "api",
            Self::Decode(_) => "decode",
            Self::InvalidRequest(_) => "invalid_request",
            Self::PredictionFailed(_) => "prediction_failed",
            Self::PredictionTimedOut { .. } => "prediction_timeout",
        }
    }
}

/// Capability contract every provider adapter implements
#[async_trait]
pub trait ChatAdapter: Send + Sync {
    /// Provider this adapter talks to
    fn provider(&self) -> ProviderId;

    /// Compiled-in model catalog
    fn catalog(&self) -> &'static [&'static str];

    /// Run one chat completion against the provider
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError>;

    /// True iff `model` is in the adapter's catalog
    fn validate_model(&self, model: &str) -> bool {
        self.catalog().contains(&model)
    }

    /// Owned copy of the catalog
    fn supported_models(&self) -> Vec<String> {
        self.catalog().iter().map(|m| m.to_string()).collect()
    }
}

/// Every dispatchable adapter
///
/// Adding a [`ProviderId`] without wiring it here fails to compile in
/// [`AdapterFactory::create`].
#[derive(Debug)]
pub enum Adapter {
    OpenAi(OpenAiAdapter),
    Cohere(CohereAdapter),
    Groq(GroqAdapter),
    HuggingFace(HuggingFaceAdapter),
    Ollama(OllamaAdapter),
    Anthropic(AnthropicAdapter),
    Replicate(ReplicateAdapter),
    Together(TogetherAdapter),
}

impl Adapter {
    fn inner(&self) -> &dyn ChatAdapter {
        match self {
            Self::OpenAi(a) => a,
            Self::Cohere(a) => a,
            Self::Groq(a) => a,
            Self::HuggingFace(a) => a,
            Self::Ollama(a) => a,
            Self::Anthropic(a) => a,
            Self::Replicate(a) => a,
            Self::Together(a) => a,
        }
    }
}

#[async_trait]
impl ChatAdapter for Adapter {
    fn provider(&self) -> ProviderId {
        self.inner().provider()
    }

    fn catalog(&self) -> &'static [&'static str] {
        self.inner().catalog()
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        self.inner().chat(request).await
    }
}
