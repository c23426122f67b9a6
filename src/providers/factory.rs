//! Adapter factory
//!
//! Maps a [`ProviderId`] plus its resolved credential onto a concrete
//! [`Adapter`]. The match is exhaustive: a new provider must be wired here
//! before the crate compiles.

use super::poll::PollPolicy;
use super::{
    Adapter, AdapterCredential, AnthropicAdapter, CohereAdapter, GroqAdapter, HuggingFaceAdapter,
    OllamaAdapter, OpenAiAdapter, ProviderId, ReplicateAdapter, TogetherAdapter,
};
use crate::error::{AppError, AppResult};
use prometheus::Histogram;

/// Builds adapters that share one HTTP connection pool
#[derive(Clone)]
pub struct AdapterFactory {
    http: reqwest::Client,
    poll_policy: PollPolicy,
    poll_histogram: Option<Histogram>,
}

impl std::fmt::Debug for AdapterFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterFactory")
            .field("poll_policy", &self.poll_policy)
            .finish_non_exhaustive()
    }
}

impl AdapterFactory {
    pub fn new(http: reqwest::Client, poll_policy: PollPolicy) -> Self {
        Self {
            http,
            poll_policy,
            poll_histogram: None,
        }
    }

    /// Attach the histogram polling adapters report attempt counts to
    pub fn with_poll_histogram(mut self, histogram: Histogram) -> Self {
        self.poll_histogram = Some(histogram);
        self
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.poll_policy
    }

    /// Build the adapter for `provider`
    ///
    /// # Errors
    /// [`AppError::UnsupportedProvider`] for providers that are recognized
    /// but have no adapter.
    pub fn create(&self, provider: ProviderId, credential: AdapterCredential) -> AppResult<Adapter> {
        let http = self.http.clone();
        let adapter = match provider {
            ProviderId::OpenAi => Adapter::OpenAi(OpenAiAdapter::new(credential, http)),
            ProviderId::Cohere => Adapter::Cohere(CohereAdapter::new(credential, http)),
            ProviderId::Groq => Adapter::Groq(GroqAdapter::new(credential, http)),
            ProviderId::HuggingFace => {
                Adapter::HuggingFace(HuggingFaceAdapter::new(credential, http))
            }
            ProviderId::Ollama => Adapter::Ollama(OllamaAdapter::new(credential, http)),
            ProviderId::Anthropic => Adapter::Anthropic(AnthropicAdapter::new(credential, http)),
            ProviderId::Replicate => {
                let adapter = ReplicateAdapter::new(credential, http, self.poll_policy);
                Adapter::Replicate(match &self.poll_histogram {
                    Some(histogram) => adapter.with_poll_histogram(histogram.clone()),
                    None => adapter,
                })
            }
            ProviderId::Together => Adapter::Together(TogetherAdapter::new(credential, http)),
            ProviderId::Corcel => return Err(AppError::UnsupportedProvider { provider }),
        };
        Ok(adapter)
    }

    /// Parse a selector string, then [`create`](Self::create)
    ///
    /// # Errors
    /// [`AppError::UnknownProvider`] when `name` is not a recognized provider.
    pub fn create_by_name(&self, name: &str, credential: AdapterCredential) -> AppResult<Adapter> {
        let provider = name
            .parse::<ProviderId>()
            .map_err(|_| AppError::UnknownProvider(name.to_string()))?;
        self.create(provider, credential)
    }

    /// Providers that have an adapter, in declaration order
    pub fn dispatchable_providers() -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|p| Self::is_dispatchable(*p))
            .collect()
    }

    pub fn is_dispatchable(provider: ProviderId) -> bool {
        !matches!(provider, ProviderId::Corcel)
    }
}
