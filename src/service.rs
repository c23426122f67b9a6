//! Gateway orchestration
//!
//! Resolves the credential for the selected provider, builds a fresh
//! adapter, checks the model against the adapter's catalog, and runs the
//! completion under the per-request timeout.

use crate::chat::{ChatRequest, ChatResponse};
use crate::credentials::CredentialStore;
use crate::error::{AppError, AppResult};
use crate::metrics::{Metrics, Outcome};
use crate::providers::{AdapterFactory, ChatAdapter, ProviderId};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct GatewayService {
    credentials: Arc<CredentialStore>,
    factory: AdapterFactory,
    request_timeout: Duration,
    metrics: Option<Arc<Metrics>>,
}

impl GatewayService {
    pub fn new(
        credentials: Arc<CredentialStore>,
        factory: AdapterFactory,
        request_timeout: Duration,
    ) -> Self {
        Self {
            credentials,
            factory,
            request_timeout,
            metrics: None,
        }
    }

    /// Record request, latency and token metrics into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.factory = self.factory.with_poll_histogram(metrics.poll_attempts());
        self.metrics = Some(metrics);
        self
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Run one chat completion against `provider`
    ///
    /// # Errors
    ///
    /// - [`AppError::CredentialMissing`] when no key is configured
    /// - [`AppError::UnsupportedProvider`] for recognized providers without an adapter
    /// - [`AppError::ModelNotSupported`] when the model is outside the catalog
    /// - [`AppError::Provider`] when the provider call fails
    /// - [`AppError::RequestTimeout`] when the whole exchange outlives the timeout
    pub async fn chat(&self, provider: ProviderId, request: &ChatRequest) -> AppResult<ChatResponse> {
        tracing::info!(
            provider = %provider,
            model = %request.model(),
            message_count = request.messages().len(),
            "Chat request received"
        );

        let started = Instant::now();
        // Dropping the dispatch future on timeout also stops any status polling
        let result = match tokio::time::timeout(self.request_timeout, self.dispatch(provider, request))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(AppError::RequestTimeout {
                provider,
                timeout_seconds: self.request_timeout.as_secs(),
            }),
        };
        let elapsed = started.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    provider = %provider,
                    model = %request.model(),
                    duration_ms = elapsed.as_millis() as u64,
                    total_tokens = response.usage.total_tokens(),
                    "Chat request completed"
                );
                self.record(provider, Outcome::Success, elapsed);
                if let Some(metrics) = &self.metrics
                    && let Err(e) = metrics.record_tokens(provider, &response.usage)
                {
                    tracing::warn!(error = %e, "Failed to record token metrics");
                }
            }
            Err(e) => {
                tracing::error!(
                    provider = %provider,
                    model = %request.model(),
                    duration_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "Chat request failed"
                );
                self.record(provider, e.outcome(), elapsed);
            }
        }

        result
    }

    /// Resolve a selector string, then [`chat`](Self::chat)
    ///
    /// # Errors
    ///
    /// [`AppError::UnknownProvider`] when `name` is not a recognized provider,
    /// otherwise as for [`chat`](Self::chat).
    pub async fn chat_by_name(&self, name: &str, request: &ChatRequest) -> AppResult<ChatResponse> {
        let provider = name
            .parse::<ProviderId>()
            .map_err(|_| AppError::UnknownProvider(name.to_string()))?;
        self.chat(provider, request).await
    }

    async fn dispatch(&self, provider: ProviderId, request: &ChatRequest) -> AppResult<ChatResponse> {
        // No key can make an adapter-less provider servable
        if !AdapterFactory::is_dispatchable(provider) {
            return Err(AppError::UnsupportedProvider { provider });
        }

        let credential = self
            .credentials
            .get(provider)
            .cloned()
            .ok_or_else(|| AppError::CredentialMissing {
                provider,
                env_var: self.credentials.env_var(provider).to_string(),
            })?;

        let adapter = self.factory.create(provider, credential)?;

        if !adapter.validate_model(request.model()) {
            return Err(AppError::ModelNotSupported {
                provider,
                model: request.model().to_string(),
                supported: adapter.supported_models(),
            });
        }

        adapter
            .chat(request)
            .await
            .map_err(|source| AppError::Provider { provider, source })
    }

    /// Providers that can serve requests, in declaration order
    pub fn providers(&self) -> Vec<ProviderId> {
        AdapterFactory::dispatchable_providers()
    }

    /// Model catalog for `provider`
    ///
    /// Empty when the provider has no credential or no adapter.
    pub fn models(&self, provider: ProviderId) -> Vec<String> {
        let Some(credential) = self.credentials.get(provider) else {
            return Vec::new();
        };
        match self.factory.create(provider, credential.clone()) {
            Ok(adapter) => adapter.supported_models(),
            Err(_) => Vec::new(),
        }
    }

    fn record(&self, provider: ProviderId, outcome: Outcome, elapsed: Duration) {
        if let Some(metrics) = &self.metrics
            && let Err(e) = metrics.record_request(provider, outcome, elapsed.as_secs_f64())
        {
            tracing::warn!(
                provider = %provider,
                outcome = outcome.as_str(),
                error = %e,
                "Failed to record request metrics"
            );
        }
    }
}
