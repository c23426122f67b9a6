//! Prometheus metrics collection for llm-proxy
//!
//! Tracks request outcomes and latency per provider, token usage, and the
//! number of status checks asynchronous providers needed. Exposed on
//! `/metrics` in Prometheus text format.

use crate::chat::Usage;
use crate::providers::ProviderId;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Request outcome label
///
/// Closed set so label cardinality stays bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Provider returned a completion
    Success,
    /// Gateway refused the request before calling the provider
    Rejected,
    /// Provider call failed or timed out
    UpstreamError,
    /// Configuration or internal failure
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Rejected => "rejected",
            Outcome::UpstreamError => "upstream_error",
            Outcome::Error => "error",
        }
    }
}

/// Metrics collector
///
/// Cheap to clone; clones share one registry.
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
    poll_attempts: Histogram,
    tokens_total: IntCounterVec,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 9 providers x 4 outcomes
        let requests_total = IntCounterVec::new(
            Opts::new(
                "llm_proxy_requests_total",
                "Total chat requests by provider and outcome",
            ),
            &["provider", "outcome"],
        )?;

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "llm_proxy_request_duration_seconds",
                "End-to-end chat request latency in seconds",
            )
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
            &["provider"],
        )?;

        let poll_attempts = Histogram::with_opts(
            HistogramOpts::new(
                "llm_proxy_poll_attempts",
                "Status checks performed per asynchronous prediction",
            )
            .buckets(vec![1.0, 2.0, 3.0, 5.0, 10.0, 20.0, 30.0, 60.0]),
        )?;

        // kind is "prompt" or "completion"
        let tokens_total = IntCounterVec::new(
            Opts::new(
                "llm_proxy_tokens_total",
                "Tokens reported by providers, by provider and kind",
            ),
            &["provider", "kind"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;
        registry.register(Box::new(poll_attempts.clone()))?;
        registry.register(Box::new(tokens_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            request_duration,
            poll_attempts,
            tokens_total,
        })
    }

    /// Record one finished chat request
    ///
    /// # Errors
    ///
    /// Returns an error if `duration_seconds` is NaN, infinite, or negative.
    /// Such values would corrupt the histogram's percentiles.
    pub fn record_request(
        &self,
        provider: ProviderId,
        outcome: Outcome,
        duration_seconds: f64,
    ) -> Result<(), prometheus::Error> {
        if !duration_seconds.is_finite() || duration_seconds < 0.0 {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be finite and non-negative, got: {}",
                duration_seconds
            )));
        }

        self.requests_total
            .get_metric_with_label_values(&[provider.as_str(), outcome.as_str()])?
            .inc();
        self.request_duration
            .get_metric_with_label_values(&[provider.as_str()])?
            .observe(duration_seconds);
        Ok(())
    }

    /// Add a completion's token counts
    pub fn record_tokens(&self, provider: ProviderId, usage: &Usage) -> Result<(), prometheus::Error> {
        self.tokens_total
            .get_metric_with_label_values(&[provider.as_str(), "prompt"])?
            .inc_by(u64::from(usage.prompt_tokens()));
        self.tokens_total
            .get_metric_with_label_values(&[provider.as_str(), "completion"])?
            .inc_by(u64::from(usage.completion_tokens()));
        Ok(())
    }

    /// Histogram handed to polling adapters
    pub fn poll_attempts(&self) -> Histogram {
        self.poll_attempts.clone()
    }

    /// Gather all metrics in Prometheus text format
    ///
    /// # Errors
    ///
    /// Returns an error if metric encoding fails.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    metric_family_count = metric_families.len(),
                    "Prometheus text encoder failed"
                );
                e
            })?;

        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!(
                "Prometheus encoder produced invalid UTF-8 at byte {}",
                e.utf8_error().valid_up_to()
            ))
        })
    }
}
