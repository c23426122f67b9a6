//! Replicate adapter (submit-then-poll)
//!
//! A chat request becomes a prediction job. The adapter submits it, then
//! polls `GET /predictions/{id}` under its [`PollPolicy`] until the job
//! succeeds, fails, is canceled, or the attempt budget runs out.

use super::http::{ErrorShape, send_json};
use super::poll::{PollError, PollPolicy, PollStep, poll_until};
use super::{AdapterCredential, ChatAdapter, ProviderError, ProviderId};
use crate::chat::{ChatRequest, ChatResponse, FinishReason, Usage};
use async_trait::async_trait;
use prometheus::Histogram;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const SUPPORTED_MODELS: &[&str] = &[
    "meta/llama-2-70b-chat",
    "meta/llama-2-13b-chat",
    "meta/llama-2-7b-chat",
    "mistralai/mistral-7b-instruct-v0.1",
    "mistralai/mixtral-8x7b-instruct-v0.1",
    "togethercomputer/RedPajama-INCITE-7B-Chat",
    "joehoover/falcon-40b-instruct",
    "stability-ai/stable-code-instruct-3b",
];

/// Pinned model versions; unlisted models are sent as-is
const MODEL_VERSIONS: &[(&str, &str)] = &[
    (
        "meta/llama-2-70b-chat",
        "a52e56fee2269a78c9279800ec88898cecb6c8f54c51c786c28a3909bdfb2c6f5",
    ),
    (
        "meta/llama-2-13b-chat",
        "f4e2de70d66816a838a89eeeb621910adffb0dd0baba3976c96980970978018d",
    ),
    (
        "meta/llama-2-7b-chat",
        "ac808388e2e9d8ed35a5bf2eaa7d83f0ad53f9e3df31a42e4eb0a0c3249b3165",
    ),
    (
        "mistralai/mistral-7b-instruct-v0.1",
        "83b6a56e7c828e667f21fd596c338fd4f0039b46bcfa18d973e8e70e455fda70",
    ),
];

const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_LENGTH: u32 = 500;
const DEFAULT_TOP_P: f64 = 0.9;

/// Version hash for a model name
pub fn model_version(model: &str) -> &str {
    MODEL_VERSIONS
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, version)| *version)
        .unwrap_or(model)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionInput {
    pub prompt: String,
    pub temperature: f64,
    pub max_length: u32,
    pub top_p: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRequest {
    pub version: String,
    pub input: PredictionInput,
}

/// Lifecycle state of a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    #[default]
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

/// Model output: streamed token chunks or a single string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PredictionOutput {
    Chunks(Vec<String>),
    Text(String),
}

impl PredictionOutput {
    fn into_text(self) -> String {
        match self {
            Self::Chunks(chunks) => chunks.concat(),
            Self::Text(text) => text,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub id: String,
    #[serde(default)]
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<PredictionOutput>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl Prediction {
    /// Provider-reported failure text
    fn failure_message(&self) -> String {
        match &self.error {
            Some(Value::String(message)) => message.clone(),
            Some(Value::Null) | None if self.status == PredictionStatus::Canceled => {
                "prediction was canceled".to_string()
            }
            Some(Value::Null) | None => "unknown error".to_string(),
            Some(other) => other.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct ReplicateAdapter {
    credential: AdapterCredential,
    http: reqwest::Client,
    policy: PollPolicy,
    poll_attempts: Option<Histogram>,
}

impl fmt::Debug for ReplicateAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicateAdapter")
            .field("credential", &self.credential)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ReplicateAdapter {
    pub fn new(credential: AdapterCredential, http: reqwest::Client, policy: PollPolicy) -> Self {
        Self {
            credential,
            http,
            policy,
            poll_attempts: None,
        }
    }

    /// Record how many status checks each prediction needed
    pub fn with_poll_histogram(mut self, histogram: Histogram) -> Self {
        self.poll_attempts = Some(histogram);
        self
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Role-tagged transcript ending in an open `assistant:` turn
    pub fn transcript(request: &ChatRequest) -> String {
        let mut prompt = request
            .messages()
            .iter()
            .map(|m| format!("{}: {}", m.role().as_str(), m.content()))
            .collect::<Vec<_>>()
            .join("\n");
        prompt.push_str("\nassistant:");
        prompt
    }

    pub fn to_provider_format(request: &ChatRequest) -> PredictionRequest {
        PredictionRequest {
            version: model_version(request.model()).to_string(),
            input: PredictionInput {
                prompt: Self::transcript(request),
                temperature: request.temperature().unwrap_or(DEFAULT_TEMPERATURE),
                max_length: request.max_tokens().unwrap_or(DEFAULT_MAX_LENGTH),
                top_p: request.top_p().unwrap_or(DEFAULT_TOP_P),
            },
        }
    }

    pub fn to_canonical_format(prediction: Prediction, model: &str) -> ChatResponse {
        let content = prediction
            .output
            .map(PredictionOutput::into_text)
            .unwrap_or_default();

        ChatResponse::single(
            format!("replicate-{}", prediction.id),
            model,
            content.trim(),
            FinishReason::Stop,
            Usage::unreported(),
        )
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.credential.api_key())
    }

    fn observe_attempts(&self, attempts: u32) {
        if let Some(histogram) = &self.poll_attempts {
            histogram.observe(f64::from(attempts));
        }
    }

    async fn submit(&self, body: &PredictionRequest) -> Result<Prediction, ProviderError> {
        let request = self
            .http
            .post(self.credential.url("predictions"))
            .header(AUTHORIZATION, self.auth_header())
            .json(body);
        send_json(request, ErrorShape::Detail).await
    }

    async fn wait_for(&self, prediction_id: &str) -> Result<Prediction, ProviderError> {
        let status_url = self
            .credential
            .url(&format!("predictions/{}", prediction_id));
        let auth = self.auth_header();
        let http = &self.http;

        let outcome = poll_until(self.policy, |attempt| {
            let request = http.get(&status_url).header(AUTHORIZATION, auth.as_str());
            async move {
                let prediction: Prediction = send_json(request, ErrorShape::Detail).await?;
                tracing::debug!(
                    prediction_id = %prediction.id,
                    status = ?prediction.status,
                    attempt,
                    "Polled prediction status"
                );
                match prediction.status {
                    PredictionStatus::Succeeded => Ok(PollStep::Done(prediction)),
                    PredictionStatus::Failed | PredictionStatus::Canceled => {
                        Err(ProviderError::PredictionFailed(prediction.failure_message()))
                    }
                    _ => Ok(PollStep::Pending),
                }
            }
        })
        .await;

        match outcome {
            Ok(polled) => {
                self.observe_attempts(polled.attempts);
                Ok(polled.value)
            }
            Err(PollError::Check { attempt, error }) => {
                self.observe_attempts(attempt);
                Err(error)
            }
            Err(PollError::Exhausted { attempts }) => {
                self.observe_attempts(attempts);
                tracing::warn!(prediction_id, attempts, "Prediction did not finish in time");
                Err(ProviderError::PredictionTimedOut { attempts })
            }
        }
    }
}

#[async_trait]
impl ChatAdapter for ReplicateAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Replicate
    }

    fn catalog(&self) -> &'static [&'static str] {
        SUPPORTED_MODELS
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let body = Self::to_provider_format(request);
        let submitted = self.submit(&body).await?;
        tracing::debug!(prediction_id = %submitted.id, "Prediction submitted");

        let finished = self.wait_for(&submitted.id).await?;
        Ok(Self::to_canonical_format(finished, request.model()))
    }
}
