//! Canonical chat request and response types
//!
//! Every provider adapter translates to and from these types. Validation is
//! enforced during deserialization - invalid requests cannot exist.

use serde::{Deserialize, Deserializer, Serialize};

/// Object tag carried by every canonical response
pub const OBJECT_CHAT_COMPLETION: &str = "chat.completion";

/// Upper bound accepted for `max_tokens`
pub const MAX_TOKENS_LIMIT: u32 = 4000;

// =============================================================================
// Shared Validation Logic
// =============================================================================

/// Validate ChatRequest fields
///
/// Single source of truth for request validation, used by both the builder
/// and the serde deserializer.
fn validate_request_fields(
    model: &str,
    messages: &[ChatMessage],
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    top_p: Option<f64>,
    frequency_penalty: Option<f64>,
    presence_penalty: Option<f64>,
) -> Result<(), String> {
    if model.trim().is_empty() {
        return Err("model: must not be empty".to_string());
    }

    if messages.is_empty() {
        return Err("messages: must contain at least 1 message".to_string());
    }

    check_range("temperature", temperature, 0.0, 2.0)?;
    check_range("top_p", top_p, 0.0, 1.0)?;
    check_range("frequency_penalty", frequency_penalty, -2.0, 2.0)?;
    check_range("presence_penalty", presence_penalty, -2.0, 2.0)?;

    if let Some(max) = max_tokens
        && !(1..=MAX_TOKENS_LIMIT).contains(&max)
    {
        return Err(format!(
            "max_tokens: must be between 1 and {} (got {})",
            MAX_TOKENS_LIMIT, max
        ));
    }

    Ok(())
}

fn check_range(field: &str, value: Option<f64>, min: f64, max: f64) -> Result<(), String> {
    let Some(value) = value else {
        return Ok(());
    };
    if !value.is_finite() {
        return Err(format!("{}: must be a finite number", field));
    }
    if value < min || value > max {
        return Err(format!(
            "{}: must be between {} and {} (got {})",
            field, min, max, value
        ));
    }
    Ok(())
}

// =============================================================================
// Message Types
// =============================================================================

/// Message role in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    /// Wire representation of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    role: MessageRole,
    content: String,
}

impl ChatMessage {
    /// Create a new message with validation
    ///
    /// # Errors
    /// Returns an error if content is empty.
    pub fn try_new(role: MessageRole, content: impl Into<String>) -> Result<Self, &'static str> {
        let content = content.into();
        if content.is_empty() {
            return Err("content cannot be empty");
        }
        Ok(Self { role, content })
    }

    /// Get the role
    pub fn role(&self) -> MessageRole {
        self.role
    }

    /// Get the content
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl<'de> Deserialize<'de> for ChatMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawMessage {
            role: MessageRole,
            content: String,
        }

        let raw = RawMessage::deserialize(deserializer)?;
        ChatMessage::try_new(raw.role, raw.content).map_err(|_| {
            serde::de::Error::custom(format!(
                "messages: {} message content cannot be empty",
                raw.role.as_str()
            ))
        })
    }
}

// =============================================================================
// Chat Request
// =============================================================================

/// Canonical chat completion request
///
/// The provider is chosen out-of-band (query selector), so it is not part of
/// the body. Use [`ChatRequest::builder()`] for programmatic construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Builder for [`ChatRequest`]
///
/// Performs the same validation as JSON deserialization.
///
/// # Examples
///
/// ```
/// use llm_proxy::chat::ChatRequest;
///
/// let request = ChatRequest::builder()
///     .model("gpt-4o")
///     .system_message("You are terse.")
///     .user_message("Hello!")
///     .temperature(0.2)
///     .build()
///     .expect("valid request");
/// assert_eq!(request.messages().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct ChatRequestBuilder {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    top_p: Option<f64>,
    frequency_penalty: Option<f64>,
    presence_penalty: Option<f64>,
    stream: Option<bool>,
}

impl ChatRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Add a single message to the request
    pub fn message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Add a system message
    ///
    /// # Panics
    /// Panics if content is empty (use `message()` for error handling)
    pub fn system_message(self, content: impl Into<String>) -> Self {
        let msg = ChatMessage::try_new(MessageRole::System, content)
            .expect("system message content must not be empty");
        self.message(msg)
    }

    /// Add a user message
    ///
    /// # Panics
    /// Panics if content is empty (use `message()` for error handling)
    pub fn user_message(self, content: impl Into<String>) -> Self {
        let msg = ChatMessage::try_new(MessageRole::User, content)
            .expect("user message content must not be empty");
        self.message(msg)
    }

    /// Add an assistant message
    ///
    /// # Panics
    /// Panics if content is empty (use `message()` for error handling)
    pub fn assistant_message(self, content: impl Into<String>) -> Self {
        let msg = ChatMessage::try_new(MessageRole::Assistant, content)
            .expect("assistant message content must not be empty");
        self.message(msg)
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn frequency_penalty(mut self, frequency_penalty: f64) -> Self {
        self.frequency_penalty = Some(frequency_penalty);
        self
    }

    pub fn presence_penalty(mut self, presence_penalty: f64) -> Self {
        self.presence_penalty = Some(presence_penalty);
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Build the request, performing all validation
    ///
    /// # Errors
    /// Returns an error string if validation fails (same rules as JSON deserialization)
    pub fn build(self) -> Result<ChatRequest, String> {
        validate_request_fields(
            &self.model,
            &self.messages,
            self.temperature,
            self.max_tokens,
            self.top_p,
            self.frequency_penalty,
            self.presence_penalty,
        )?;

        Ok(ChatRequest {
            model: self.model,
            messages: self.messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: self.top_p,
            frequency_penalty: self.frequency_penalty,
            presence_penalty: self.presence_penalty,
            stream: self.stream,
        })
    }
}

impl ChatRequest {
    pub fn builder() -> ChatRequestBuilder {
        ChatRequestBuilder::new()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Messages in conversation order (never empty)
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    pub fn top_p(&self) -> Option<f64> {
        self.top_p
    }

    pub fn frequency_penalty(&self) -> Option<f64> {
        self.frequency_penalty
    }

    pub fn presence_penalty(&self) -> Option<f64> {
        self.presence_penalty
    }

    /// Whether the caller asked for streaming (defaults to false)
    pub fn stream(&self) -> bool {
        self.stream.unwrap_or(false)
    }

    /// Split into the most recent message and everything before it
    pub fn split_last(&self) -> Option<(&ChatMessage, &[ChatMessage])> {
        self.messages.split_last()
    }
}

impl<'de> Deserialize<'de> for ChatRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawRequest {
            model: String,
            messages: Vec<ChatMessage>,
            temperature: Option<f64>,
            max_tokens: Option<u32>,
            top_p: Option<f64>,
            frequency_penalty: Option<f64>,
            presence_penalty: Option<f64>,
            stream: Option<bool>,
        }

        let raw = RawRequest::deserialize(deserializer)?;

        validate_request_fields(
            &raw.model,
            &raw.messages,
            raw.temperature,
            raw.max_tokens,
            raw.top_p,
            raw.frequency_penalty,
            raw.presence_penalty,
        )
        .map_err(serde::de::Error::custom)?;

        Ok(ChatRequest {
            model: raw.model,
            messages: raw.messages,
            temperature: raw.temperature,
            max_tokens: raw.max_tokens,
            top_p: raw.top_p,
            frequency_penalty: raw.frequency_penalty,
            presence_penalty: raw.presence_penalty,
            stream: raw.stream,
        })
    }
}

// =============================================================================
// Chat Response
// =============================================================================

/// Finish reason for a completion
///
/// Only two canonical values exist. When deserializing a provider response,
/// `"length"` maps to [`FinishReason::Length`] and any other signal to
/// [`FinishReason::Stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    #[default]
    Stop,
    Length,
}

impl<'de> Deserialize<'de> for FinishReason {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw.as_deref() {
            Some("length") => FinishReason::Length,
            _ => FinishReason::Stop,
        })
    }
}

/// Token usage statistics
///
/// Fields are private to enforce the invariant that `total_tokens` always
/// equals `prompt_tokens + completion_tokens`. Deserialization recomputes the
/// total from its parts and treats missing counts as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl Usage {
    /// Create usage stats from token counts.
    #[inline]
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }

    /// Usage for providers that report no token counts
    #[inline]
    pub fn unreported() -> Self {
        Self::new(0, 0)
    }

    #[inline]
    pub fn prompt_tokens(&self) -> u32 {
        self.prompt_tokens
    }

    #[inline]
    pub fn completion_tokens(&self) -> u32 {
        self.completion_tokens
    }

    #[inline]
    pub fn total_tokens(&self) -> u32 {
        self.total_tokens
    }
}

impl<'de> Deserialize<'de> for Usage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawUsage {
            #[serde(default)]
            prompt_tokens: Option<u32>,
            #[serde(default)]
            completion_tokens: Option<u32>,
        }

        let raw = RawUsage::deserialize(deserializer)?;
        Ok(Usage::new(
            raw.prompt_tokens.unwrap_or(0),
            raw.completion_tokens.unwrap_or(0),
        ))
    }
}

/// Assistant message in a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub role: MessageRole,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
}

impl AssistantMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single choice in the response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: AssistantMessage,
    #[serde(default)]
    pub finish_reason: FinishReason,
}

/// Canonical chat completion response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

impl ChatResponse {
    /// Build a single-choice response created now
    pub fn single(
        id: impl Into<String>,
        model: impl Into<String>,
        content: impl Into<String>,
        finish_reason: FinishReason,
        usage: Usage,
    ) -> Self {
        Self {
            id: id.into(),
            object: OBJECT_CHAT_COMPLETION.to_string(),
            created: current_timestamp(),
            model: model.into(),
            choices: vec![Choice {
                index: 0,
                message: AssistantMessage::new(content),
                finish_reason,
            }],
            usage,
        }
    }

    /// Content of the first (only) choice
    pub fn content(&self) -> &str {
        self.choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or("")
    }

    /// Finish reason of the first (only) choice
    pub fn finish_reason(&self) -> FinishReason {
        self.choices
            .first()
            .map(|c| c.finish_reason)
            .unwrap_or_default()
    }
}

/// Rejects responses without choices so a partial response never escapes
impl<'de> Deserialize<'de> for ChatResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawResponse {
            id: String,
            #[serde(default = "default_object")]
            object: String,
            created: i64,
            model: String,
            choices: Vec<Choice>,
            #[serde(default)]
            usage: Usage,
        }

        let raw = RawResponse::deserialize(deserializer)?;
        if raw.choices.is_empty() {
            return Err(serde::de::Error::custom(
                "response contains no completion choices",
            ));
        }

        Ok(ChatResponse {
            id: raw.id,
            object: raw.object,
            created: raw.created,
            model: raw.model,
            choices: raw.choices,
            usage: raw.usage,
        })
    }
}

fn default_object() -> String {
    OBJECT_CHAT_COMPLETION.to_string()
}

/// Current Unix timestamp in seconds
///
/// Returns 0 and logs a warning if the system clock is before the epoch.
pub fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_else(|e| {
            tracing::warn!(
                error = %e,
                "System clock appears to be before UNIX epoch - using 0 as timestamp"
            );
            0
        })
}

/// Synthesized completion id for providers that do not return one
pub fn completion_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<ChatRequest, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_request_deserializes_minimal() {
        let req = parse(r#"{"model":"gpt-4o","messages":[{"role":"user","content":"hi"}]}"#)
            .expect("valid request");
        assert_eq!(req.model(), "gpt-4o");
        assert_eq!(req.messages().len(), 1);
        assert_eq!(req.messages()[0].role(), MessageRole::User);
        assert!(!req.stream());
        assert_eq!(req.temperature(), None);
    }

    #[test]
    fn test_request_rejects_empty_messages() {
        let err = parse(r#"{"model":"gpt-4o","messages":[]}"#).unwrap_err();
        assert!(err.to_string().contains("at least 1 message"));
    }

    #[test]
    fn test_request_rejects_empty_content() {
        let err = parse(r#"{"model":"gpt-4o","messages":[{"role":"user","content":""}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("content cannot be empty"));
    }

    #[test]
    fn test_request_rejects_unknown_role() {
        let result = parse(r#"{"model":"gpt-4o","messages":[{"role":"tool","content":"x"}]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_request_rejects_empty_model() {
        let err = parse(r#"{"model":"  ","messages":[{"role":"user","content":"hi"}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("model"));
    }

    #[test]
    fn test_request_range_boundaries() {
        let base = ChatRequest::builder().model("m").user_message("hi");
        assert!(base.temperature(2.0).build().is_ok());

        let cases: Vec<(ChatRequestBuilder, &str)> = vec![
            (
                ChatRequest::builder().model("m").user_message("hi").temperature(2.1),
                "temperature",
            ),
            (
                ChatRequest::builder().model("m").user_message("hi").temperature(-0.1),
                "temperature",
            ),
            (
                ChatRequest::builder().model("m").user_message("hi").top_p(1.5),
                "top_p",
            ),
            (
                ChatRequest::builder().model("m").user_message("hi").max_tokens(0),
                "max_tokens",
            ),
            (
                ChatRequest::builder().model("m").user_message("hi").max_tokens(4001),
                "max_tokens",
            ),
            (
                ChatRequest::builder()
                    .model("m")
                    .user_message("hi")
                    .frequency_penalty(-2.5),
                "frequency_penalty",
            ),
            (
                ChatRequest::builder()
                    .model("m")
                    .user_message("hi")
                    .presence_penalty(2.5),
                "presence_penalty",
            ),
            (
                ChatRequest::builder()
                    .model("m")
                    .user_message("hi")
                    .temperature(f64::NAN),
                "finite",
            ),
        ];

        for (builder, needle) in cases {
            let err = builder.build().unwrap_err();
            assert!(err.contains(needle), "expected '{}' in '{}'", needle, err);
        }
    }

    #[test]
    fn test_request_accepts_inclusive_bounds() {
        let req = ChatRequest::builder()
            .model("m")
            .user_message("hi")
            .temperature(0.0)
            .top_p(1.0)
            .max_tokens(4000)
            .frequency_penalty(-2.0)
            .presence_penalty(2.0)
            .build();
        assert!(req.is_ok());
    }

    #[test]
    fn test_request_serializes_without_unset_options() {
        let req = ChatRequest::builder()
            .model("gpt-4o")
            .user_message("hi")
            .build()
            .unwrap();
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("temperature").is_none());
        assert!(json.get("stream").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_split_last_returns_latest_message() {
        let req = ChatRequest::builder()
            .model("m")
            .user_message("first")
            .assistant_message("second")
            .user_message("third")
            .build()
            .unwrap();
        let (last, history) = req.split_last().unwrap();
        assert_eq!(last.content(), "third");
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_usage_total_is_sum() {
        let usage = Usage::new(12, 30);
        assert_eq!(usage.total_tokens(), 42);
        assert_eq!(Usage::unreported().total_tokens(), 0);
    }

    #[test]
    fn test_usage_deserialize_recomputes_total() {
        let usage: Usage =
            serde_json::from_str(r#"{"prompt_tokens":5,"completion_tokens":7}"#).unwrap();
        assert_eq!(usage.total_tokens(), 12);

        let usage: Usage = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(usage, Usage::unreported());
    }

    #[test]
    fn test_finish_reason_maps_unknown_signals_to_stop() {
        let reason: FinishReason = serde_json::from_str(r#""length""#).unwrap();
        assert_eq!(reason, FinishReason::Length);
        let reason: FinishReason = serde_json::from_str(r#""content_filter""#).unwrap();
        assert_eq!(reason, FinishReason::Stop);
        let reason: FinishReason = serde_json::from_str("null").unwrap();
        assert_eq!(reason, FinishReason::Stop);
    }

    #[test]
    fn test_response_rejects_missing_choices() {
        let json = r#"{"id":"x","object":"chat.completion","created":1,"model":"m","choices":[]}"#;
        assert!(serde_json::from_str::<ChatResponse>(json).is_err());
    }

    #[test]
    fn test_response_single_shape() {
        let resp = ChatResponse::single("id-1", "m", "hello", FinishReason::Stop, Usage::new(1, 2));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["object"], "chat.completion");
        assert_eq!(json["choices"][0]["index"], 0);
        assert_eq!(json["choices"][0]["message"]["role"], "assistant");
        assert_eq!(json["choices"][0]["finish_reason"], "stop");
        assert_eq!(json["usage"]["total_tokens"], 3);
        assert!(resp.created > 0);
    }

    #[test]
    fn test_response_null_content_becomes_empty() {
        let json = r#"{"id":"x","created":1,"model":"m","choices":[{"index":0,"message":{"role":"assistant","content":null},"finish_reason":"stop"}]}"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.content(), "");
        assert_eq!(resp.object, OBJECT_CHAT_COMPLETION);
    }

    #[test]
    fn test_completion_id_has_prefix() {
        let id = completion_id("cohere");
        assert!(id.starts_with("cohere-"));
        assert_ne!(id, completion_id("cohere"));
    }
}
