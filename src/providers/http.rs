//! Shared HTTP plumbing for provider adapters

use super::ProviderError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Where a provider puts the human-readable message in its error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorShape {
    /// `{"error": {"message": "..."}}`
    NestedMessage,
    /// `{"message": "..."}`
    Message,
    /// `{"error": "..."}`
    Error,
    /// `{"detail": "..."}`
    Detail,
}

impl ErrorShape {
    /// Pull the provider's own error text out of a JSON body
    pub(crate) fn extract(&self, body: &Value) -> Option<String> {
        let field = match self {
            Self::NestedMessage => body.get("error")?.get("message")?,
            Self::Message => body.get("message")?,
            Self::Error => body.get("error")?,
            Self::Detail => body.get("detail")?,
        };
        match field {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Send a request and decode a JSON body
///
/// Non-success statuses become [`ProviderError::Api`] carrying the provider's
/// error text (or the raw body when it is not in the expected shape).
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    shape: ErrorShape,
) -> Result<T, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| shape.extract(&v))
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                } else {
                    body.clone()
                }
            });
        return Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))
}
