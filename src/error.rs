//! Error types for llm-proxy
//!
//! `AppError` is the single error-kind type of the gateway. Adapter failures
//! arrive as [`ProviderError`] nested inside [`AppError::Provider`]. Every
//! variant renders the same JSON error body via `IntoResponse`.

use crate::metrics::Outcome;
use crate::providers::{ProviderError, ProviderId};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file '{path}': {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config file '{path}': {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("{} API key not configured (set {env_var})", .provider.display_name())]
    CredentialMissing {
        provider: ProviderId,
        env_var: String,
    },

    #[error("Provider {} is not yet implemented", .provider.display_name())]
    UnsupportedProvider { provider: ProviderId },

    #[error(
        "Model {model} is not supported by {}. Supported models: {}",
        .provider.display_name(),
        .supported.join(", ")
    )]
    ModelNotSupported {
        provider: ProviderId,
        model: String,
        supported: Vec<String>,
    },

    #[error("{} API error: {source}", .provider.display_name())]
    Provider {
        provider: ProviderId,
        #[source]
        source: ProviderError,
    },

    #[error(
        "Request to {} timed out after {timeout_seconds} seconds",
        .provider.display_name()
    )]
    RequestTimeout {
        provider: ProviderId,
        timeout_seconds: u64,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::UnknownProvider(_) | Self::ModelNotSupported { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::CredentialMissing { .. }
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UnsupportedProvider { .. } => StatusCode::NOT_IMPLEMENTED,
            Self::Provider { source, .. } => match source {
                ProviderError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                ProviderError::PredictionTimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::RequestTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Machine-readable `error.type` value
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::UnknownProvider(_) => "invalid_request_error",
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::CredentialMissing { .. } => "configuration_error",
            Self::UnsupportedProvider { .. } => "unsupported_provider",
            Self::ModelNotSupported { .. } => "model_not_supported",
            Self::Provider { source, .. } => match source {
                ProviderError::InvalidRequest(_) => "invalid_request_error",
                ProviderError::PredictionFailed(_) => "prediction_failed",
                ProviderError::PredictionTimedOut { .. } => "prediction_timeout",
                _ => "upstream_error",
            },
            Self::RequestTimeout { .. } => "timeout",
            Self::Internal(_) => "server_error",
        }
    }

    /// Outcome label for request metrics
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Provider {
                source: ProviderError::InvalidRequest(_),
                ..
            } => Outcome::Rejected,
            Self::Provider { .. } | Self::RequestTimeout { .. } => Outcome::UpstreamError,
            Self::Validation(_)
            | Self::UnknownProvider(_)
            | Self::UnsupportedProvider { .. }
            | Self::ModelNotSupported { .. } => Outcome::Rejected,
            _ => Outcome::Error,
        }
    }
}

/// Error body returned to clients
///
/// ```json
/// { "error": { "message": "...", "type": "invalid_request_error", "code": "400" } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>, error_type: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
                error_type: error_type.into(),
                code: None,
            },
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.error.code = Some(status.as_u16().to_string());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorBody::new(self.to_string(), self.error_type()).with_status(status);
        (status, Json(body)).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
