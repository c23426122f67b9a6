//! HTTP request handlers for the llm-proxy API

use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::error::{AppError, AppResult, ErrorBody};
use crate::metrics::Metrics;
use crate::middleware::request_id_middleware;
use crate::providers::AdapterFactory;
use crate::service::GatewayService;
use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

pub mod chat;
pub mod extractor;
pub mod health;
pub mod metrics;
pub mod providers;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state shared across all handlers
///
/// All fields are Arc'd for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    service: Arc<GatewayService>,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Build state from validated configuration and resolved credentials
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or the metrics registry cannot be
    /// created.
    pub fn new(config: Arc<Config>, credentials: CredentialStore) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("llm-proxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let metrics = Arc::new(Metrics::new().map_err(|e| {
            AppError::Internal(format!("Failed to initialize metrics: {}", e))
        })?);

        let service = GatewayService::new(
            Arc::new(credentials),
            AdapterFactory::new(http, config.poll_policy()),
            config.request_timeout(),
        )
        .with_metrics(Arc::clone(&metrics));

        Ok(Self {
            config,
            service: Arc::new(service),
            metrics,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn service(&self) -> &GatewayService {
        &self.service
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Assemble the full HTTP surface
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/chat", post(chat::handler))
        .route("/api/v1/providers", get(providers::list_handler))
        .route(
            "/api/v1/providers/{provider}/models",
            get(providers::models_handler),
        )
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::new("Route not found", "not_found")),
    )
}
