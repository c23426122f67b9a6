//! Health check endpoint

use crate::chat::current_timestamp;
use axum::Json;
use serde::Serialize;

pub const SERVICE_NAME: &str = "llm-proxy";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Unix seconds
    pub timestamp: i64,
    pub service: &'static str,
}

/// Liveness only; does not contact any provider
pub async fn handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: current_timestamp(),
        service: SERVICE_NAME,
    })
}
