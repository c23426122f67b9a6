//! Chat completion endpoint
//!
//! `POST /api/v1/chat?service=<provider>` with a canonical request body.

use crate::chat::{ChatRequest, ChatResponse};
use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::handlers::extractor::ApiJson;
use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

/// Out-of-band provider selector
#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    pub service: Option<String>,
}

pub async fn handler(
    State(state): State<AppState>,
    Query(query): Query<ChatQuery>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let service = query
        .service
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            AppError::Validation("service: query parameter is required".to_string())
        })?;

    let response = state.service().chat_by_name(&service, &request).await?;
    Ok(Json(response))
}
