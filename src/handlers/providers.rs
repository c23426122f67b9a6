//! Provider discovery endpoints

use crate::handlers::AppState;
use crate::providers::ProviderId;
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderId>,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub provider: String,
    pub models: Vec<String>,
}

/// `GET /api/v1/providers`
pub async fn list_handler(State(state): State<AppState>) -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        providers: state.service().providers(),
    })
}

/// `GET /api/v1/providers/{provider}/models`
///
/// Unknown providers and providers without a credential both yield an empty
/// list.
pub async fn models_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Json<ModelsResponse> {
    let models = provider
        .parse::<ProviderId>()
        .map(|p| state.service().models(p))
        .unwrap_or_default();

    Json(ModelsResponse { provider, models })
}
