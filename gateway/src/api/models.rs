use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use localgate_backend::ProbeOutcome;
use serde::Serialize;
use std::sync::Arc;

use crate::error::GatewayError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ModelsResponse {
    pub default: String,
    pub models: Vec<String>,
}

pub async fn list_models(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ModelsResponse>, GatewayError> {
    let models = state.daemon.list_models().await?;

    Ok(Json(ModelsResponse {
        default: state.daemon.default_model().to_string(),
        models,
    }))
}

/// Probe the daemon once; 503 unless it answers healthy
pub async fn ready(State(state): State<Arc<AppState>>) -> Response {
    match state.daemon.probe().await {
        ProbeOutcome::Ready => Json(serde_json::json!({ "daemon": "ready" })).into_response(),
        ProbeOutcome::NotReady(reason) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "detail": format!("model daemon not ready: {}", reason) })),
        )
            .into_response(),
        ProbeOutcome::Unreachable(reason) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "detail": format!("model daemon unreachable: {}", reason) })),
        )
            .into_response(),
    }
}
