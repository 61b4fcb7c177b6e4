pub mod chat;
pub mod models;
pub mod tools;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::error::GatewayError;
use crate::state::AppState;

pub fn routes(state: Arc<AppState>) -> Router {
    let web_dir = state.config.gateway.web_dir.clone();

    let router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ready", get(models::ready))
        .route("/chat", post(chat::chat))
        .route("/tools", get(tools::list_tools))
        .route("/models", get(models::list_models))
        .route("/sessions/:id", delete(delete_session))
        .with_state(state);

    match web_dir {
        Some(dir) => {
            tracing::info!("Serving web UI from {:?} at /web", dir);
            router.nest_service("/web", ServeDir::new(dir))
        }
        None => router,
    }
}

#[derive(Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Welcome to the localgate API. Access the web UI at /web.",
    })
}

async fn health() -> &'static str {
    "ok"
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, GatewayError> {
    if state.sessions.remove(&id).await {
        tracing::info!("Session {} cleared", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(GatewayError::NotFound(format!("session '{}' not found", id)))
    }
}
