use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use localgate_agent::AgentError;
use localgate_backend::BackendError;
use serde::Serialize;
use thiserror::Error;

use crate::limiter::LimitError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Limit(#[from] LimitError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Limit(LimitError::QueueFull(_)) => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Limit(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Backend(BackendError::Unreachable { .. }) => StatusCode::BAD_GATEWAY,
            GatewayError::Backend(BackendError::NotReady { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Backend(BackendError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AgentError> for GatewayError {
    fn from(error: AgentError) -> Self {
        match error {
            AgentError::Backend(e) => GatewayError::Backend(e),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed ({}): {}", status, self);
        } else {
            tracing::warn!("Request rejected ({}): {}", status, self);
        }

        (
            status,
            Json(ErrorBody {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn backend_failures_map_to_gateway_statuses() {
        let unreachable = GatewayError::Backend(BackendError::Unreachable {
            url: "u".into(),
            reason: "r".into(),
        });
        let not_ready = GatewayError::Backend(BackendError::NotReady {
            url: "u".into(),
            reason: "r".into(),
        });
        let timeout = GatewayError::Backend(BackendError::Timeout(Duration::from_secs(1)));

        assert_eq!(unreachable.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(not_ready.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn limiter_failures_map_to_statuses() {
        assert_eq!(
            GatewayError::from(LimitError::QueueFull(3)).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            GatewayError::from(LimitError::QueueTimeout(Duration::from_secs(1))).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
