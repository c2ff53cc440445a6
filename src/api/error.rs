//! API error types and conversions

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::monitor::CoreError;
use crate::registry::RegistryError;
use crate::sinks::SinkError;

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Command rejected by the registry
    #[error(transparent)]
    Rejected(#[from] RegistryError),

    /// The chat platform refused or could not be reached
    #[error("chat platform error: {0}")]
    Upstream(#[from] SinkError),

    #[error("storage error: {0}")]
    Storage(String),

    /// Feature not wired up in this process
    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Rejected(RegistryError::DuplicateEndpoint(_)) => StatusCode::CONFLICT,
            ApiError::Rejected(RegistryError::UnknownEndpoint(_)) => StatusCode::NOT_FOUND,
            ApiError::Rejected(RegistryError::InvalidAddress(_)) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Registry(e) => ApiError::Rejected(e),
            CoreError::Sink(e) => ApiError::Upstream(e),
            CoreError::Storage(e) => ApiError::Storage(e.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(format!("{err:#}"))
    }
}
