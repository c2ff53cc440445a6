//! Health check endpoint

use axum::{Json, extract::State};

use crate::api::ApiState;
use crate::api::types::HealthResponse;

/// GET /api/v1/health
pub async fn health_check(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        endpoints: state.commands.core().registry().len().await,
    })
}
