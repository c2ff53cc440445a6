use axum::{Json, extract::State};

use crate::api::ApiState;
use crate::api::types::StatusResponse;
use crate::sinks::RenderedStatus;

/// GET /api/v1/status
pub async fn get_status(State(state): State<ApiState>) -> Json<StatusResponse> {
    let view = state.commands.core().status_snapshot().await;

    Json(StatusResponse {
        status: RenderedStatus::for_query(&view.snapshot),
        endpoints: view.snapshot.endpoints().to_vec(),
        config: view.config,
    })
}
