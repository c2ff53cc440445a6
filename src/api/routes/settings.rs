//! Display and alert destinations

use axum::{Json, extract::State};

use crate::api::types::{ReplyResponse, SetAlertRequest, SetChannelRequest};
use crate::api::{ApiResult, ApiState};

/// PUT /api/v1/display
pub async fn set_display(
    State(state): State<ApiState>,
    Json(request): Json<SetChannelRequest>,
) -> ApiResult<Json<ReplyResponse>> {
    let reply = state.commands.set_channel(request.channel_id).await?;
    Ok(Json(reply.into()))
}

/// PUT /api/v1/alert
pub async fn set_alert(
    State(state): State<ApiState>,
    Json(request): Json<SetAlertRequest>,
) -> Json<ReplyResponse> {
    let reply = state
        .commands
        .set_alert(request.channel_id, &request.message)
        .await;
    Json(reply.into())
}

/// POST /api/v1/display/show-address
pub async fn toggle_show_address(State(state): State<ApiState>) -> Json<ReplyResponse> {
    Json(state.commands.toggle_ip().await.into())
}
