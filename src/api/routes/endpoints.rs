//! Endpoint list management: add, remove and autocomplete

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::api::types::{AddEndpointRequest, ChoicesQuery, ReplyResponse};
use crate::api::{ApiResult, ApiState};
use crate::commands::Choice;

/// GET /api/v1/endpoints?prefix=
pub async fn list_choices(
    State(state): State<ApiState>,
    Query(query): Query<ChoicesQuery>,
) -> Json<Vec<Choice>> {
    Json(state.commands.autocomplete_addresses(&query.prefix).await)
}

/// POST /api/v1/endpoints
pub async fn add_endpoint(
    State(state): State<ApiState>,
    Json(request): Json<AddEndpointRequest>,
) -> ApiResult<(StatusCode, Json<ReplyResponse>)> {
    let reply = state
        .commands
        .add_server(&request.address, &request.name)
        .await?;

    Ok((StatusCode::CREATED, Json(reply.into())))
}

/// DELETE /api/v1/endpoints/:address
pub async fn remove_endpoint(
    State(state): State<ApiState>,
    Path(address): Path<String>,
) -> ApiResult<Json<ReplyResponse>> {
    let reply = state.commands.remove_server(&address).await?;
    Ok(Json(reply.into()))
}
