use axum::{Json, extract::State};

use crate::api::{ApiError, ApiResult, ApiState};
use crate::monitor::CycleReport;

/// POST /api/v1/cycle
///
/// Runs a cycle through the scheduler, so it queues behind a running one.
pub async fn run_cycle(State(state): State<ApiState>) -> ApiResult<Json<CycleReport>> {
    let scheduler = state
        .scheduler
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("scheduler is not running".to_string()))?;

    Ok(Json(scheduler.run_now().await?))
}
