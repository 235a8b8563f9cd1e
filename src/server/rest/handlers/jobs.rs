use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::server::rest::error::ApiResult;
use crate::shared::models::{HubStatus, StartState, StopState, Submission};
use crate::shared::AppState;

pub async fn submit_start(
    State(state): State<Arc<AppState>>,
    Path(lab_id): Path<String>,
) -> ApiResult<(StatusCode, Json<Submission<StartState>>)> {
    let submission = state.jobs.submit_start(&lab_id)?;
    Ok((StatusCode::ACCEPTED, Json(submission)))
}

pub async fn submit_stop(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<Submission<StopState>>) {
    (StatusCode::ACCEPTED, Json(state.jobs.submit_stop()))
}

pub async fn status(State(state): State<Arc<AppState>>) -> ApiResult<Json<HubStatus>> {
    Ok(Json(state.jobs.status().await?))
}
