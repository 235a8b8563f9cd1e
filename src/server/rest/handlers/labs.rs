use axum::{
    extract::{Path, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        Redirect,
    },
    Json,
};
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::operator::{activation_events, deactivation_events, EventStream};
use crate::server::rest::error::ApiResult;
use crate::shared::models::{LabSpec, LabSummary, ProgressEvent};
use crate::shared::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct LabsResponse {
    pub running_lab_id: Option<String>,
    pub labs: Vec<LabSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActivationResponse {
    pub lab: LabSpec,
    pub events: Vec<ProgressEvent>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeactivationResponse {
    pub stopped: Vec<String>,
    pub events: Vec<ProgressEvent>,
}

pub async fn list_labs(State(state): State<Arc<AppState>>) -> ApiResult<Json<LabsResponse>> {
    let labs = state.orchestrator.list_labs().await?;
    let running_lab_id = labs
        .iter()
        .find(|lab| lab.running)
        .map(|lab| lab.spec.id.clone());

    Ok(Json(LabsResponse {
        running_lab_id,
        labs,
    }))
}

/// Runs the whole pipeline inside the request.
pub async fn start_lab(
    State(state): State<Arc<AppState>>,
    Path(lab_id): Path<String>,
) -> ApiResult<Json<ActivationResponse>> {
    info!(lab_id = %lab_id, "Synchronous lab start requested");
    let mut events: Vec<ProgressEvent> = Vec::new();
    let lab = state.orchestrator.activate(&lab_id, &mut events).await?;
    Ok(Json(ActivationResponse { lab, events }))
}

/// Starts the lab, then sends the browser to it.
pub async fn launch_lab(
    State(state): State<Arc<AppState>>,
    Path(lab_id): Path<String>,
) -> ApiResult<Redirect> {
    let lab = state
        .orchestrator
        .activate_with(&lab_id, None::<fn(&ProgressEvent)>)
        .await?;
    Ok(Redirect::to(&lab.launch_url))
}

pub async fn stop_labs(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DeactivationResponse>> {
    let mut events: Vec<ProgressEvent> = Vec::new();
    let stopped = state.orchestrator.deactivate_all(&mut events).await?;
    Ok(Json(DeactivationResponse { stopped, events }))
}

pub async fn stream_start(
    State(state): State<Arc<AppState>>,
    Path(lab_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    info!(lab_id = %lab_id, "Streaming lab start requested");
    to_sse(activation_events(state.orchestrator.clone(), lab_id))
}

pub async fn stream_stop(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    to_sse(deactivation_events(state.orchestrator.clone()))
}

// One SSE frame per event, named after the event type.
fn to_sse(events: EventStream) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let frames = events.map(|event| {
        Event::default()
            .event(event.kind.as_str())
            .json_data(&event)
    });
    Sse::new(frames).keep_alive(KeepAlive::default())
}
