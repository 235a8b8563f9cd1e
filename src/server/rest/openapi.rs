use utoipa::OpenApi;

use crate::server::rest::{
    error::{ErrorDetails, ErrorResponse},
    handlers::labs::{ActivationResponse, DeactivationResponse, LabsResponse},
};
use crate::shared::models::{
    EventKind, HubStatus, LabPort, LabSpec, LabSummary, ProgressEvent, StartState, StopState,
    Submission,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        version,
        list_labs,
        start_lab,
        launch_lab,
        stop_labs,
        stream_start,
        stream_stop,
        submit_start,
        submit_stop,
        job_status,
    ),
    components(
        schemas(
            ErrorResponse,
            ErrorDetails,
            LabPort,
            LabSpec,
            LabSummary,
            LabsResponse,
            EventKind,
            ProgressEvent,
            ActivationResponse,
            DeactivationResponse,
            StartState,
            StopState,
            HubStatus,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Labs", description = "Synchronous and streaming lab control"),
        (name = "Jobs", description = "Background lab jobs and status polling"),
    ),
    info(
        title = "Lab Hub REST API",
        version = "0.1.0",
        description = "Keeps at most one lab environment running on this host",
    ),
    servers(
        (url = "/", description = "Current server"),
    ),
)]
pub struct ApiDoc;

#[utoipa::path(
    get,
    path = "/api/v0/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
)]
#[allow(dead_code)]
pub async fn health() {}

#[utoipa::path(
    get,
    path = "/api/v0/version",
    tag = "Health",
    responses(
        (status = 200, description = "API version"),
    ),
)]
#[allow(dead_code)]
pub async fn version() {}

#[utoipa::path(
    get,
    path = "/api/v0/labs",
    tag = "Labs",
    responses(
        (status = 200, description = "Lab catalog with running flags", body = LabsResponse),
        (status = 500, description = "Registry could not be loaded", body = ErrorResponse),
        (status = 502, description = "Container engine error", body = ErrorResponse),
    ),
)]
#[allow(dead_code)]
pub async fn list_labs() {}

#[utoipa::path(
    post,
    path = "/api/v0/labs/{lab_id}/start",
    tag = "Labs",
    params(("lab_id" = String, Path, description = "Lab to activate")),
    responses(
        (status = 200, description = "Lab is ready", body = ActivationResponse),
        (status = 404, description = "Unknown lab", body = ErrorResponse),
        (status = 409, description = "Lab image has not been built", body = ErrorResponse),
        (status = 502, description = "Container engine error", body = ErrorResponse),
        (status = 504, description = "Lab did not become ready in time", body = ErrorResponse),
    ),
)]
#[allow(dead_code)]
pub async fn start_lab() {}

#[utoipa::path(
    get,
    path = "/api/v0/labs/{lab_id}/launch",
    tag = "Labs",
    params(("lab_id" = String, Path, description = "Lab to activate and open")),
    responses(
        (status = 303, description = "Redirect to the lab's launch URL"),
        (status = 404, description = "Unknown lab", body = ErrorResponse),
        (status = 409, description = "Lab image has not been built", body = ErrorResponse),
    ),
)]
#[allow(dead_code)]
pub async fn launch_lab() {}

#[utoipa::path(
    post,
    path = "/api/v0/labs/stop",
    tag = "Labs",
    responses(
        (status = 200, description = "All labs stopped", body = DeactivationResponse),
        (status = 502, description = "Container engine error", body = ErrorResponse),
    ),
)]
#[allow(dead_code)]
pub async fn stop_labs() {}

#[utoipa::path(
    get,
    path = "/api/v0/labs/{lab_id}/start/stream",
    tag = "Labs",
    params(("lab_id" = String, Path, description = "Lab to activate")),
    responses(
        (
            status = 200,
            description = "Server-sent events, one ProgressEvent per frame",
            content_type = "text/event-stream",
            body = ProgressEvent
        ),
    ),
)]
#[allow(dead_code)]
pub async fn stream_start() {}

#[utoipa::path(
    get,
    path = "/api/v0/labs/stop/stream",
    tag = "Labs",
    responses(
        (
            status = 200,
            description = "Server-sent events, one ProgressEvent per frame",
            content_type = "text/event-stream",
            body = ProgressEvent
        ),
    ),
)]
#[allow(dead_code)]
pub async fn stream_stop() {}

#[utoipa::path(
    post,
    path = "/api/v0/jobs/labs/{lab_id}/start",
    tag = "Jobs",
    params(("lab_id" = String, Path, description = "Lab to activate")),
    responses(
        (
            status = 202,
            description = "Job accepted, or the start already in flight",
            body = inline(Submission<StartState>)
        ),
        (status = 404, description = "Unknown lab", body = ErrorResponse),
    ),
)]
#[allow(dead_code)]
pub async fn submit_start() {}

#[utoipa::path(
    post,
    path = "/api/v0/jobs/stop",
    tag = "Jobs",
    responses(
        (
            status = 202,
            description = "Job accepted, or the stop already in flight",
            body = inline(Submission<StopState>)
        ),
    ),
)]
#[allow(dead_code)]
pub async fn submit_stop() {}

#[utoipa::path(
    get,
    path = "/api/v0/jobs/status",
    tag = "Jobs",
    responses(
        (status = 200, description = "Running lab, job records and launch URLs", body = HubStatus),
        (status = 500, description = "Registry could not be loaded", body = ErrorResponse),
    ),
)]
#[allow(dead_code)]
pub async fn job_status() {}
