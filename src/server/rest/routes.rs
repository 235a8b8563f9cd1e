use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::server::rest::{
    handlers, logging_middleware::request_logging_middleware, openapi::ApiDoc,
};
use crate::shared::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        // Lab endpoints
        .route("/labs", get(handlers::labs::list_labs))
        .route("/labs/stop", post(handlers::labs::stop_labs))
        .route("/labs/stop/stream", get(handlers::labs::stream_stop))
        .route("/labs/{lab_id}/start", post(handlers::labs::start_lab))
        .route("/labs/{lab_id}/start/stream", get(handlers::labs::stream_start))
        .route("/labs/{lab_id}/launch", get(handlers::labs::launch_lab))
        // Background job endpoints
        .route("/jobs/labs/{lab_id}/start", post(handlers::jobs::submit_start))
        .route("/jobs/stop", post(handlers::jobs::submit_stop))
        .route("/jobs/status", get(handlers::jobs::status))
        .with_state(state);

    Router::new()
        .nest("/api/v0", api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn version() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "api": "v0"
    }))
}
