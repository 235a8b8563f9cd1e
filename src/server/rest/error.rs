use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::error;
use utoipa::ToSchema;

use crate::error::LabError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Lab(#[from] LabError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError::Lab(err) = self;
        let mut details = HashMap::new();

        let (status, code) = match &err {
            LabError::UnknownLab(lab_id) => {
                details.insert("lab_id".to_string(), serde_json::json!(lab_id));
                (StatusCode::NOT_FOUND, "UNKNOWN_LAB")
            }
            LabError::ImageNotFound {
                lab_id,
                image,
                remediation,
            } => {
                details.insert("lab_id".to_string(), serde_json::json!(lab_id));
                details.insert("image".to_string(), serde_json::json!(image));
                details.insert("remediation".to_string(), serde_json::json!(remediation));
                (StatusCode::CONFLICT, "IMAGE_NOT_FOUND")
            }
            LabError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            LabError::Runtime(_) => (StatusCode::BAD_GATEWAY, "RUNTIME_ERROR"),
            LabError::ReadinessTimeout {
                container,
                last_status,
                last_health,
                ..
            } => {
                details.insert("container".to_string(), serde_json::json!(container));
                details.insert("last_status".to_string(), serde_json::json!(last_status));
                details.insert("last_health".to_string(), serde_json::json!(last_health));
                (StatusCode::GATEWAY_TIMEOUT, "READINESS_TIMEOUT")
            }
        };

        if status.is_server_error() {
            error!(code = %code, error = %err, "Request failed");
        }

        let error_response = ErrorResponse {
            error: ErrorDetails {
                code: code.to_string(),
                message: err.to_string(),
                details: (!details.is_empty()).then_some(details),
            },
        };

        (status, Json(error_response)).into_response()
    }
}
