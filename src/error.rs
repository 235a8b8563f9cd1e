use thiserror::Error;

use crate::docker::{ContainerStatus, HealthStatus, RuntimeError};

/// Build step operators must run when a lab image is missing. This crate
/// never builds or pulls images itself.
pub const IMAGE_BUILD_REMEDIATION: &str =
    "docker compose build (or docker compose --profile labs up -d --build)";

#[derive(Error, Debug)]
pub enum LabError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown lab_id: {0}")]
    UnknownLab(String),

    #[error("Lab image not found locally for lab '{lab_id}': {image}. Run: {remediation}")]
    ImageNotFound {
        lab_id: String,
        image: String,
        remediation: &'static str,
    },

    #[error("Container runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error(
        "Container {container} was not ready within {waited_secs}s (last status: {last_status}{})",
        .last_health.map(|h| format!(", health: {h}")).unwrap_or_default()
    )]
    ReadinessTimeout {
        container: String,
        waited_secs: u64,
        last_status: ContainerStatus,
        last_health: Option<HealthStatus>,
    },
}

impl LabError {
    pub fn image_not_found(lab_id: &str, image: &str) -> Self {
        LabError::ImageNotFound {
            lab_id: lab_id.to_string(),
            image: image.to_string(),
            remediation: IMAGE_BUILD_REMEDIATION,
        }
    }
}

pub type Result<T> = std::result::Result<T, LabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_not_found_names_lab_image_and_build_command() {
        let message =
            LabError::image_not_found("lab3", "labs/lab3-triage-board:latest").to_string();
        assert!(message.contains("lab3"));
        assert!(message.contains("labs/lab3-triage-board:latest"));
        assert!(message.contains("docker compose build"));
    }

    #[test]
    fn readiness_timeout_reports_last_observation() {
        let err = LabError::ReadinessTimeout {
            container: "lab1".to_string(),
            waited_secs: 30,
            last_status: ContainerStatus::Running,
            last_health: Some(HealthStatus::Unhealthy),
        };
        let message = err.to_string();
        assert!(message.contains("last status: running"));
        assert!(message.contains("health: unhealthy"));

        let err = LabError::ReadinessTimeout {
            container: "lab1".to_string(),
            waited_secs: 30,
            last_status: ContainerStatus::Exited,
            last_health: None,
        };
        assert!(!err.to_string().contains("health:"));
    }
}
