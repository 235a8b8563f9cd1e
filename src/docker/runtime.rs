use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::shared::models::LabPort;

/// Container status as reported by the engine. `Absent` stands for "no
/// container with that name".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    Absent,
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
    Unknown,
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContainerStatus::Absent => "absent",
            ContainerStatus::Created => "created",
            ContainerStatus::Running => "running",
            ContainerStatus::Paused => "paused",
            ContainerStatus::Restarting => "restarting",
            ContainerStatus::Removing => "removing",
            ContainerStatus::Exited => "exited",
            ContainerStatus::Dead => "dead",
            ContainerStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Health-check sub-status. Containers without a declared health check
/// report no health at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Starting,
    Healthy,
    Unhealthy,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthStatus::Starting => "starting",
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
        };
        f.write_str(s)
    }
}

/// Point-in-time view of a container. Never cached; every caller re-queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerSnapshot {
    pub status: ContainerStatus,
    pub health: Option<HealthStatus>,
}

impl ContainerSnapshot {
    pub fn new(status: ContainerStatus) -> Self {
        Self {
            status,
            health: None,
        }
    }

    pub fn with_health(status: ContainerStatus, health: HealthStatus) -> Self {
        Self {
            status,
            health: Some(health),
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == ContainerStatus::Running
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPolicy {
    Never,
    OnFailure,
    Always,
}

/// Everything the engine needs to create and start one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    pub name: String,
    pub image: String,
    pub ports: Vec<LabPort>,
    pub restart_policy: RestartPolicy,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("No such container: {0}")]
    NotFound(String),

    #[error("{0}")]
    Engine(String),
}

impl RuntimeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RuntimeError::NotFound(_))
    }
}

/// Control API of the host container engine. This is the only seam to
/// Docker; everything above it works against this trait.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// `Ok(None)` when no container with `name` exists.
    async fn get(&self, name: &str) -> Result<Option<ContainerSnapshot>, RuntimeError>;

    async fn stop(&self, name: &str, grace: Duration) -> Result<(), RuntimeError>;

    async fn remove(&self, name: &str, force: bool) -> Result<(), RuntimeError>;

    async fn run(&self, spec: &RunSpec) -> Result<(), RuntimeError>;

    async fn has_image(&self, reference: &str) -> Result<bool, RuntimeError>;
}
