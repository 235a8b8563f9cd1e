use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single container-port to host-port binding, published over TCP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LabPort {
    pub container_port: u16,
    pub host_port: u16,
}

impl LabPort {
    pub fn new(container_port: u16, host_port: u16) -> Self {
        Self {
            container_port,
            host_port,
        }
    }

    /// Docker-style port key, e.g. `5000/tcp`.
    pub fn container_key(&self) -> String {
        format!("{}/tcp", self.container_port)
    }
}

/// Immutable description of one lab, as read from the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LabSpec {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub container_name: String,
    pub image: String,
    #[serde(default)]
    pub ports: Vec<LabPort>,
    pub launch_url: String,
}

/// Catalog entry enriched with the live container state.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LabSummary {
    #[serde(flatten)]
    pub spec: LabSpec,
    pub running: bool,
}
