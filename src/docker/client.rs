use anyhow::Context;
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::errors::Error as DockerError;
use bollard::models::{
    ContainerStateStatusEnum, HealthStatusEnum, HostConfig, PortBinding,
    RestartPolicy as DockerRestartPolicy, RestartPolicyNameEnum,
};
use bollard::{Docker, API_DEFAULT_VERSION};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use super::runtime::{
    ContainerRuntime, ContainerSnapshot, ContainerStatus, HealthStatus, RestartPolicy,
    RunSpec, RuntimeError,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DockerConfig {
    pub socket_path: Option<String>,
}

impl From<ContainerStateStatusEnum> for ContainerStatus {
    fn from(status: ContainerStateStatusEnum) -> Self {
        match status {
            ContainerStateStatusEnum::CREATED => ContainerStatus::Created,
            ContainerStateStatusEnum::RUNNING => ContainerStatus::Running,
            ContainerStateStatusEnum::PAUSED => ContainerStatus::Paused,
            ContainerStateStatusEnum::RESTARTING => ContainerStatus::Restarting,
            ContainerStateStatusEnum::REMOVING => ContainerStatus::Removing,
            ContainerStateStatusEnum::EXITED => ContainerStatus::Exited,
            ContainerStateStatusEnum::DEAD => ContainerStatus::Dead,
            ContainerStateStatusEnum::EMPTY => ContainerStatus::Unknown,
        }
    }
}

// NONE/EMPTY mean the image declares no health check.
fn health_from(status: HealthStatusEnum) -> Option<HealthStatus> {
    match status {
        HealthStatusEnum::STARTING => Some(HealthStatus::Starting),
        HealthStatusEnum::HEALTHY => Some(HealthStatus::Healthy),
        HealthStatusEnum::UNHEALTHY => Some(HealthStatus::Unhealthy),
        HealthStatusEnum::NONE | HealthStatusEnum::EMPTY => None,
    }
}

fn map_err(name: &str, err: DockerError) -> RuntimeError {
    match err {
        DockerError::DockerResponseServerError {
            status_code: 404, ..
        } => RuntimeError::NotFound(name.to_string()),
        other => RuntimeError::Engine(other.to_string()),
    }
}

/// `ContainerRuntime` backed by the local Docker daemon.
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    pub async fn new(config: DockerConfig) -> anyhow::Result<Self> {
        let docker = if let Some(socket) = config.socket_path {
            Docker::connect_with_socket(&socket, 120, &API_DEFAULT_VERSION)?
        } else {
            Docker::connect_with_socket_defaults()?
        };

        let version = docker
            .version()
            .await
            .context("Failed to connect to Docker daemon")?;

        info!(
            "Connected to Docker daemon version: {}",
            version.version.unwrap_or_default()
        );

        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn get(&self, name: &str) -> Result<Option<ContainerSnapshot>, RuntimeError> {
        let info = match self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
        {
            Ok(info) => info,
            Err(e) => {
                let err = map_err(name, e);
                return if err.is_not_found() { Ok(None) } else { Err(err) };
            }
        };

        let state = info.state.unwrap_or_default();
        let status = state
            .status
            .map(ContainerStatus::from)
            .unwrap_or(ContainerStatus::Unknown);
        let health = state.health.and_then(|h| h.status).and_then(health_from);

        debug!(container = %name, %status, ?health, "Inspected container");
        Ok(Some(ContainerSnapshot { status, health }))
    }

    async fn stop(&self, name: &str, grace: Duration) -> Result<(), RuntimeError> {
        let options = StopContainerOptions {
            t: grace.as_secs() as i64,
        };

        match self.docker.stop_container(name, Some(options)).await {
            Ok(()) => {}
            // 304: already stopped
            Err(DockerError::DockerResponseServerError {
                status_code: 304, ..
            }) => {}
            Err(e) => return Err(map_err(name, e)),
        }

        info!("Stopped container: {}", name);
        Ok(())
    }

    async fn remove(&self, name: &str, force: bool) -> Result<(), RuntimeError> {
        let options = RemoveContainerOptions {
            force,
            ..Default::default()
        };

        self.docker
            .remove_container(name, Some(options))
            .await
            .map_err(|e| map_err(name, e))?;

        info!("Removed container: {}", name);
        Ok(())
    }

    async fn run(&self, spec: &RunSpec) -> Result<(), RuntimeError> {
        let mut exposed_ports = HashMap::new();
        let mut port_bindings = HashMap::new();
        for port in &spec.ports {
            exposed_ports.insert(port.container_key(), HashMap::new());
            port_bindings.insert(
                port.container_key(),
                Some(vec![PortBinding {
                    host_ip: None,
                    host_port: Some(port.host_port.to_string()),
                }]),
            );
        }

        let restart_name = match spec.restart_policy {
            RestartPolicy::Never => RestartPolicyNameEnum::NO,
            RestartPolicy::OnFailure => RestartPolicyNameEnum::ON_FAILURE,
            RestartPolicy::Always => RestartPolicyNameEnum::ALWAYS,
        };

        let host_config = HostConfig {
            port_bindings: Some(port_bindings),
            restart_policy: Some(DockerRestartPolicy {
                name: Some(restart_name),
                maximum_retry_count: None,
            }),
            ..Default::default()
        };

        let config = Config {
            image: Some(spec.image.clone()),
            exposed_ports: Some(exposed_ports),
            host_config: Some(host_config),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: spec.name.clone(),
            platform: None,
        };

        let response = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| {
                RuntimeError::Engine(format!("Failed to create container {}: {}", spec.name, e))
            })?;
        info!("Created container {} with ID: {}", spec.name, response.id);

        self.docker
            .start_container(&spec.name, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| {
                RuntimeError::Engine(format!("Failed to start container {}: {}", spec.name, e))
            })?;
        info!("Started container: {}", spec.name);

        Ok(())
    }

    async fn has_image(&self, reference: &str) -> Result<bool, RuntimeError> {
        match self.docker.inspect_image(reference).await {
            Ok(_) => Ok(true),
            Err(e) => {
                let err = map_err(reference, e);
                if err.is_not_found() {
                    Ok(false)
                } else {
                    Err(err)
                }
            }
        }
    }
}
