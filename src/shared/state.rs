use anyhow::Context;
use std::sync::Arc;
use tracing::info;

use super::config::{HubConfig, RuntimeKind};
use crate::docker::{
    ContainerController, ContainerRuntime, DockerConfig, DockerRuntime, InMemoryRuntime,
};
use crate::operator::{JobStore, LabJobs, LabOrchestrator};
use crate::registry::LabRegistry;

/// Shared handles for the HTTP layer. One instance per process.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<LabOrchestrator>,
    pub jobs: LabJobs,
}

impl AppState {
    pub fn new(
        registry: LabRegistry,
        runtime: Arc<dyn ContainerRuntime>,
        config: &HubConfig,
    ) -> Self {
        let orchestrator = Arc::new(LabOrchestrator::new(
            registry,
            ContainerController::new(runtime),
            config.orchestrator_config(),
        ));
        let jobs = LabJobs::new(orchestrator.clone(), Arc::new(JobStore::new()));
        Self { orchestrator, jobs }
    }
}

pub async fn connect_runtime(
    config: &HubConfig,
    registry: &LabRegistry,
) -> anyhow::Result<Arc<dyn ContainerRuntime>> {
    match config.runtime {
        RuntimeKind::Docker => {
            let runtime = DockerRuntime::new(DockerConfig {
                socket_path: config.docker_socket.clone(),
            })
            .await?;
            Ok(Arc::new(runtime))
        }
        RuntimeKind::Memory => {
            // Demo mode: every registered image counts as built.
            let runtime = InMemoryRuntime::new();
            let catalog = registry.load().context("Failed to load lab registry")?;
            for lab in &catalog {
                runtime.add_image(lab.image.clone());
            }
            info!(labs = catalog.len(), "Using in-memory container runtime");
            Ok(Arc::new(runtime))
        }
    }
}

pub async fn initialize_app_state(config: &HubConfig) -> anyhow::Result<AppState> {
    let registry = LabRegistry::from_file(&config.registry_path);
    let runtime = connect_runtime(config, &registry).await?;
    Ok(AppState::new(registry, runtime, config))
}
