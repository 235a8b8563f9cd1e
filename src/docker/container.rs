use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::runtime::{ContainerRuntime, ContainerSnapshot, RestartPolicy, RunSpec};
use crate::error::{LabError, Result};
use crate::shared::models::LabSpec;

/// Translates lab-level intents into runtime calls. Holds nothing but the
/// runtime handle; every answer comes from a fresh engine query.
#[derive(Clone)]
pub struct ContainerController {
    runtime: Arc<dyn ContainerRuntime>,
}

impl ContainerController {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &dyn ContainerRuntime {
        self.runtime.as_ref()
    }

    pub async fn inspect(&self, name: &str) -> Result<Option<ContainerSnapshot>> {
        Ok(self.runtime.get(name).await?)
    }

    /// A missing container is simply not running.
    pub async fn is_running(&self, name: &str) -> Result<bool> {
        Ok(self
            .runtime
            .get(name)
            .await?
            .map(|s| s.is_running())
            .unwrap_or(false))
    }

    /// Returns whether a stop was actually issued.
    pub async fn stop_if_running(&self, name: &str, grace: Duration) -> Result<bool> {
        if !self.is_running(name).await? {
            return Ok(false);
        }

        match self.runtime.stop(name, grace).await {
            Ok(()) => {
                info!(container = %name, grace_secs = grace.as_secs(), "Stopped lab container");
                Ok(true)
            }
            // Vanished between the inspect and the stop.
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes a stale container. A running container is never touched;
    /// returns whether something was removed.
    pub async fn remove_if_stopped_or_absent(&self, name: &str) -> Result<bool> {
        let Some(snapshot) = self.runtime.get(name).await? else {
            return Ok(false);
        };
        if snapshot.is_running() {
            warn!(container = %name, "Refusing to remove a running container");
            return Ok(false);
        }

        match self.runtime.remove(name, false).await {
            Ok(()) => {
                info!(container = %name, status = %snapshot.status, "Removed stale lab container");
                Ok(true)
            }
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Images are built out of band; a missing one is reported, never pulled.
    pub async fn ensure_image_present(&self, lab: &LabSpec) -> Result<()> {
        if self.runtime.has_image(&lab.image).await? {
            Ok(())
        } else {
            warn!(lab_id = %lab.id, image = %lab.image, "Lab image not found locally");
            Err(LabError::image_not_found(&lab.id, &lab.image))
        }
    }

    /// Creates and starts the lab container. Crashed labs must show up as
    /// stopped, so the engine is told never to restart it.
    pub async fn run(&self, lab: &LabSpec) -> Result<()> {
        let spec = RunSpec {
            name: lab.container_name.clone(),
            image: lab.image.clone(),
            ports: lab.ports.clone(),
            restart_policy: RestartPolicy::Never,
        };
        self.runtime.run(&spec).await?;
        info!(
            lab_id = %lab.id,
            container = %lab.container_name,
            image = %lab.image,
            "Started lab container"
        );
        Ok(())
    }
}
