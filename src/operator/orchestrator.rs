use std::time::Duration;
use tracing::{info, warn};

use super::progress::{CallbackSink, NoProgress, ProgressSink};
use crate::docker::{ContainerController, ProbeConfig, ReadinessProbe, ReadyMode};
use crate::error::Result;
use crate::registry::{Catalog, LabRegistry};
use crate::shared::models::{LabSpec, LabSummary, ProgressEvent};

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    pub probe: ProbeConfig,
    /// Graceful stop period before the engine kills a container.
    pub stop_grace: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            probe: ProbeConfig::default(),
            stop_grace: Duration::from_secs(10),
        }
    }
}

/// Keeps at most one lab running by sequencing stop-others, image check,
/// stale cleanup, start and readiness. Every step reports through a
/// [`ProgressSink`]; failures abort the pipeline without rolling back what
/// already happened.
pub struct LabOrchestrator {
    registry: LabRegistry,
    controller: ContainerController,
    config: OrchestratorConfig,
}

impl LabOrchestrator {
    pub fn new(
        registry: LabRegistry,
        controller: ContainerController,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            registry,
            controller,
            config,
        }
    }

    pub fn catalog(&self) -> Result<Catalog> {
        self.registry.load()
    }

    /// Makes `lab_id` the only running lab and waits until it is ready.
    /// Ends with exactly one terminal `done` or `error` event.
    pub async fn activate(&self, lab_id: &str, sink: &mut dyn ProgressSink) -> Result<LabSpec> {
        match self.run_activation(lab_id, sink).await {
            Ok((lab, mode)) => {
                info!(lab_id = %lab.id, %mode, launch_url = %lab.launch_url, "Lab is ready");
                sink.emit(ProgressEvent::done(
                    format!("{} is ready ({mode}).", lab.title),
                    Some(lab.launch_url.clone()),
                ))
                .await;
                Ok(lab)
            }
            Err(e) => {
                warn!(lab_id = %lab_id, error = %e, "Lab activation failed");
                sink.emit(ProgressEvent::error(format!(
                    "Failed to start lab '{lab_id}': {e}"
                )))
                .await;
                Err(e)
            }
        }
    }

    /// Callback flavour of [`activate`](Self::activate).
    pub async fn activate_with<F>(&self, lab_id: &str, on_event: Option<F>) -> Result<LabSpec>
    where
        F: FnMut(&ProgressEvent) + Send,
    {
        match on_event {
            Some(callback) => self.activate(lab_id, &mut CallbackSink::new(callback)).await,
            None => self.activate(lab_id, &mut NoProgress).await,
        }
    }

    async fn run_activation(
        &self,
        lab_id: &str,
        sink: &mut dyn ProgressSink,
    ) -> Result<(LabSpec, ReadyMode)> {
        let catalog = self.registry.load()?;
        let lab = catalog.get(lab_id)?.clone();
        let name = lab.container_name.as_str();
        info!(lab_id = %lab.id, container = %name, "Activating lab");

        sink.emit(ProgressEvent::step("Stopping any running labs…")).await;
        // The target is left alone here; if it is already up it gets reused.
        self.stop_labs(&catalog, Some(&lab.id), sink).await?;

        sink.emit(ProgressEvent::step("Ensuring lab image is available…")).await;
        self.controller.ensure_image_present(&lab).await?;

        sink.emit(ProgressEvent::step("Preparing container…")).await;
        if self.controller.is_running(name).await? {
            info!(container = %name, "Lab container already running, reusing it");
            sink.emit(ProgressEvent::step(format!("{name} is already running."))).await;
        } else {
            if self.controller.remove_if_stopped_or_absent(name).await? {
                sink.emit(ProgressEvent::step("Removed old container.")).await;
            }
            sink.emit(ProgressEvent::step("Starting container…")).await;
            self.controller.run(&lab).await?;
        }

        sink.emit(ProgressEvent::step("Container started. Waiting for readiness…")).await;
        let mode = ReadinessProbe::new(self.controller.runtime(), self.config.probe)
            .wait_ready(name)
            .await?;

        Ok((lab, mode))
    }

    /// Stops every running lab. Safe to repeat; returns the ids stopped.
    pub async fn deactivate_all(&self, sink: &mut dyn ProgressSink) -> Result<Vec<String>> {
        match self.run_deactivation(sink).await {
            Ok(stopped) => {
                let message = if stopped.is_empty() {
                    "No running labs.".to_string()
                } else {
                    format!("Stopped {} lab(s).", stopped.len())
                };
                info!(stopped = stopped.len(), "Deactivated all labs");
                sink.emit(ProgressEvent::done(message, None)).await;
                Ok(stopped)
            }
            Err(e) => {
                warn!(error = %e, "Stopping labs failed");
                sink.emit(ProgressEvent::error(format!("Failed to stop labs: {e}")))
                    .await;
                Err(e)
            }
        }
    }

    pub async fn deactivate_all_with<F>(&self, on_event: Option<F>) -> Result<Vec<String>>
    where
        F: FnMut(&ProgressEvent) + Send,
    {
        match on_event {
            Some(callback) => self.deactivate_all(&mut CallbackSink::new(callback)).await,
            None => self.deactivate_all(&mut NoProgress).await,
        }
    }

    async fn run_deactivation(&self, sink: &mut dyn ProgressSink) -> Result<Vec<String>> {
        let catalog = self.registry.load()?;
        self.stop_labs(&catalog, None, sink).await
    }

    async fn stop_labs(
        &self,
        catalog: &Catalog,
        skip: Option<&str>,
        sink: &mut dyn ProgressSink,
    ) -> Result<Vec<String>> {
        let mut stopped = Vec::new();
        for lab in catalog {
            if skip == Some(lab.id.as_str()) {
                continue;
            }
            if !self.controller.is_running(&lab.container_name).await? {
                continue;
            }
            sink.emit(ProgressEvent::step(format!("Stopping {}…", lab.container_name)))
                .await;
            if self
                .controller
                .stop_if_running(&lab.container_name, self.config.stop_grace)
                .await?
            {
                stopped.push(lab.id.clone());
            }
        }
        Ok(stopped)
    }

    /// First lab, in registry order, whose container is running.
    pub async fn running_lab_id(&self) -> Result<Option<String>> {
        let catalog = self.registry.load()?;
        self.running_lab_in(&catalog).await
    }

    pub async fn running_lab_in(&self, catalog: &Catalog) -> Result<Option<String>> {
        for lab in catalog {
            if self.controller.is_running(&lab.container_name).await? {
                return Ok(Some(lab.id.clone()));
            }
        }
        Ok(None)
    }

    pub async fn list_labs(&self) -> Result<Vec<LabSummary>> {
        let catalog = self.registry.load()?;
        let mut labs = Vec::with_capacity(catalog.len());
        for lab in catalog.into_labs() {
            let running = self.controller.is_running(&lab.container_name).await?;
            labs.push(LabSummary { spec: lab, running });
        }
        Ok(labs)
    }
}
