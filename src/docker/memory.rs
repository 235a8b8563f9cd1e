use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;
use tracing::debug;

use super::runtime::{
    ContainerRuntime, ContainerSnapshot, ContainerStatus, RunSpec, RuntimeError,
};

/// One call made against the runtime, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    Get(String),
    Stop(String),
    Remove { name: String, force: bool },
    Run(RunSpec),
    HasImage(String),
}

impl RuntimeCall {
    /// Calls that change engine state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            RuntimeCall::Stop(_) | RuntimeCall::Remove { .. } | RuntimeCall::Run(_)
        )
    }
}

/// Calls kept for inspection; older entries are dropped first.
pub const JOURNAL_CAPACITY: usize = 1024;

#[derive(Debug)]
struct Container {
    image: String,
    current: ContainerSnapshot,
    script: VecDeque<ContainerSnapshot>,
}

#[derive(Debug, Default)]
struct Engine {
    images: HashSet<String>,
    containers: HashMap<String, Container>,
    pending_scripts: HashMap<String, Vec<ContainerSnapshot>>,
    run_failures: HashMap<String, String>,
    gets: HashMap<String, usize>,
    journal: VecDeque<RuntimeCall>,
}

impl Engine {
    fn record(&mut self, call: RuntimeCall) {
        if self.journal.len() == JOURNAL_CAPACITY {
            self.journal.pop_front();
        }
        self.journal.push_back(call);
    }
}

/// Deterministic in-process container engine.
///
/// Containers started through [`ContainerRuntime::run`] come up `running`
/// with no health check unless an observation script was registered for
/// their name, in which case each `get` pops the next scripted snapshot
/// (the last one sticks). A scripted `absent` observation makes `get`
/// report the container as missing for that poll only. The call journal
/// keeps the most recent [`JOURNAL_CAPACITY`] entries.
#[derive(Debug, Default)]
pub struct InMemoryRuntime {
    engine: Mutex<Engine>,
}

impl InMemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(self, image: impl Into<String>) -> Self {
        self.add_image(image);
        self
    }

    pub fn add_image(&self, image: impl Into<String>) {
        self.engine.lock().images.insert(image.into());
    }

    /// Seeds an existing container, as if something created it earlier.
    pub fn add_container(
        &self,
        name: impl Into<String>,
        image: impl Into<String>,
        snapshot: ContainerSnapshot,
    ) {
        self.engine.lock().containers.insert(
            name.into(),
            Container {
                image: image.into(),
                current: snapshot,
                script: VecDeque::new(),
            },
        );
    }

    /// Observations `get` returns for `name` once it is next started.
    pub fn script_after_run(&self, name: impl Into<String>, observations: Vec<ContainerSnapshot>) {
        self.engine
            .lock()
            .pending_scripts
            .insert(name.into(), observations);
    }

    /// Observations `get` returns for an already existing container.
    pub fn script(&self, name: &str, observations: Vec<ContainerSnapshot>) {
        if let Some(container) = self.engine.lock().containers.get_mut(name) {
            container.script = observations.into();
        }
    }

    pub fn fail_run(&self, name: impl Into<String>, message: impl Into<String>) {
        self.engine
            .lock()
            .run_failures
            .insert(name.into(), message.into());
    }

    /// Current state without recording a call or consuming a script step.
    pub fn peek(&self, name: &str) -> Option<ContainerSnapshot> {
        self.engine.lock().containers.get(name).map(|c| c.current)
    }

    pub fn image_of(&self, name: &str) -> Option<String> {
        self.engine.lock().containers.get(name).map(|c| c.image.clone())
    }

    pub fn running(&self) -> Vec<String> {
        let engine = self.engine.lock();
        let mut names: Vec<String> = engine
            .containers
            .iter()
            .filter(|(_, c)| c.current.is_running())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.engine.lock().journal.iter().cloned().collect()
    }

    pub fn mutations(&self) -> Vec<RuntimeCall> {
        self.engine
            .lock()
            .journal
            .iter()
            .filter(|call| call.is_mutation())
            .cloned()
            .collect()
    }

    pub fn get_count(&self, name: &str) -> usize {
        self.engine.lock().gets.get(name).copied().unwrap_or(0)
    }

    pub fn clear_calls(&self) {
        let mut engine = self.engine.lock();
        engine.journal.clear();
        engine.gets.clear();
    }
}

#[async_trait]
impl ContainerRuntime for InMemoryRuntime {
    async fn get(&self, name: &str) -> Result<Option<ContainerSnapshot>, RuntimeError> {
        let mut engine = self.engine.lock();
        engine.record(RuntimeCall::Get(name.to_string()));
        *engine.gets.entry(name.to_string()).or_insert(0) += 1;

        let Some(container) = engine.containers.get_mut(name) else {
            return Ok(None);
        };
        if let Some(next) = container.script.pop_front() {
            if next.status == ContainerStatus::Absent {
                return Ok(None);
            }
            container.current = next;
        }
        Ok(Some(container.current))
    }

    async fn stop(&self, name: &str, grace: Duration) -> Result<(), RuntimeError> {
        let mut engine = self.engine.lock();
        engine.record(RuntimeCall::Stop(name.to_string()));

        let container = engine
            .containers
            .get_mut(name)
            .ok_or_else(|| RuntimeError::NotFound(name.to_string()))?;
        container.current = ContainerSnapshot::new(ContainerStatus::Exited);
        container.script.clear();
        debug!(container = %name, grace_secs = grace.as_secs(), "Stopped in-memory container");
        Ok(())
    }

    async fn remove(&self, name: &str, force: bool) -> Result<(), RuntimeError> {
        let mut engine = self.engine.lock();
        engine.record(RuntimeCall::Remove {
            name: name.to_string(),
            force,
        });

        let running = engine
            .containers
            .get(name)
            .map(|c| c.current.is_running())
            .ok_or_else(|| RuntimeError::NotFound(name.to_string()))?;
        if running && !force {
            return Err(RuntimeError::Engine(format!(
                "You cannot remove a running container {name}. \
                 Stop the container before attempting removal or force remove"
            )));
        }
        engine.containers.remove(name);
        Ok(())
    }

    async fn run(&self, spec: &RunSpec) -> Result<(), RuntimeError> {
        let mut engine = self.engine.lock();
        engine.record(RuntimeCall::Run(spec.clone()));

        if let Some(message) = engine.run_failures.get(&spec.name) {
            return Err(RuntimeError::Engine(message.clone()));
        }
        if engine.containers.contains_key(&spec.name) {
            return Err(RuntimeError::Engine(format!(
                "Conflict. The container name \"/{}\" is already in use",
                spec.name
            )));
        }
        if !engine.images.contains(&spec.image) {
            return Err(RuntimeError::Engine(format!(
                "No such image: {}",
                spec.image
            )));
        }

        let script: VecDeque<ContainerSnapshot> = engine
            .pending_scripts
            .remove(&spec.name)
            .unwrap_or_default()
            .into();
        let current = if script.is_empty() {
            ContainerSnapshot::new(ContainerStatus::Running)
        } else {
            ContainerSnapshot::new(ContainerStatus::Created)
        };
        engine.containers.insert(
            spec.name.clone(),
            Container {
                image: spec.image.clone(),
                current,
                script,
            },
        );
        Ok(())
    }

    async fn has_image(&self, reference: &str) -> Result<bool, RuntimeError> {
        let mut engine = self.engine.lock();
        engine.record(RuntimeCall::HasImage(reference.to_string()));
        Ok(engine.images.contains(reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::{HealthStatus, RestartPolicy};

    fn spec(name: &str, image: &str) -> RunSpec {
        RunSpec {
            name: name.to_string(),
            image: image.to_string(),
            ports: Vec::new(),
            restart_policy: RestartPolicy::Never,
        }
    }

    #[tokio::test]
    async fn run_requires_local_image() {
        let runtime = InMemoryRuntime::new();
        let err = runtime.run(&spec("lab1", "missing:latest")).await.unwrap_err();
        assert!(err.to_string().contains("No such image"));
        assert!(runtime.peek("lab1").is_none());
    }

    #[tokio::test]
    async fn scripted_observations_are_consumed_in_order() {
        let runtime = InMemoryRuntime::new().with_image("img");
        runtime.script_after_run(
            "lab1",
            vec![
                ContainerSnapshot::with_health(ContainerStatus::Running, HealthStatus::Starting),
                ContainerSnapshot::new(ContainerStatus::Absent),
                ContainerSnapshot::with_health(ContainerStatus::Running, HealthStatus::Healthy),
            ],
        );
        runtime.run(&spec("lab1", "img")).await.unwrap();

        let first = runtime.get("lab1").await.unwrap().unwrap();
        assert_eq!(first.health, Some(HealthStatus::Starting));
        assert!(runtime.get("lab1").await.unwrap().is_none());
        let third = runtime.get("lab1").await.unwrap().unwrap();
        assert_eq!(third.health, Some(HealthStatus::Healthy));
        // last observation sticks
        assert_eq!(runtime.get("lab1").await.unwrap(), Some(third));
        assert_eq!(runtime.get_count("lab1"), 4);
    }

    #[tokio::test]
    async fn remove_refuses_running_container_without_force() {
        let runtime = InMemoryRuntime::new();
        runtime.add_container("lab1", "img", ContainerSnapshot::new(ContainerStatus::Running));

        assert!(runtime.remove("lab1", false).await.is_err());
        runtime.remove("lab1", true).await.unwrap();
        assert!(runtime.peek("lab1").is_none());
        assert!(runtime.remove("lab1", true).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn journal_keeps_only_recent_calls() {
        let runtime = InMemoryRuntime::new();
        runtime.add_container("lab1", "img", ContainerSnapshot::new(ContainerStatus::Running));

        for _ in 0..JOURNAL_CAPACITY {
            runtime.get("lab1").await.unwrap();
        }
        runtime.stop("lab1", Duration::from_secs(1)).await.unwrap();

        let calls = runtime.calls();
        assert_eq!(calls.len(), JOURNAL_CAPACITY);
        assert_eq!(calls.last(), Some(&RuntimeCall::Stop("lab1".to_string())));
        assert_eq!(runtime.mutations().len(), 1);
        assert_eq!(runtime.get_count("lab1"), JOURNAL_CAPACITY);
    }
}
