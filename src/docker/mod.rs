mod client;
mod container;
mod memory;
mod readiness;
mod runtime;

pub use client::{DockerConfig, DockerRuntime};
pub use container::ContainerController;
pub use memory::{InMemoryRuntime, RuntimeCall};
pub use readiness::{ProbeConfig, ReadinessProbe, ReadyMode};
pub use runtime::{
    ContainerRuntime, ContainerSnapshot, ContainerStatus, HealthStatus, RestartPolicy, RunSpec,
    RuntimeError,
};
