#![allow(dead_code)]

use std::sync::Arc;

use labhub::docker::{ContainerController, InMemoryRuntime};
use labhub::operator::{LabOrchestrator, OrchestratorConfig};
use labhub::registry::{Catalog, LabRegistry};
use labhub::shared::models::{LabPort, LabSpec};

pub fn lab(n: u16) -> LabSpec {
    LabSpec {
        id: format!("lab{n}"),
        title: format!("Lab {n}"),
        description: String::new(),
        container_name: format!("lab{n}-web"),
        image: format!("labs/lab{n}:latest"),
        ports: vec![LabPort::new(5000, 5000 + n)],
        launch_url: format!("http://localhost:{}", 5000 + n),
    }
}

pub fn catalog() -> Catalog {
    Catalog::new(vec![lab(1), lab(2), lab(3)]).expect("valid catalog")
}

/// Runtime with every catalog image already built.
pub fn runtime() -> Arc<InMemoryRuntime> {
    let runtime = InMemoryRuntime::new();
    for lab in &catalog() {
        runtime.add_image(lab.image.clone());
    }
    Arc::new(runtime)
}

pub fn orchestrator(runtime: &Arc<InMemoryRuntime>) -> Arc<LabOrchestrator> {
    orchestrator_with(runtime, catalog())
}

pub fn orchestrator_with(runtime: &Arc<InMemoryRuntime>, catalog: Catalog) -> Arc<LabOrchestrator> {
    Arc::new(LabOrchestrator::new(
        LabRegistry::from_catalog(catalog),
        ContainerController::new(runtime.clone()),
        OrchestratorConfig::default(),
    ))
}
