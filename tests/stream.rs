mod common;

use futures::StreamExt;
use std::time::Duration;

use labhub::docker::{ContainerSnapshot, ContainerStatus};
use labhub::operator::{activation_events, deactivation_events};
use labhub::shared::models::{EventKind, ProgressEvent};

use common::{orchestrator, runtime};

#[tokio::test(start_paused = true)]
async fn streamed_activation_matches_callback_delivery() {
    let runtime = runtime();
    runtime.add_container(
        "lab1-web",
        "labs/lab1:latest",
        ContainerSnapshot::new(ContainerStatus::Running),
    );
    let orchestrator = orchestrator(&runtime);

    let streamed: Vec<ProgressEvent> = activation_events(orchestrator.clone(), "lab2".to_string())
        .collect()
        .await;

    assert_eq!(streamed.last().unwrap().kind, EventKind::Done);
    assert_eq!(streamed.iter().filter(|e| e.kind.is_terminal()).count(), 1);
    assert_eq!(runtime.running(), vec!["lab2-web".to_string()]);

    // the same pipeline again, now with lab2 already up, via the sink API
    let mut direct: Vec<ProgressEvent> = Vec::new();
    orchestrator.activate("lab2", &mut direct).await.unwrap();
    let streamed_again: Vec<ProgressEvent> =
        activation_events(orchestrator.clone(), "lab2".to_string())
            .collect()
            .await;
    assert_eq!(streamed_again, direct);
}

#[tokio::test(start_paused = true)]
async fn nothing_happens_until_first_poll() {
    let runtime = runtime();
    let orchestrator = orchestrator(&runtime);

    let mut events = deactivation_events(orchestrator);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(runtime.calls().is_empty());

    let only = events.next().await.unwrap();
    assert_eq!(only.kind, EventKind::Done);
    assert_eq!(only.message, "No running labs.");
    assert!(events.next().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn dropped_stream_still_finishes_the_pipeline() {
    let runtime = runtime();
    let orchestrator = orchestrator(&runtime);

    let mut events = activation_events(orchestrator, "lab3".to_string());
    let first = events.next().await.unwrap();
    assert_eq!(first.message, "Stopping any running labs…");
    drop(events);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(runtime.running(), vec!["lab3-web".to_string()]);
}

#[tokio::test]
async fn unknown_lab_stream_is_a_single_error() {
    let runtime = runtime();
    let events: Vec<ProgressEvent> = activation_events(orchestrator(&runtime), "nope".to_string())
        .collect()
        .await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::Error);
    assert!(events[0].message.contains("nope"));
}
