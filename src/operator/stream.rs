//! Pull-driven event sequences over the orchestration pipeline.
//!
//! Nothing happens until the stream is first polled. The pipeline then runs
//! on the consumer's task and can only get one event ahead of it, so each
//! poll advances it by roughly one step. A stream is consumed once; if it is
//! dropped half way the remaining steps are finished in the background
//! rather than abandoning a half-applied pipeline.

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::{self, BoxStream};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use super::orchestrator::LabOrchestrator;
use super::progress::ProgressSink;
use crate::shared::models::ProgressEvent;

pub type EventStream = BoxStream<'static, ProgressEvent>;

/// Sink half of the stream: hands each event to the consumer and waits for
/// room before the pipeline may continue.
pub struct ChannelSink {
    tx: mpsc::Sender<ProgressEvent>,
}

#[async_trait]
impl ProgressSink for ChannelSink {
    async fn emit(&mut self, event: ProgressEvent) {
        if self.tx.send(event).await.is_err() {
            debug!("Event consumer went away, continuing without it");
        }
    }
}

pub fn activation_events(orchestrator: Arc<LabOrchestrator>, lab_id: String) -> EventStream {
    drive(move |mut sink| async move {
        let _ = orchestrator.activate(&lab_id, &mut sink).await;
    })
}

pub fn deactivation_events(orchestrator: Arc<LabOrchestrator>) -> EventStream {
    drive(move |mut sink| async move {
        let _ = orchestrator.deactivate_all(&mut sink).await;
    })
}

fn drive<F, Fut>(pipeline: F) -> EventStream
where
    F: FnOnce(ChannelSink) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    let driver = Driver {
        pipeline: Some(Box::pin(pipeline(ChannelSink { tx }))),
        polled: false,
        rx,
    };

    Box::pin(stream::unfold(driver, |mut driver| async move {
        let event = driver.next_event().await?;
        Some((event, driver))
    }))
}

struct Driver {
    pipeline: Option<BoxFuture<'static, ()>>,
    polled: bool,
    rx: mpsc::Receiver<ProgressEvent>,
}

enum Turn {
    Event(Option<ProgressEvent>),
    Finished,
}

impl Driver {
    async fn next_event(&mut self) -> Option<ProgressEvent> {
        self.polled = true;
        loop {
            let Some(pipeline) = self.pipeline.as_mut() else {
                return self.rx.recv().await;
            };

            let turn = tokio::select! {
                biased;
                event = self.rx.recv() => Turn::Event(event),
                () = pipeline => Turn::Finished,
            };

            match turn {
                Turn::Event(Some(event)) => return Some(event),
                // sender dropped: the pipeline is done
                Turn::Event(None) | Turn::Finished => self.pipeline = None,
            }
        }
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        if !self.polled {
            return;
        }
        if let Some(pipeline) = self.pipeline.take() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                debug!("Event stream dropped mid-pipeline, finishing in background");
                handle.spawn(pipeline);
            }
        }
    }
}
