use async_trait::async_trait;

use crate::shared::models::ProgressEvent;

/// Receiver of pipeline progress. The orchestrator awaits every `emit`
/// before moving to the next step, so events arrive in pipeline order.
#[async_trait]
pub trait ProgressSink: Send {
    async fn emit(&mut self, event: ProgressEvent);
}

/// Invokes a callback inline for each event.
pub struct CallbackSink<F> {
    callback: F,
}

impl<F> CallbackSink<F>
where
    F: FnMut(&ProgressEvent) + Send,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

#[async_trait]
impl<F> ProgressSink for CallbackSink<F>
where
    F: FnMut(&ProgressEvent) + Send,
{
    async fn emit(&mut self, event: ProgressEvent) {
        (self.callback)(&event);
    }
}

/// Discards everything.
pub struct NoProgress;

#[async_trait]
impl ProgressSink for NoProgress {
    async fn emit(&mut self, _event: ProgressEvent) {}
}

#[async_trait]
impl ProgressSink for Vec<ProgressEvent> {
    async fn emit(&mut self, event: ProgressEvent) {
        self.push(event);
    }
}
