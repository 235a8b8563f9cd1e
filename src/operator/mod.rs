mod jobs;
mod orchestrator;
mod progress;
mod stream;

pub use jobs::{JobKey, JobSink, JobStore, LabJobs};
pub use orchestrator::{LabOrchestrator, OrchestratorConfig};
pub use progress::{CallbackSink, NoProgress, ProgressSink};
pub use stream::{activation_events, deactivation_events, ChannelSink, EventStream};
