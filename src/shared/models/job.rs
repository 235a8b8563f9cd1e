use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StartState {
    Starting,
    Running,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StopState {
    Stopping,
    Stopped,
    Error,
}

/// In-memory record of one background start/stop job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct JobRecord<S> {
    pub state: S,
    pub message: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_url: Option<String>,
}

impl<S> JobRecord<S> {
    pub fn new(state: S, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
            started_at: Utc::now(),
            launch_url: None,
        }
    }
}

pub type StartJob = JobRecord<StartState>;
pub type StopJob = JobRecord<StopState>;

/// Answer to a job submission. `accepted` is false when a job for the
/// same key was already in flight and `record` is that job's state.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Submission<S> {
    pub accepted: bool,
    #[schema(inline)]
    pub record: JobRecord<S>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HubStatus {
    pub running_lab_id: Option<String>,
    #[schema(inline)]
    pub start_jobs: BTreeMap<String, JobRecord<StartState>>,
    #[schema(inline)]
    pub stop_job: Option<JobRecord<StopState>>,
    pub launch_urls: BTreeMap<String, String>,
}
