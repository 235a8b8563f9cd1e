use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::orchestrator::LabOrchestrator;
use super::progress::ProgressSink;
use crate::error::Result;
use crate::shared::models::{
    EventKind, HubStatus, JobRecord, ProgressEvent, StartJob, StartState, StopJob, StopState,
    Submission,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobKey {
    Start(String),
    Stop,
}

#[derive(Debug, Default)]
struct JobTable {
    starts: BTreeMap<String, StartJob>,
    stop: Option<StopJob>,
}

/// Latest start job per lab plus the single stop job. The lock is held
/// only while a record is read or written, never across runtime calls.
#[derive(Debug, Default)]
pub struct JobStore {
    table: Mutex<JobTable>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_job(&self, lab_id: &str) -> Option<StartJob> {
        self.table.lock().starts.get(lab_id).cloned()
    }

    pub fn start_jobs(&self) -> BTreeMap<String, StartJob> {
        self.table.lock().starts.clone()
    }

    pub fn stop_job(&self) -> Option<StopJob> {
        self.table.lock().stop.clone()
    }

    /// Records a new start job unless one for `lab_id` is still starting.
    pub fn begin_start(&self, lab_id: &str) -> Submission<StartState> {
        let mut table = self.table.lock();
        if let Some(existing) = table.starts.get(lab_id) {
            if existing.state == StartState::Starting {
                return Submission {
                    accepted: false,
                    record: existing.clone(),
                };
            }
        }

        let record = JobRecord::new(StartState::Starting, "Queued…");
        table.starts.insert(lab_id.to_string(), record.clone());
        Submission {
            accepted: true,
            record,
        }
    }

    /// Records a new stop job unless the previous one is still stopping.
    pub fn begin_stop(&self) -> Submission<StopState> {
        let mut table = self.table.lock();
        if let Some(existing) = &table.stop {
            if existing.state == StopState::Stopping {
                return Submission {
                    accepted: false,
                    record: existing.clone(),
                };
            }
        }

        let record = JobRecord::new(StopState::Stopping, "Queued…");
        table.stop = Some(record.clone());
        Submission {
            accepted: true,
            record,
        }
    }

    pub fn set_start_state(
        &self,
        lab_id: &str,
        state: StartState,
        message: impl Into<String>,
        launch_url: Option<String>,
    ) {
        let mut table = self.table.lock();
        let record = table
            .starts
            .entry(lab_id.to_string())
            .or_insert_with(|| JobRecord::new(state, ""));
        record.state = state;
        record.message = message.into();
        if launch_url.is_some() {
            record.launch_url = launch_url;
        }
    }

    pub fn set_stop_state(&self, state: StopState, message: impl Into<String>) {
        let mut table = self.table.lock();
        let record = table.stop.get_or_insert_with(|| JobRecord::new(state, ""));
        record.state = state;
        record.message = message.into();
    }

    /// Folds one progress event into the record for `key`.
    pub fn apply(&self, key: &JobKey, event: &ProgressEvent) {
        match key {
            JobKey::Start(lab_id) => {
                let state = match event.kind {
                    EventKind::Step => StartState::Starting,
                    EventKind::Error => StartState::Error,
                    EventKind::Done => StartState::Running,
                };
                self.set_start_state(
                    lab_id,
                    state,
                    event.message.clone(),
                    event.launch_url.clone(),
                );
            }
            JobKey::Stop => {
                let state = match event.kind {
                    EventKind::Step => StopState::Stopping,
                    EventKind::Error => StopState::Error,
                    EventKind::Done => StopState::Stopped,
                };
                self.set_stop_state(state, event.message.clone());
            }
        }
    }
}

/// Sink that writes progress into the shared job table.
pub struct JobSink {
    store: Arc<JobStore>,
    key: JobKey,
}

impl JobSink {
    pub fn new(store: Arc<JobStore>, key: JobKey) -> Self {
        Self { store, key }
    }
}

#[async_trait]
impl ProgressSink for JobSink {
    async fn emit(&mut self, event: ProgressEvent) {
        self.store.apply(&self.key, &event);
    }
}

/// Runs pipelines on background tasks and answers status polls.
///
/// Jobs for different labs may overlap; only a repeated submission for the
/// same key while it is still in flight is collapsed into the existing job.
#[derive(Clone)]
pub struct LabJobs {
    orchestrator: Arc<LabOrchestrator>,
    store: Arc<JobStore>,
}

impl LabJobs {
    pub fn new(orchestrator: Arc<LabOrchestrator>, store: Arc<JobStore>) -> Self {
        Self {
            orchestrator,
            store,
        }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Unknown labs are rejected before anything is recorded, so the job
    /// table only ever holds registered lab ids.
    pub fn submit_start(&self, lab_id: &str) -> Result<Submission<StartState>> {
        self.orchestrator.catalog()?.get(lab_id)?;

        let submission = self.store.begin_start(lab_id);
        if !submission.accepted {
            info!(lab_id = %lab_id, "Start already in progress, not queuing another");
            return Ok(submission);
        }

        let orchestrator = self.orchestrator.clone();
        let mut sink = JobSink::new(self.store.clone(), JobKey::Start(lab_id.to_string()));
        let lab_id = lab_id.to_string();
        info!(lab_id = %lab_id, "Accepted start job");
        tokio::spawn(async move {
            if let Err(e) = orchestrator.activate(&lab_id, &mut sink).await {
                warn!(lab_id = %lab_id, error = %e, "Start job failed");
            }
        });
        Ok(submission)
    }

    pub fn submit_stop(&self) -> Submission<StopState> {
        let submission = self.store.begin_stop();
        if !submission.accepted {
            info!("Stop already in progress, not queuing another");
            return submission;
        }

        let orchestrator = self.orchestrator.clone();
        let mut sink = JobSink::new(self.store.clone(), JobKey::Stop);
        info!("Accepted stop job");
        tokio::spawn(async move {
            if let Err(e) = orchestrator.deactivate_all(&mut sink).await {
                warn!(error = %e, "Stop job failed");
            }
        });
        submission
    }

    /// Fresh view of the catalog, the engine and the job table.
    pub async fn status(&self) -> Result<HubStatus> {
        let catalog = self.orchestrator.catalog()?;
        let running_lab_id = self.orchestrator.running_lab_in(&catalog).await?;
        let launch_urls = catalog
            .iter()
            .map(|lab| (lab.id.clone(), lab.launch_url.clone()))
            .collect();

        Ok(HubStatus {
            running_lab_id,
            start_jobs: self.store.start_jobs(),
            stop_job: self.store.stop_job(),
            launch_urls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_start_suppresses_duplicates_while_starting() {
        let store = JobStore::new();
        let first = store.begin_start("lab1");
        assert!(first.accepted);

        let second = store.begin_start("lab1");
        assert!(!second.accepted);
        assert_eq!(second.record, first.record);

        // a different lab is independent
        assert!(store.begin_start("lab2").accepted);
    }

    #[test]
    fn finished_job_is_superseded_by_next_request() {
        let store = JobStore::new();
        store.begin_start("lab1");
        store.set_start_state("lab1", StartState::Error, "boom", None);

        let next = store.begin_start("lab1");
        assert!(next.accepted);
        assert_eq!(store.start_job("lab1").unwrap().state, StartState::Starting);
    }

    #[test]
    fn events_map_onto_job_states() {
        let store = JobStore::new();
        let key = JobKey::Start("lab1".to_string());
        store.begin_start("lab1");

        store.apply(&key, &ProgressEvent::step("Starting container…"));
        let record = store.start_job("lab1").unwrap();
        assert_eq!(record.state, StartState::Starting);
        assert_eq!(record.message, "Starting container…");

        store.apply(&key, &ProgressEvent::done("ready", Some("http://localhost:5001".into())));
        let record = store.start_job("lab1").unwrap();
        assert_eq!(record.state, StartState::Running);
        assert_eq!(record.launch_url.as_deref(), Some("http://localhost:5001"));

        store.begin_stop();
        store.apply(&JobKey::Stop, &ProgressEvent::done("No running labs.", None));
        assert_eq!(store.stop_job().unwrap().state, StopState::Stopped);
    }

    #[test]
    fn started_at_survives_updates() {
        let store = JobStore::new();
        let submitted = store.begin_stop().record.started_at;
        store.set_stop_state(StopState::Stopping, "Stopping lab1…");
        assert_eq!(store.stop_job().unwrap().started_at, submitted);
    }
}
