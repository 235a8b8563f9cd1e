pub mod event;
pub mod job;
pub mod lab;

pub use event::{EventKind, ProgressEvent};
pub use job::{HubStatus, JobRecord, StartJob, StartState, StopJob, StopState, Submission};
pub use lab::{LabPort, LabSpec, LabSummary};
