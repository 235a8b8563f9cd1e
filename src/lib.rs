//! Lab hub: keeps at most one containerised lab environment running on a
//! host and exposes start/stop/status over a CLI and a REST API.

pub mod docker;
pub mod error;
pub mod operator;
pub mod registry;
pub mod server;
pub mod shared;

pub use error::{LabError, Result};
pub use operator::{LabJobs, LabOrchestrator};
pub use registry::{Catalog, LabRegistry};
