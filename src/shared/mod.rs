pub mod config;
pub mod logging;
pub mod models;
pub mod state;

pub use config::{HubConfig, RuntimeKind};
pub use models::*;
pub use state::{initialize_app_state, AppState};
