use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Step,
    Error,
    Done,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Step => "step",
            EventKind::Error => "error",
            EventKind::Done => "done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, EventKind::Step)
    }
}

/// One ordered unit of status reported while a pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_url: Option<String>,
}

impl ProgressEvent {
    pub fn step(message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Step,
            message: message.into(),
            launch_url: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Error,
            message: message.into(),
            launch_url: None,
        }
    }

    pub fn done(message: impl Into<String>, launch_url: Option<String>) -> Self {
        Self {
            kind: EventKind::Done,
            message: message.into(),
            launch_url,
        }
    }
}
