use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::docker::ProbeConfig;
use crate::error::{LabError, Result};
use crate::operator::OrchestratorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    Docker,
    Memory,
}

impl FromStr for RuntimeKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "docker" => Ok(RuntimeKind::Docker),
            "memory" => Ok(RuntimeKind::Memory),
            _ => Err(format!("Unknown runtime: {s}. Valid options: docker, memory")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    pub registry_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub runtime: RuntimeKind,
    pub docker_socket: Option<String>,
    pub ready_timeout: Duration,
    pub poll_interval: Duration,
    pub stop_grace: Duration,
    pub log_dir: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from("/labs/labs.json"),
            host: "0.0.0.0".to_string(),
            port: 8000,
            runtime: RuntimeKind::Docker,
            docker_socket: None,
            ready_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(300),
            stop_grace: Duration::from_secs(10),
            log_dir: "./logs".to_string(),
        }
    }
}

fn parse<T: FromStr>(key: &str, value: String) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| LabError::Config(format!("invalid {key}={value:?}: {e}")))
}

impl HubConfig {
    /// Reads `LABHUB_*` variables (after loading `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = lookup("LABHUB_REGISTRY") {
            config.registry_path = PathBuf::from(path);
        }
        if let Some(host) = lookup("LABHUB_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("LABHUB_PORT") {
            config.port = parse("LABHUB_PORT", port)?;
        }
        if let Some(runtime) = lookup("LABHUB_RUNTIME") {
            config.runtime = parse("LABHUB_RUNTIME", runtime)?;
        }
        config.docker_socket = lookup("LABHUB_DOCKER_SOCKET").filter(|s| !s.is_empty());
        if let Some(secs) = lookup("LABHUB_READY_TIMEOUT_SECS") {
            config.ready_timeout = Duration::from_secs(parse("LABHUB_READY_TIMEOUT_SECS", secs)?);
        }
        if let Some(ms) = lookup("LABHUB_POLL_INTERVAL_MS") {
            config.poll_interval = Duration::from_millis(parse("LABHUB_POLL_INTERVAL_MS", ms)?);
        }
        if let Some(secs) = lookup("LABHUB_STOP_GRACE_SECS") {
            config.stop_grace = Duration::from_secs(parse("LABHUB_STOP_GRACE_SECS", secs)?);
        }
        if let Some(dir) = lookup("LABHUB_LOG_DIR") {
            config.log_dir = dir;
        }

        Ok(config)
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            probe: ProbeConfig {
                timeout: self.ready_timeout,
                interval: self.poll_interval,
                confirm_delay: self.poll_interval,
            },
            stop_grace: self.stop_grace,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
