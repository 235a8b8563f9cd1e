use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

use super::runtime::{ContainerRuntime, ContainerSnapshot, ContainerStatus, HealthStatus};
use crate::error::{LabError, Result};

/// How readiness was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyMode {
    /// No health check declared; the process is up.
    Running,
    /// The container's own health check passed.
    Healthy,
}

impl fmt::Display for ReadyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadyMode::Running => f.write_str("running"),
            ReadyMode::Healthy => f.write_str("healthy"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProbeConfig {
    pub timeout: Duration,
    pub interval: Duration,
    pub confirm_delay: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            interval: Duration::from_millis(300),
            confirm_delay: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    WaitingRunning,
    WaitingHealthy,
}

#[derive(Debug)]
struct Observations {
    last: ContainerSnapshot,
    last_health: Option<HealthStatus>,
}

impl Observations {
    fn record(&mut self, observed: Option<ContainerSnapshot>) -> ContainerSnapshot {
        let snapshot = observed.unwrap_or(ContainerSnapshot::new(ContainerStatus::Absent));
        if snapshot.health.is_some() {
            self.last_health = snapshot.health;
        }
        self.last = snapshot;
        snapshot
    }

    fn health_declared(&self) -> bool {
        self.last_health.is_some()
    }
}

/// Polls one container until it can serve traffic or the deadline passes.
pub struct ReadinessProbe<'a> {
    runtime: &'a dyn ContainerRuntime,
    config: ProbeConfig,
}

impl<'a> ReadinessProbe<'a> {
    pub fn new(runtime: &'a dyn ContainerRuntime, config: ProbeConfig) -> Self {
        Self { runtime, config }
    }

    /// Once a health check has been seen, only `running` + `healthy`
    /// counts. Without one, a running observation confirmed by a second
    /// look after `confirm_delay` is enough. A container that disappears
    /// mid-probe is treated as not running yet.
    pub async fn wait_ready(&self, name: &str) -> Result<ReadyMode> {
        let deadline = Instant::now() + self.config.timeout;
        let mut seen = Observations {
            last: ContainerSnapshot::new(ContainerStatus::Absent),
            last_health: None,
        };
        let mut phase = Phase::WaitingRunning;

        loop {
            let snapshot = seen.record(self.runtime.get(name).await?);

            if snapshot.is_running() {
                if seen.health_declared() {
                    if snapshot.health == Some(HealthStatus::Healthy) {
                        debug!(container = %name, "Container reported healthy");
                        return Ok(ReadyMode::Healthy);
                    }
                    if phase != Phase::WaitingHealthy {
                        debug!(
                            container = %name,
                            health = ?snapshot.health,
                            "Running, waiting for health check"
                        );
                        phase = Phase::WaitingHealthy;
                    }
                } else {
                    sleep(self.config.confirm_delay).await;
                    let confirmed = seen.record(self.runtime.get(name).await?);
                    if confirmed.is_running() && !seen.health_declared() {
                        debug!(container = %name, "Container running, no health check declared");
                        return Ok(ReadyMode::Running);
                    }
                }
            }

            if Instant::now() >= deadline {
                return Err(LabError::ReadinessTimeout {
                    container: name.to_string(),
                    waited_secs: self.config.timeout.as_secs(),
                    last_status: seen.last.status,
                    last_health: seen.last_health,
                });
            }
            sleep(self.config.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::{InMemoryRuntime, RestartPolicy, RunSpec};

    use ContainerStatus::{Created, Exited, Running};
    use HealthStatus::{Healthy, Starting, Unhealthy};

    async fn started(observations: Vec<ContainerSnapshot>) -> InMemoryRuntime {
        let runtime = InMemoryRuntime::new().with_image("img");
        runtime.script_after_run("lab", observations);
        runtime
            .run(&RunSpec {
                name: "lab".to_string(),
                image: "img".to_string(),
                ports: Vec::new(),
                restart_policy: RestartPolicy::Never,
            })
            .await
            .unwrap();
        runtime
    }

    #[tokio::test(start_paused = true)]
    async fn running_without_health_check_needs_one_confirmation() {
        let runtime = started(vec![
            ContainerSnapshot::new(Created),
            ContainerSnapshot::new(Running),
        ])
        .await;

        let mode = ReadinessProbe::new(&runtime, ProbeConfig::default())
            .wait_ready("lab")
            .await
            .unwrap();

        assert_eq!(mode, ReadyMode::Running);
        assert!(runtime.get_count("lab") <= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn health_check_must_report_healthy() {
        let runtime = started(vec![
            ContainerSnapshot::with_health(Running, Starting),
            ContainerSnapshot::with_health(Running, Starting),
            ContainerSnapshot::with_health(Running, Starting),
            ContainerSnapshot::with_health(Running, Healthy),
        ])
        .await;

        let mode = ReadinessProbe::new(&runtime, ProbeConfig::default())
            .wait_ready("lab")
            .await
            .unwrap();

        assert_eq!(mode, ReadyMode::Healthy);
        assert_eq!(runtime.get_count("lab"), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn health_check_seen_once_is_always_required() {
        // health goes missing after the first look; running alone is not enough
        let runtime = started(vec![
            ContainerSnapshot::with_health(Running, Starting),
            ContainerSnapshot::new(Running),
            ContainerSnapshot::new(Running),
            ContainerSnapshot::with_health(Running, Healthy),
        ])
        .await;

        let mode = ReadinessProbe::new(&runtime, ProbeConfig::default())
            .wait_ready("lab")
            .await
            .unwrap();

        assert_eq!(mode, ReadyMode::Healthy);
        assert_eq!(runtime.get_count("lab"), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn disappearing_container_keeps_polling() {
        let runtime = started(vec![
            ContainerSnapshot::new(Created),
            ContainerSnapshot::new(ContainerStatus::Absent),
            ContainerSnapshot::new(Running),
        ])
        .await;

        let mode = ReadinessProbe::new(&runtime, ProbeConfig::default())
            .wait_ready("lab")
            .await
            .unwrap();
        assert_eq!(mode, ReadyMode::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn never_running_times_out_with_last_status() {
        let runtime = started(vec![ContainerSnapshot::new(Exited)]).await;

        let err = ReadinessProbe::new(&runtime, ProbeConfig::default())
            .wait_ready("lab")
            .await
            .unwrap_err();

        match err {
            LabError::ReadinessTimeout {
                last_status,
                last_health,
                waited_secs,
                ..
            } => {
                assert_eq!(last_status, Exited);
                assert_eq!(last_health, None);
                assert_eq!(waited_secs, 30);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unhealthy_times_out_with_last_health() {
        let runtime = started(vec![ContainerSnapshot::with_health(Running, Unhealthy)]).await;
        let config = ProbeConfig {
            timeout: Duration::from_secs(5),
            ..ProbeConfig::default()
        };

        let err = ReadinessProbe::new(&runtime, config)
            .wait_ready("lab")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LabError::ReadinessTimeout {
                last_status: Running,
                last_health: Some(Unhealthy),
                ..
            }
        ));
    }
}
