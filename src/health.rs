// Health prober: periodically GETs our own /metrics and feeds the supervisor watchdog.
// A failed probe only withholds that cycle's notification.

use crate::supervisor::Supervisor;
use crate::version;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Duration, Instant, interval_at};
use tracing::{debug, warn};

/// HTTP self-probe of the metrics endpoint.
pub struct HealthProbe {
    client: reqwest::Client,
    url: String,
}

impl HealthProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(version::user_agent())
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Succeeds when the endpoint answers with a 2xx status.
    pub async fn check(&self) -> anyhow::Result<()> {
        let response = self.client.get(&self.url).send().await?;
        response.error_for_status()?;
        Ok(())
    }
}

pub struct HealthConfig {
    pub interval: Duration,
}

/// Runs one probe and, on success, notifies the supervisor. Returns whether the probe passed.
pub async fn probe_once(probe: &HealthProbe, supervisor: &dyn Supervisor) -> bool {
    match probe.check().await {
        Ok(()) => {
            if let Err(e) = supervisor.alive() {
                warn!(error = %e, operation = "notify_alive", "supervisor notification failed");
            }
            debug!(url = probe.url(), "health check passed");
            true
        }
        Err(e) => {
            warn!(
                error = %e,
                url = probe.url(),
                operation = "health_check",
                "internal health check failed"
            );
            false
        }
    }
}

/// Spawns the prober. First probe fires one interval after start; exits when `shutdown` flips.
pub fn spawn(
    probe: HealthProbe,
    supervisor: Arc<dyn Supervisor>,
    config: HealthConfig,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = interval_at(Instant::now() + config.interval, config.interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    probe_once(&probe, supervisor.as_ref()).await;
                }
                _ = shutdown.changed() => {
                    debug!("Health prober shutting down");
                    break;
                }
            }
        }
    })
}
