use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::app::ports::{HealthProbePort, JobLogPort};
use crate::app::CRON_TIMESTAMP;
use crate::error::Result;
use crate::metrics::JobMetrics;

#[derive(Debug, Clone)]
pub struct HeartbeatOutcome {
    pub line: String,
    /// `None` when no endpoint is configured.
    pub probe_ok: Option<bool>,
}

/// Liveness line, optionally confirming the GraphQL endpoint answers.
pub struct HeartbeatUseCase {
    log: Box<dyn JobLogPort>,
    probe: Option<Box<dyn HealthProbePort>>,
}

impl HeartbeatUseCase {
    pub fn new(log: Box<dyn JobLogPort>, probe: Option<Box<dyn HealthProbePort>>) -> Self {
        Self { log, probe }
    }

    pub async fn execute(&self, now: DateTime<Utc>) -> Result<HeartbeatOutcome> {
        let mut line = format!("{} CRM is alive", now.format(CRON_TIMESTAMP));
        let probe_ok = match &self.probe {
            None => None,
            Some(probe) => match probe.probe().await {
                Ok(_) => {
                    line.push_str(" (GraphQL responsive)");
                    Some(true)
                }
                Err(e) => {
                    warn!("GraphQL heartbeat probe failed: {}", e);
                    line.push_str(&format!(" (GraphQL unreachable: {e})"));
                    Some(false)
                }
            },
        };

        self.log.append(&[line.clone()]).await?;
        JobMetrics::heartbeat(probe_ok);
        info!(?probe_ok, "Heartbeat logged");
        Ok(HeartbeatOutcome { line, probe_ok })
    }
}
