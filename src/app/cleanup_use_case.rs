use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::app::ports::{JobLogPort, RetentionRepository};
use crate::app::LOG_TIMESTAMP;
use crate::domain::{retention_cutoff, CustomerId};
use crate::error::Result;
use crate::metrics::JobMetrics;

pub const DEFAULT_RETENTION_DAYS: u32 = 365;

#[derive(Debug, Clone, Serialize)]
pub struct CleanupOutcome {
    pub cutoff: DateTime<Utc>,
    pub stale_customers: Vec<CustomerId>,
    pub deleted: u64,
    pub dry_run: bool,
}

/// Deletes customers with no order inside the retention window.
pub struct CleanupUseCase {
    repo: Arc<dyn RetentionRepository>,
    log: Box<dyn JobLogPort>,
    retention_days: u32,
}

impl CleanupUseCase {
    pub fn new(
        repo: Arc<dyn RetentionRepository>,
        log: Box<dyn JobLogPort>,
        retention_days: u32,
    ) -> Self {
        Self {
            repo,
            log,
            retention_days,
        }
    }

    pub async fn execute(&self, now: DateTime<Utc>, dry_run: bool) -> Result<CleanupOutcome> {
        let cutoff = retention_cutoff(now, self.retention_days);
        let stale_customers = self.repo.find_stale_customers(cutoff).await?;

        let (deleted, line) = if dry_run {
            (
                0,
                format!(
                    "{} - Dry run: {} inactive customers would be deleted",
                    now.format(LOG_TIMESTAMP),
                    stale_customers.len()
                ),
            )
        } else {
            let deleted = if stale_customers.is_empty() {
                0
            } else {
                self.repo.delete_customers(&stale_customers).await?
            };
            (
                deleted,
                format!(
                    "{} - Deleted {} inactive customers",
                    now.format(LOG_TIMESTAMP),
                    deleted
                ),
            )
        };

        self.log.append(&[line]).await?;
        if !dry_run {
            JobMetrics::customers_deleted(deleted);
        }
        info!(
            deleted,
            candidates = stale_customers.len(),
            %cutoff,
            dry_run,
            "Inactive customer cleanup finished"
        );

        Ok(CleanupOutcome {
            cutoff,
            stale_customers,
            deleted,
            dry_run,
        })
    }
}
