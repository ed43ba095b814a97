use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::app::ports::{JobLogPort, ReportingRepository};
use crate::app::LOG_TIMESTAMP;
use crate::error::Result;
use crate::metrics::JobMetrics;

/// Point-in-time aggregate over the whole store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub customers: u64,
    pub orders: u64,
    pub revenue: Decimal,
    pub generated_at: DateTime<Utc>,
}

impl ReportSummary {
    pub fn log_line(&self) -> String {
        format!(
            "{} - Report: {} customers, {} orders, {:.2} revenue.",
            self.generated_at.format(LOG_TIMESTAMP),
            self.customers,
            self.orders,
            self.revenue.round_dp(2)
        )
    }
}

/// Run the three aggregate queries. Nothing is written.
pub async fn collect_summary<R>(repo: &R, now: DateTime<Utc>) -> Result<ReportSummary>
where
    R: ReportingRepository + ?Sized,
{
    let customers = repo.count_customers().await?;
    let orders = repo.count_orders().await?;
    let revenue = repo.sum_revenue().await?;
    Ok(ReportSummary {
        customers,
        orders,
        revenue,
        generated_at: now,
    })
}

/// Weekly summary report: aggregates first, then a single log append.
pub struct ReportUseCase {
    repo: Arc<dyn ReportingRepository>,
    log: Box<dyn JobLogPort>,
}

impl ReportUseCase {
    pub fn new(repo: Arc<dyn ReportingRepository>, log: Box<dyn JobLogPort>) -> Self {
        Self { repo, log }
    }

    pub async fn execute(&self, now: DateTime<Utc>) -> Result<ReportSummary> {
        let summary = match collect_summary(self.repo.as_ref(), now).await {
            Ok(summary) => summary,
            Err(e) => {
                JobMetrics::report_failed();
                error!("Report aborted, nothing logged: {}", e);
                return Err(e);
            }
        };

        self.log.append(&[summary.log_line()]).await?;
        JobMetrics::report_generated();
        info!(
            customers = summary.customers,
            orders = summary.orders,
            revenue = %summary.revenue,
            "CRM report generated"
        );
        Ok(summary)
    }
}
