use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use crate::app::ports::{JobLogPort, ProductRepository};
use crate::app::CRON_TIMESTAMP;
use crate::domain::{Product, LOW_STOCK_THRESHOLD};
use crate::error::{CrmError, Result};
use crate::metrics::JobMetrics;

pub const DEFAULT_RESTOCK_AMOUNT: i64 = 50;

#[derive(Debug, Clone)]
pub struct RestockOutcome {
    pub success: bool,
    pub message: String,
    pub updated: Vec<Product>,
}

/// Add `amount` to every product with stock below `threshold`.
pub async fn restock_low_stock<R>(repo: &R, threshold: i64, amount: i64) -> Result<RestockOutcome>
where
    R: ProductRepository + ?Sized,
{
    if threshold < 0 {
        return Err(CrmError::Validation("threshold must not be negative".into()));
    }
    if amount <= 0 {
        return Err(CrmError::Validation("restock amount must be positive".into()));
    }

    let updated = repo.restock_below(threshold, amount).await?;
    let message = if updated.is_empty() {
        format!("No products below stock threshold {threshold}.")
    } else {
        format!(
            "Restocked {} product(s) below stock threshold {threshold} by {amount}.",
            updated.len()
        )
    };
    JobMetrics::products_restocked(updated.len() as u64);
    Ok(RestockOutcome {
        success: true,
        message,
        updated,
    })
}

pub struct RestockUseCase {
    repo: Arc<dyn ProductRepository>,
    log: Box<dyn JobLogPort>,
    threshold: i64,
    amount: i64,
}

impl RestockUseCase {
    pub fn new(repo: Arc<dyn ProductRepository>, log: Box<dyn JobLogPort>) -> Self {
        Self {
            repo,
            log,
            threshold: LOW_STOCK_THRESHOLD,
            amount: DEFAULT_RESTOCK_AMOUNT,
        }
    }

    pub fn with_limits(mut self, threshold: i64, amount: i64) -> Self {
        self.threshold = threshold;
        self.amount = amount;
        self
    }

    pub async fn execute(&self, now: DateTime<Utc>) -> Result<RestockOutcome> {
        let outcome = restock_low_stock(self.repo.as_ref(), self.threshold, self.amount).await?;

        let mut lines = Vec::with_capacity(outcome.updated.len() + 1);
        lines.push(format!("{} - {}", now.format(CRON_TIMESTAMP), outcome.message));
        lines.extend(
            outcome
                .updated
                .iter()
                .map(|p| format!("Product: {}, New stock: {}", p.name, p.stock)),
        );
        self.log.append(&lines).await?;

        info!(
            updated = outcome.updated.len(),
            threshold = self.threshold,
            "Low-stock restock finished"
        );
        Ok(outcome)
    }
}
