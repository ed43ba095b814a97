use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::info;

use crate::app::ports::{JobLogPort, OrderRepository};
use crate::app::LOG_TIMESTAMP;
use crate::domain::OrderContact;
use crate::error::Result;
use crate::metrics::JobMetrics;

pub const DEFAULT_REMINDER_WINDOW_DAYS: u32 = 7;

/// Logs one reminder line per order placed inside the window.
pub struct RemindersUseCase {
    repo: Arc<dyn OrderRepository>,
    log: Box<dyn JobLogPort>,
    window_days: u32,
}

impl RemindersUseCase {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        log: Box<dyn JobLogPort>,
        window_days: u32,
    ) -> Self {
        Self {
            repo,
            log,
            window_days,
        }
    }

    pub async fn execute(&self, now: DateTime<Utc>) -> Result<Vec<OrderContact>> {
        let since = now - Duration::days(i64::from(self.window_days));
        let contacts = self.repo.order_contacts_since(since).await?;

        let stamp = now.format(LOG_TIMESTAMP).to_string();
        let lines: Vec<String> = if contacts.is_empty() {
            vec![format!(
                "[{stamp}] No orders found in the last {} days.",
                self.window_days
            )]
        } else {
            contacts
                .iter()
                .map(|c| {
                    format!(
                        "[{stamp}] Order ID: {}, Customer Email: {}",
                        c.order_id, c.customer_email
                    )
                })
                .collect()
        };
        self.log.append(&lines).await?;

        JobMetrics::reminders_logged(contacts.len() as u64);
        info!(orders = contacts.len(), window_days = self.window_days, "Order reminders processed");
        Ok(contacts)
    }
}
