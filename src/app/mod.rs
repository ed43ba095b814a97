pub mod cleanup_use_case;
pub mod heartbeat_use_case;
pub mod ports;
pub mod reminders_use_case;
pub mod report_use_case;
pub mod restock_use_case;

/// Timestamp prefix for report, cleanup and reminder lines.
pub const LOG_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";
/// Timestamp prefix for heartbeat and restock lines.
pub const CRON_TIMESTAMP: &str = "%d/%m/%Y-%H:%M:%S";

pub use cleanup_use_case::{CleanupOutcome, CleanupUseCase};
pub use heartbeat_use_case::{HeartbeatOutcome, HeartbeatUseCase};
pub use reminders_use_case::RemindersUseCase;
pub use report_use_case::{collect_summary, ReportSummary, ReportUseCase};
pub use restock_use_case::{restock_low_stock, RestockOutcome, RestockUseCase};
