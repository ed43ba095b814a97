use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::app::cleanup_use_case::DEFAULT_RETENTION_DAYS;
use crate::app::reminders_use_case::DEFAULT_REMINDER_WINDOW_DAYS;
use crate::app::restock_use_case::DEFAULT_RESTOCK_AMOUNT;
use crate::domain::LOW_STOCK_THRESHOLD;
use crate::error::{CrmError, Result};
use crate::schedule::{CronExpr, ScheduledJob};

pub const DEFAULT_CONFIG_FILE: &str = "crm.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub report: ReportConfig,
    pub cleanup: CleanupConfig,
    pub heartbeat: HeartbeatConfig,
    pub low_stock: LowStockConfig,
    pub reminders: RemindersConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("crm.sqlite3"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub log_path: PathBuf,
    pub schedule: CronExpr,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("/tmp/crm_report_log.txt"),
            schedule: cron("0 6 * * 1"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    pub log_path: PathBuf,
    pub schedule: CronExpr,
    pub retention_days: u32,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("/tmp/customer_cleanup_log.txt"),
            schedule: cron("0 2 * * 0"),
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    pub log_path: PathBuf,
    pub schedule: CronExpr,
    /// When set, each beat also probes `{ hello }` on this URL.
    pub graphql_endpoint: Option<String>,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("/tmp/crm_heartbeat_log.txt"),
            schedule: cron("*/5 * * * *"),
            graphql_endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LowStockConfig {
    pub log_path: PathBuf,
    pub schedule: CronExpr,
    pub threshold: i64,
    pub restock_amount: i64,
}

impl Default for LowStockConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("/tmp/low_stock_updates_log.txt"),
            schedule: cron("0 */12 * * *"),
            threshold: LOW_STOCK_THRESHOLD,
            restock_amount: DEFAULT_RESTOCK_AMOUNT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemindersConfig {
    pub log_path: PathBuf,
    pub schedule: CronExpr,
    pub window_days: u32,
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("/tmp/order_reminders_log.txt"),
            schedule: cron("0 8 * * *"),
            window_days: DEFAULT_REMINDER_WINDOW_DAYS,
        }
    }
}

/// Built-in defaults are known-good expressions.
fn cron(expr: &str) -> CronExpr {
    expr.parse().expect("built-in cron expression is valid")
}

impl Config {
    /// Load from `path`, else `CRM_CONFIG`, else `crm.toml` if present, else
    /// defaults. An explicitly named file must exist. `CRM_DATABASE_PATH`
    /// overrides the database location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("CRM_CONFIG").map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        if let Some(db) = std::env::var_os("CRM_DATABASE_PATH") {
            config.database.path = PathBuf::from(db);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CrmError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.cleanup.retention_days == 0 {
            return Err(CrmError::Config("cleanup.retention_days must be positive".into()));
        }
        if self.low_stock.restock_amount <= 0 {
            return Err(CrmError::Config("low_stock.restock_amount must be positive".into()));
        }
        if self.low_stock.threshold < 0 {
            return Err(CrmError::Config("low_stock.threshold must not be negative".into()));
        }
        Ok(())
    }

    /// The externally triggered jobs with their configured schedules.
    pub fn scheduled_jobs(&self) -> Vec<ScheduledJob> {
        vec![
            ScheduledJob {
                subcommand: "report",
                schedule: self.report.schedule.clone(),
            },
            ScheduledJob {
                subcommand: "cleanup",
                schedule: self.cleanup.schedule.clone(),
            },
            ScheduledJob {
                subcommand: "heartbeat",
                schedule: self.heartbeat.schedule.clone(),
            },
            ScheduledJob {
                subcommand: "restock",
                schedule: self.low_stock.schedule.clone(),
            },
            ScheduledJob {
                subcommand: "reminders",
                schedule: self.reminders.schedule.clone(),
            },
        ]
    }
}
