use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use crm_service::app::RemindersUseCase;
use crm_service::config::Config;
use crm_service::infra::{FileJobLog, SqliteRepository};
use crm_service::logging;

/// Cron entry point: logs orders placed within the reminder window.
#[derive(Parser, Debug)]
#[command(name = "send-order-reminders", version, about = "Log reminders for recent orders")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, env = "CRM_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured window in days
    #[arg(long)]
    days: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Cli::parse();

    let config = Config::load(args.config.as_deref())?;
    let _guard = logging::init_logging(&config.logging.directory);

    let repo = SqliteRepository::open(&config.database.path).with_context(|| {
        format!("failed to open database at {}", config.database.path.display())
    })?;
    let job = RemindersUseCase::new(
        Arc::new(repo),
        Box::new(FileJobLog::new(&config.reminders.log_path)),
        args.days.unwrap_or(config.reminders.window_days),
    );

    job.execute(Utc::now()).await?;
    println!("Order reminders processed!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["send-order-reminders", "crm.toml"]).is_err());
    }

    #[test]
    fn window_override_is_parsed() {
        let cli = Cli::try_parse_from(["send-order-reminders", "--days", "3"]).unwrap();
        assert_eq!(cli.days, Some(3));
    }
}
