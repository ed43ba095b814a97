use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use crm_service::app::CleanupUseCase;
use crm_service::config::Config;
use crm_service::infra::{FileJobLog, SqliteRepository};
use crm_service::logging;

/// Cron entry point: deletes customers with no recent order.
#[derive(Parser, Debug)]
#[command(name = "clean-inactive-customers", version, about = "Delete inactive customers")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, env = "CRM_CONFIG")]
    config: Option<PathBuf>,

    /// Log how many customers would be deleted, delete nothing
    #[arg(long)]
    dry_run: bool,
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
    let job = CleanupUseCase::new(
        Arc::new(repo),
        Box::new(FileJobLog::new(&config.cleanup.log_path)),
        config.cleanup.retention_days,
    );

    let outcome = job.execute(Utc::now(), args.dry_run).await?;
    if args.dry_run {
        println!(
            "{} inactive customers would be deleted",
            outcome.stale_customers.len()
        );
    } else {
        println!("Deleted {} inactive customers", outcome.deleted);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["clean-inactive-customers", "--dryrun"]).is_err());
    }

    #[test]
    fn dry_run_and_config_are_parsed() {
        let cli = Cli::try_parse_from([
            "clean-inactive-customers",
            "--dry-run",
            "--config",
            "/etc/crm.toml",
        ])
        .unwrap();
        assert!(cli.dry_run);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/crm.toml")));
    }
}
