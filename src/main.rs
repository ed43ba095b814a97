use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use crm_service::app::{
    CleanupUseCase, HeartbeatUseCase, RemindersUseCase, ReportUseCase, RestockUseCase,
};
use crm_service::app::ports::HealthProbePort;
use crm_service::config::Config;
use crm_service::infra::{FileJobLog, GraphqlHelloProbe, SqliteRepository};
use crm_service::schedule::crontab_lines;
use crm_service::{logging, metrics, server};

#[derive(Parser)]
#[command(name = "crm")]
#[command(about = "CRM reports, retention cleanup and GraphQL API")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, env = "CRM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the GraphQL API over HTTP
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Append the customer/order/revenue summary to the report log
    Report,
    /// Delete customers without an order inside the retention window
    Cleanup {
        /// Log how many customers would be deleted, delete nothing
        #[arg(long)]
        dry_run: bool,
    },
    /// Append a liveness line to the heartbeat log
    Heartbeat,
    /// Restock products below the stock threshold
    Restock {
        #[arg(long)]
        threshold: Option<i64>,
        #[arg(long)]
        amount: Option<i64>,
    },
    /// Log orders placed in the last few days
    Reminders {
        #[arg(long)]
        days: Option<u32>,
    },
    /// Print crontab lines for every scheduled job
    Crontab {
        /// Binary path to put in the lines (defaults to this executable)
        #[arg(long)]
        binary: Option<PathBuf>,
    },
}

fn open_repository(config: &Config) -> anyhow::Result<Arc<SqliteRepository>> {
    let repo = SqliteRepository::open(&config.database.path).with_context(|| {
        format!(
            "failed to open database at {}",
            config.database.path.display()
        )
    })?;
    Ok(Arc::new(repo))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    let _guard = logging::init_logging(&config.logging.directory);

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            metrics::init_metrics();
            let repo = open_repository(&config)?;
            server::start_server(repo, Arc::new(config)).await?;
        }
        Commands::Report => {
            let repo = open_repository(&config)?;
            let log = FileJobLog::new(&config.report.log_path);
            let job = ReportUseCase::new(repo, Box::new(log));
            let summary = job.execute(Utc::now()).await?;
            println!("{}", summary.log_line());
        }
        Commands::Cleanup { dry_run } => {
            let repo = open_repository(&config)?;
            let job = CleanupUseCase::new(
                repo,
                Box::new(FileJobLog::new(&config.cleanup.log_path)),
                config.cleanup.retention_days,
            );
            let outcome = job.execute(Utc::now(), dry_run).await?;
            if dry_run {
                println!(
                    "{} inactive customers would be deleted (cutoff {})",
                    outcome.stale_customers.len(),
                    outcome.cutoff
                );
            } else {
                println!("Deleted {} inactive customers", outcome.deleted);
            }
        }
        Commands::Heartbeat => {
            let probe = match &config.heartbeat.graphql_endpoint {
                Some(endpoint) => {
                    let probe = GraphqlHelloProbe::new(endpoint.clone())?;
                    Some(Box::new(probe) as Box<dyn HealthProbePort>)
                }
                None => None,
            };
            let job = HeartbeatUseCase::new(
                Box::new(FileJobLog::new(&config.heartbeat.log_path)),
                probe,
            );
            let outcome = job.execute(Utc::now()).await?;
            println!("{}", outcome.line);
        }
        Commands::Restock { threshold, amount } => {
            let repo = open_repository(&config)?;
            let log = FileJobLog::new(&config.low_stock.log_path);
            let job = RestockUseCase::new(repo, Box::new(log)).with_limits(
                threshold.unwrap_or(config.low_stock.threshold),
                amount.unwrap_or(config.low_stock.restock_amount),
            );
            match job.execute(Utc::now()).await {
                Ok(outcome) => {
                    println!("{}", outcome.message);
                    for product in &outcome.updated {
                        println!("  {}: {}", product.name, product.stock);
                    }
                }
                Err(e) => {
                    error!("Low stock update failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Reminders { days } => {
            let repo = open_repository(&config)?;
            let job = RemindersUseCase::new(
                repo,
                Box::new(FileJobLog::new(&config.reminders.log_path)),
                days.unwrap_or(config.reminders.window_days),
            );
            let contacts = job.execute(Utc::now()).await?;
            println!("Order reminders processed! ({} orders)", contacts.len());
        }
        Commands::Crontab { binary } => {
            let binary = match binary {
                Some(path) => path,
                None => std::env::current_exe()?,
            };
            let jobs = config.scheduled_jobs();
            for line in crontab_lines(&jobs, &binary, cli.config.as_deref()) {
                println!("{line}");
            }
            info!("Rendered crontab for {} jobs", jobs.len());
        }
    }
    Ok(())
}
