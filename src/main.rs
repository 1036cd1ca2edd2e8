use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::db::runs::{record_city_run, recent_runs};
use crate::db::{init_db, Database, InventoryStore, SqliteInventoryStore};
use crate::inventory::TeslaInventoryClient;
use crate::mailer::BrevoMailer;
use crate::notifier::Notifier;
use crate::pipeline::Orchestrator;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod domain;
mod errors;
mod inventory;
mod mailer;
mod notifier;
mod pipeline;

#[cfg(test)]
mod tests;

#[derive(Debug, Parser)]
#[command(name = "inventory-watch")]
#[command(about = "Polls Tesla inventory per city and emails subscribers about changes")]
struct Cli {
    #[arg(long, short, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check every configured city once (the default).
    Run {
        /// Only process these cities.
        #[arg(long = "city")]
        cities: Vec<String>,
    },
    /// Show the most recent per-city run results.
    Runs {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Print the stored inventory for one city.
    Inventory { city: String },
}

fn main() -> Result<ExitCode> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = Config::load_from_path(&cli.config)?;
    init_tracing(&config.general.log_level);
    info!(path = %cli.config.display(), "Loaded config");
    config.validate()?;

    let db = Database::new(
        &config.store.path,
        Duration::from_millis(config.store.busy_timeout_ms),
    );
    init_db(&db).context("Database initialization failed")?;
    let store = SqliteInventoryStore::new(db, config.store.write_policy);

    match cli.command.unwrap_or(Commands::Run { cities: Vec::new() }) {
        Commands::Run { cities } => run(&config, &store, &cities),
        Commands::Runs { limit } => {
            for r in recent_runs(store.database(), limit)? {
                println!(
                    "#{} {} {} → {} sold={} new={} ok={} {}",
                    r.id,
                    r.city,
                    r.started_at,
                    r.finished_at,
                    r.sold_count,
                    r.new_count,
                    r.success,
                    r.error_message.unwrap_or_default()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Inventory { city } => {
            if config.city(&city).is_none() {
                bail!("unknown city '{city}'");
            }
            let vehicles = store.list_vehicles(&city)?;
            println!("{}", serde_json::to_string_pretty(&vehicles)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run(config: &Config, store: &SqliteInventoryStore, only: &[String]) -> Result<ExitCode> {
    for name in only {
        if config.city(name).is_none() {
            bail!("unknown city '{name}'");
        }
    }
    let cities: Vec<_> = config
        .cities
        .iter()
        .filter(|c| only.is_empty() || only.contains(&c.name))
        .cloned()
        .collect();

    let source = TeslaInventoryClient::new(config.api.clone())?;
    let mailer = BrevoMailer::new(
        config.email.api_url.clone(),
        config.email.api_key()?,
        config.email.sender_email.clone(),
        config.email.sender_name.clone(),
        Duration::from_secs(config.email.timeout_secs),
    )?;
    let notifier = Notifier::new(&mailer, store, config.email.failure_recipients.clone());
    let orchestrator = Orchestrator::new(&source, store, &notifier);

    info!(cities = cities.len(), "Starting inventory check");
    let report = orchestrator.run(&cities);

    for outcome in &report.outcomes {
        if let Err(e) = record_city_run(store.database(), outcome) {
            warn!(city = %outcome.city, error = %e, "Failed to record run history");
        }
    }

    let status = report.status_code();
    println!(
        "{}",
        serde_json::json!({ "statusCode": status, "body": report.message() })
    );

    Ok(if status == 200 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_tracing(default_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}
