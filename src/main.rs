//! regbatch CLI - offline harness around the ingestion core
//!
//! Validates uploads, generates templates and applies results files
//! against a local database. The surrounding application normally calls
//! the library directly; this binary exists for operators and seeding.

use anyhow::Result;
use clap::{Parser, Subcommand};
use regbatch::db;
use regbatch::ingest;
use regbatch::Config;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "regbatch", version, about = "Bulk event-registration ingestion")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, env = "REGBATCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database and schema
    InitDb,

    /// Validate a registration upload against an event's schema and
    /// print the report as JSON
    Validate {
        #[arg(long)]
        event: String,
        file: PathBuf,
    },

    /// Write the registration upload template for an event
    Template {
        #[arg(long)]
        event: String,
        #[arg(short, long, default_value = "registrations_template.csv")]
        output: PathBuf,
    },

    /// Write the results upload template for an event
    ResultsTemplate {
        #[arg(long)]
        event: String,
        #[arg(short, long, default_value = "results_template.csv")]
        output: PathBuf,
    },

    /// Apply a results upload for an event and print the report as JSON
    IngestResults {
        #[arg(long)]
        event: String,
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let pool = db::init_database(&config.database_path).await?;

    match cli.command {
        Command::InitDb => {
            info!("Database ready at {}", config.database_path.display());
        }
        Command::Validate { event, file } => {
            let snapshot = db::events::load_event_snapshot(&pool, &event).await?;
            let bytes = std::fs::read(&file)?;
            let report = ingest::ingest_registrations(&bytes, &snapshot)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Template { event, output } => {
            let snapshot = db::events::load_event_snapshot(&pool, &event).await?;
            let bytes = ingest::registration_template(&snapshot)?;
            std::fs::write(&output, bytes)?;
            info!("Template written to {}", output.display());
        }
        Command::ResultsTemplate { event, output } => {
            let registrations =
                db::registrations::load_registrations_for_event(&pool, &event).await?;
            let bytes = ingest::results_template(&registrations)?;
            std::fs::write(&output, bytes)?;
            info!("Results template written to {}", output.display());
        }
        Command::IngestResults { event, file } => {
            let bytes = std::fs::read(&file)?;
            let report = ingest::ingest_results(&pool, &event, &bytes).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
