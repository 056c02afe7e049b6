//! `dental-leads`: scrape dental clinic leads into per-city tables and report on them.
//!
//! # Usage
//!
//! ```text
//! dental-leads scrape --sheet <ID or URL> --city Lahore --count 20 --mode both
//! dental-leads report --sheet <ID or URL> [--json]
//! dental-leads config show|path|reset
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use dental_leads_lib::application::{IngestionPipeline, IngestionRequest, LeadStore, ReportingView};
use dental_leads_lib::domain::repositories::{PageFetcher, SearchProvider, TableBackend};
use dental_leads_lib::domain::{Lead, SpreadsheetId};
use dental_leads_lib::infrastructure::{
    AppConfig, ConfigManager, DuckDuckGoSearch, HttpClient, SqliteSheetBackend, init_logging_with_config,
};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "dental-leads", version, about = "Dental clinic lead scraper")]
struct Cli {
    /// Path to a JSON config file (default: <config dir>/dental-leads/config.json)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true, env = "DENTAL_LEADS_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect new leads for a city and append them to its table
    Scrape {
        /// Spreadsheet id or full sheet URL
        #[arg(long)]
        sheet: String,

        /// City name (case-insensitive)
        #[arg(long)]
        city: String,

        /// Number of new leads wanted
        #[arg(long, allow_negative_numbers = true)]
        count: i64,

        /// Lead sources: directories, google or both
        #[arg(long, default_value = "both")]
        mode: String,
    },

    /// Summarize every city table of a spreadsheet
    Report {
        /// Spreadsheet id or full sheet URL
        #[arg(long)]
        sheet: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect or reset the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the configuration file location
    Path,
    /// Overwrite the configuration file with defaults
    Reset,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let mut config = manager.load_config().await?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    init_logging_with_config(&config.logging)?;

    let result = match cli.command {
        Command::Scrape { sheet, city, count, mode } => scrape(config, &sheet, &city, count, &mode).await,
        Command::Report { sheet, json } => report(&config, &sheet, json).await,
        Command::Config { action } => config_command(&manager, &config, action).await,
    };

    if let Err(e) = &result {
        error!("❌ {:#}", e);
    }
    result
}

async fn scrape(config: AppConfig, sheet: &str, city: &str, count: i64, mode: &str) -> Result<()> {
    let request = IngestionRequest::new(sheet, city, count, mode)?;
    config.validate()?;

    let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpClient::with_config(&config.scraper)?);
    let search: Arc<dyn SearchProvider> = Arc::new(DuckDuckGoSearch::new(fetcher.clone(), &config.search.endpoint)?);

    let data_dir = config.storage.resolve_data_dir()?;
    let backend: Arc<dyn TableBackend> = Arc::new(SqliteSheetBackend::open(&data_dir, request.spreadsheet()).await?);
    let pipeline = IngestionPipeline::new(config, fetcher, search, LeadStore::new(backend))?;

    let leads = pipeline.run(&request).await?;
    print_leads(request.city(), &leads);
    Ok(())
}

async fn report(config: &AppConfig, sheet: &str, json: bool) -> Result<()> {
    let spreadsheet = SpreadsheetId::parse(sheet)?;
    let data_dir = config.storage.resolve_data_dir()?;
    if !SqliteSheetBackend::database_path(&data_dir, &spreadsheet).exists() {
        bail!("No data stored for spreadsheet '{}' yet", spreadsheet);
    }

    let backend = Arc::new(SqliteSheetBackend::open(&data_dir, &spreadsheet).await?);
    let report = ReportingView::new(backend).generate(Local::now().date_naive()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report).context("Failed to serialize report")?);
    } else {
        print!("{report}");
    }
    Ok(())
}

async fn config_command(manager: &ConfigManager, config: &AppConfig, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(config).context("Failed to serialize configuration")?);
        }
        ConfigAction::Path => println!("{}", manager.config_path().display()),
        ConfigAction::Reset => {
            manager.reset_to_defaults().await?;
            info!("Configuration reset: {}", manager.config_path().display());
        }
    }
    Ok(())
}

fn print_leads(city: &str, leads: &[Lead]) {
    if leads.is_empty() {
        println!("No new leads were added for {city}.");
        return;
    }

    println!("{} new lead(s) added for {city}:", leads.len());
    for lead in leads {
        println!("  {:<30} {:<35} {:<30} {}", lead.name, lead.website, lead.email, lead.phone);
    }
}
