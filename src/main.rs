//! CLI entry point for the waste ledger.
//!
//! Provides subcommands for importing a monthly waste CSV into the local
//! ledger, querying monthly emission series, exporting yearly reports, and
//! running the full dashboard start-up flow.

use anyhow::Result;
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use waste_ledger::{
    analyzers::Aggregator,
    config::{AppConfig, log_config},
    dashboard::{Dashboard, DashboardConfig},
    factors::EmissionFactorTable,
    importer::{CsvSource, Importer},
    ledger::{Category, FileLedger},
    output::{print_json, write_report},
};

#[derive(Parser)]
#[command(name = "waste_ledger")]
#[command(about = "Monthly waste ledger and carbon emission reports", long_about = None)]
struct Cli {
    /// JSON file overriding emission factors (kg CO2e per kg of waste)
    #[arg(long, global = true)]
    factors: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a waste CSV from a file or URL, replacing the ledger contents
    Import {
        /// Path to file or URL to fetch
        #[arg(long, value_name = "FILE_OR_URL")]
        source: String,

        /// Ledger snapshot file (defaults to WASTE_STORE_PATH)
        #[arg(short, long)]
        store: Option<PathBuf>,
    },
    /// Print the monthly emission series of one category
    Series {
        /// Category label, e.g. "medical" or "의료폐기물"
        #[arg(short, long)]
        category: String,

        /// Only count records from this year
        #[arg(short, long)]
        year: Option<i32>,

        /// Ledger snapshot file (defaults to WASTE_STORE_PATH)
        #[arg(short, long)]
        store: Option<PathBuf>,
    },
    /// Write the yearly report as waste-report-<year>.json
    Report {
        /// Report year
        #[arg(short, long)]
        year: i32,

        /// Ledger snapshot file (defaults to WASTE_STORE_PATH)
        #[arg(short, long)]
        store: Option<PathBuf>,

        /// Directory to write the report into
        #[arg(short = 'd', long, default_value = ".")]
        output_dir: PathBuf,

        /// Gzip compress the report
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Import the CSV and print the chart data the dashboard would show
    Dashboard {
        /// Path to file or URL to fetch
        #[arg(long, value_name = "FILE_OR_URL")]
        source: String,

        /// Chart year (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,

        /// Ledger snapshot file (defaults to WASTE_STORE_PATH)
        #[arg(short, long)]
        store: Option<PathBuf>,

        /// Keep the ledger in memory instead of a snapshot file
        #[arg(long, default_value_t = false)]
        in_memory: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let config = AppConfig::load();

    // Logging setup: colored stderr + JSON rolling log file
    let log_dir = Path::new(&config.log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&config.log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("waste_ledger.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    log_config(&config);

    let cli = Cli::parse();

    let factors = match &cli.factors {
        Some(path) => EmissionFactorTable::load(path)?,
        None => EmissionFactorTable::default(),
    };

    match cli.command {
        Commands::Import { source, store } => {
            let store = FileLedger::open(store.unwrap_or(config.store_path.clone())).await?;
            let client = config.http_client()?;

            let summary = Importer::new(client.as_ref(), &factors)
                .run(&CsvSource::parse(&source), &store)
                .await?;

            for (category, quantity) in &summary.quantities {
                info!(category = %category, quantity_kg = quantity, "Imported category");
            }
        }
        Commands::Series {
            category,
            year,
            store,
        } => {
            let store = FileLedger::open(store.unwrap_or(config.store_path.clone())).await?;
            let category = Category::from_label(&category);

            let series = Aggregator::new(&store)
                .monthly_series(&category, year)
                .await?;
            print_json(&series)?;
        }
        Commands::Report {
            year,
            store,
            output_dir,
            gzip,
        } => {
            let store = FileLedger::open(store.unwrap_or(config.store_path.clone())).await?;

            let report = Aggregator::new(&store).export_report(year).await?;
            let summary = report.summary();
            info!(
                year,
                total_waste = summary.total_waste,
                total_carbon = summary.total_carbon,
                "Report totals"
            );
            write_report(&report, &output_dir, gzip)?;
        }
        Commands::Dashboard {
            source,
            year,
            store,
            in_memory,
        } => {
            let store_path = if in_memory {
                None
            } else {
                Some(store.unwrap_or(config.store_path.clone()))
            };
            let dashboard_config = DashboardConfig {
                source: CsvSource::parse(&source),
                store_path,
                factors,
                year: year.unwrap_or_else(|| Utc::now().year()),
            };

            let client = config.http_client()?;
            let dashboard = Dashboard::initialize(dashboard_config, client.as_ref()).await?;
            print_json(dashboard.board())?;
        }
    }

    Ok(())
}
