use crate::errors::AppResult;
use crate::utils::time::Granularity;
use clap::{Parser, Subcommand};
use commands::analytics::{run_report, ReportArgs, ReportKind};

pub mod commands;

/// Project Scout Retail Analytics
#[derive(Parser)]
#[command(name = "scout-analytics")]
#[command(about = "Project Scout retail analytics for sari-sari store transactions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Headline KPIs with growth against the previous period
    Summary(ReportArgs),
    /// Brand revenue ranking with market share and client split
    Brands(ReportArgs),
    /// Category revenue ranking
    Categories(ReportArgs),
    /// Region revenue ranking (region taken from the store location)
    Regions(ReportArgs),
    /// Product mix: revenue, units and share per product, with its brand
    Products(ReportArgs),
    /// Revenue and transactions over time
    Trends(commands::analytics::TrendsCommand),
    /// Revenue by customer gender and age band
    Demographics(ReportArgs),
    /// Export a report to a CSV, JSON or printable HTML file
    Export(commands::analytics::ExportCommand),
    /// Apply SQL migration files statement by statement
    Migrate(commands::migrate::MigrateCommand),
}

pub async fn run() -> AppResult<()> {
    // Initialise tracing subscriber to capture info!() macros
    // Uses RUST_LOG environment variable (defaults to "error" if not set)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error")),
        )
        .try_init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Summary(args) => run_report(&args, ReportKind::Summary, Granularity::Day).await,
        Commands::Brands(args) => run_report(&args, ReportKind::Brands, Granularity::Day).await,
        Commands::Categories(args) => {
            run_report(&args, ReportKind::Categories, Granularity::Day).await
        }
        Commands::Regions(args) => run_report(&args, ReportKind::Regions, Granularity::Day).await,
        Commands::Products(args) => {
            run_report(&args, ReportKind::Products, Granularity::Day).await
        }
        Commands::Trends(command) => command.run().await,
        Commands::Demographics(args) => {
            run_report(&args, ReportKind::Demographics, Granularity::Day).await
        }
        Commands::Export(command) => command.run().await,
        Commands::Migrate(command) => command.run().await,
    }
}
