use crate::analysis::{AnalyticsEngine, OutputFormat, ReportFormatter};
use crate::config::{AppConfig, SourceKind};
use crate::errors::{AppError, AppResult};
use crate::source::{self, retry_with_backoff, FetchOptions};
use crate::types::{DateRange, FilterSpec};
use crate::utils::time::{Granularity, TimeBucketer};
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use tracing::info;

// ===== Helper Functions =====

/// Get database path from CLI argument or config file
pub(crate) fn get_db_path_from_config(cli_path: &Option<PathBuf>, app_config: &AppConfig) -> String {
    match cli_path {
        Some(path) => path.to_string_lossy().to_string(),
        None => app_config.database.default_path.to_string_lossy().to_string(),
    }
}

/// Parse output format string to OutputFormat enum
pub(crate) fn parse_format(format_str: &str) -> AppResult<OutputFormat> {
    format_str.parse()
}

/// Write output to file with safe directory creation
pub(crate) fn write_output_to_file(path: &PathBuf, content: &str, description: &str) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    println!("{} written to: {}", description, path.display());
    Ok(())
}

// ===== Shared Arguments =====

/// Where rows are read from
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Row source: supabase, sqlite or mock (overrides config.toml)
    #[arg(long)]
    pub source: Option<SourceKind>,

    /// SQLite database path (overrides config.toml)
    #[arg(long)]
    pub database_path: Option<PathBuf>,

    /// Mock dataset fixture (overrides config.toml)
    #[arg(long)]
    pub fixture: Option<PathBuf>,

    /// Rows requested per page (overrides config.toml)
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Pages fetched concurrently (overrides config.toml)
    #[arg(long)]
    pub concurrent_pages: Option<usize>,

    /// Keep the rows read so far when a later page fails
    #[arg(long)]
    pub best_effort: bool,
}

impl SourceArgs {
    /// Configuration with command-line overrides applied
    pub fn resolve_config(&self) -> AppResult<AppConfig> {
        let mut config = AppConfig::get_defaults()?;
        if let Some(kind) = self.source {
            config.source.kind = kind;
        }
        config.database.default_path = PathBuf::from(get_db_path_from_config(
            &self.database_path,
            &config,
        ));
        if let Some(fixture) = &self.fixture {
            config.mock.fixture_path = fixture.clone();
        }
        if let Some(page_size) = self.page_size {
            config.source.page_size = page_size;
        }
        if let Some(concurrent) = self.concurrent_pages {
            config.source.concurrent_pages = concurrent;
        }
        if self.best_effort {
            config.source.best_effort = true;
        }

        if config.source.kind == SourceKind::Supabase && config.source.api_key.is_empty() {
            return Err(AppError::Config(
                "Supabase source selected but no API key configured. Set SUPABASE_ANON_KEY or source.api_key in config.toml".to_string(),
            ));
        }
        Ok(config)
    }
}

/// Dashboard filters
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// First day of the period (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day of the period (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Region(s), comma-separated or repeated
    #[arg(long, value_delimiter = ',')]
    pub region: Vec<String>,

    /// Brand(s), comma-separated or repeated
    #[arg(long, value_delimiter = ',')]
    pub brand: Vec<String>,

    /// Category(ies), comma-separated or repeated
    #[arg(long, value_delimiter = ',')]
    pub category: Vec<String>,

    /// Store id(s), comma-separated or repeated
    #[arg(long, value_delimiter = ',')]
    pub store: Vec<String>,

    /// Product name(s) or id(s), comma-separated or repeated
    #[arg(long, value_delimiter = ',')]
    pub product: Vec<String>,

    /// Customer gender(s): male, female, other or unknown
    #[arg(long, value_delimiter = ',')]
    pub gender: Vec<String>,

    /// Age band(s): "Under 18", 18-24, 25-34, 35-44, 45-54, 55+ or Unknown
    #[arg(long, value_delimiter = ',')]
    pub age_band: Vec<String>,
}

impl FilterArgs {
    pub fn to_filter_spec(&self) -> AppResult<FilterSpec> {
        let date_range = match (self.from, self.to) {
            (Some(start), Some(end)) if start > end => {
                return Err(AppError::Config(format!(
                    "--from {} is after --to {}",
                    start, end
                )))
            }
            (Some(start), Some(end)) => Some(DateRange::new(start, end)),
            (None, None) => None,
            _ => {
                return Err(AppError::Config(
                    "--from and --to must be given together".to_string(),
                ))
            }
        };

        Ok(FilterSpec {
            date_range,
            regions: self.region.clone(),
            brands: self.brand.clone(),
            categories: self.category.clone(),
            stores: self.store.clone(),
            products: self.product.clone(),
            genders: self.gender.clone(),
            age_bands: self.age_band.clone(),
        })
    }
}

/// Arguments shared by every report command
#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Output format (console, json, csv or html)
    #[arg(long, default_value = "console")]
    pub format: String,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Keep only the best N groups in rankings (overrides config.toml)
    #[arg(long)]
    pub top_n: Option<usize>,
}

// ===== Report Dispatch =====

/// Which report a command produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    Summary,
    Brands,
    Categories,
    Regions,
    Products,
    Trends,
    Demographics,
}

impl ReportKind {
    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::Summary => "summary",
            ReportKind::Brands => "brands",
            ReportKind::Categories => "categories",
            ReportKind::Regions => "regions",
            ReportKind::Products => "products",
            ReportKind::Trends => "trends",
            ReportKind::Demographics => "demographics",
        }
    }
}

/// Engine configured from `config`, with the ranking cap applied
pub fn build_engine(config: &AppConfig, top_n: Option<usize>) -> AppResult<AnalyticsEngine> {
    let source = source::from_config(config)?;
    let bucketer = TimeBucketer::from_offset_minutes(config.analytics.utc_offset_minutes)
        .ok_or_else(|| {
            AppError::Config(format!(
                "analytics.utc_offset_minutes {} is out of range",
                config.analytics.utc_offset_minutes
            ))
        })?;

    let engine = AnalyticsEngine::new(source, FetchOptions::from(&config.source))
        .with_bucketer(bucketer);
    Ok(match top_n.unwrap_or(config.analytics.top_n) {
        0 => engine,
        n => engine.with_top_n(n),
    })
}

/// Fetch, aggregate and format one report
pub async fn render_report(
    engine: &AnalyticsEngine,
    kind: ReportKind,
    granularity: Granularity,
    filters: &FilterSpec,
    format: &OutputFormat,
) -> AppResult<String> {
    match kind {
        ReportKind::Summary => {
            ReportFormatter::format_summary(&engine.summary(filters).await?, format)
        }
        ReportKind::Brands => {
            ReportFormatter::format_performance(&engine.brand_performance(filters).await?, format)
        }
        ReportKind::Categories => ReportFormatter::format_performance(
            &engine.category_performance(filters).await?,
            format,
        ),
        ReportKind::Regions => {
            ReportFormatter::format_performance(&engine.region_performance(filters).await?, format)
        }
        ReportKind::Products => ReportFormatter::format_performance(
            &engine.product_performance(filters).await?,
            format,
        ),
        ReportKind::Trends => ReportFormatter::format_time_series(
            &engine.time_series(filters, granularity).await?,
            format,
        ),
        ReportKind::Demographics => {
            ReportFormatter::format_demographics(&engine.demographics(filters).await?, format)
        }
    }
}

/// Run a report command: print to stdout or write to `--output`
pub async fn run_report(
    args: &ReportArgs,
    kind: ReportKind,
    granularity: Granularity,
) -> AppResult<()> {
    let formatted = produce_report(args, kind, granularity).await?;
    match &args.output {
        Some(path) => write_output_to_file(path, &formatted, "Report"),
        None => {
            print!("{}", formatted);
            Ok(())
        }
    }
}

/// Formatted report text, retried as a whole on transient source failures
pub async fn produce_report(
    args: &ReportArgs,
    kind: ReportKind,
    granularity: Granularity,
) -> AppResult<String> {
    let config = args.source.resolve_config()?;
    let format = parse_format(&args.format)?;
    let filters = args.filters.to_filter_spec()?;
    let engine = build_engine(&config, args.top_n)?;
    info!(
        "Running {} report from {:?} source",
        kind.name(),
        config.source.kind
    );

    let engine = &engine;
    let filters = &filters;
    let format = &format;
    retry_with_backoff(&config.retry, kind.name(), move || {
        render_report(engine, kind, granularity, filters, format)
    })
    .await
}

// ===== Command Definitions =====

/// Time series report
#[derive(Args, Debug, Clone)]
pub struct TrendsCommand {
    /// Bucket size: hour, day, week or month
    #[arg(long, default_value = "day")]
    pub granularity: Granularity,

    #[command(flatten)]
    pub report: ReportArgs,
}

impl TrendsCommand {
    pub async fn run(&self) -> AppResult<()> {
        run_report(&self.report, ReportKind::Trends, self.granularity).await
    }
}

/// Export a report to a file (CSV by default)
#[derive(Args, Debug, Clone)]
pub struct ExportCommand {
    /// Report to export
    #[arg(long, value_enum, default_value = "brands")]
    pub report: ReportKind,

    /// Bucket size for trends exports
    #[arg(long, default_value = "day")]
    pub granularity: Granularity,

    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Output format (csv, json, html or console)
    #[arg(long, default_value = "csv")]
    pub format: String,

    /// Output file path
    /// Default: ./exports/scout_<report>.<ext>
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Keep only the best N groups in rankings (overrides config.toml)
    #[arg(long)]
    pub top_n: Option<usize>,
}

impl ExportCommand {
    pub fn default_path(&self, format: &OutputFormat) -> PathBuf {
        PathBuf::from(format!(
            "./exports/scout_{}.{}",
            self.report.name(),
            format.extension()
        ))
    }

    pub async fn run(&self) -> AppResult<()> {
        let args = ReportArgs {
            source: self.source.clone(),
            filters: self.filters.clone(),
            format: self.format.clone(),
            output: None,
            top_n: self.top_n,
        };
        let format = parse_format(&self.format)?;
        let formatted = produce_report(&args, self.report, self.granularity).await?;

        let path = self
            .output
            .clone()
            .unwrap_or_else(|| self.default_path(&format));
        write_output_to_file(&path, &formatted, "Export")
    }
}
