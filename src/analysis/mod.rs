//! Analytics over the Scout retail dataset
//!
//! The [`AnalyticsEngine`] fetches the four entity tables from a row source,
//! joins items to their transaction, product and brand, applies the dashboard
//! filters, and hands the joined lines to the analysers:
//!
//! - **Performance** - brand, category and region rankings with market share
//! - **Temporal** - hour-of-day, daily, weekly and monthly series
//! - **Summary** - headline KPIs and growth against the previous period
//! - **Demographics** - revenue by gender and age band
//!
//! Every call reads fresh rows; nothing is cached between requests.
//!
//! ## Usage
//!
//! ```no_run
//! use scout_analytics::analysis::AnalyticsEngine;
//! use scout_analytics::source::{FetchOptions, MemorySource};
//! use scout_analytics::types::FilterSpec;
//! use std::sync::Arc;
//!
//! async fn example() -> scout_analytics::errors::AppResult<()> {
//!     let source = Arc::new(MemorySource::from_json_file("fixtures/scout_mock.json".as_ref())?);
//!     let engine = AnalyticsEngine::new(source, FetchOptions::default());
//!
//!     let brands = engine.brand_performance(&FilterSpec::default()).await?;
//!     println!("{} brands", brands.results.len());
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod derived;
pub mod performance;
pub mod reports;
pub mod summary;
pub mod temporal;

pub use aggregate::{aggregate_by_key, GroupedMetrics, Reducer};
pub use derived::{market_share_percent, top_n};
pub use performance::PerformanceAnalyser;
pub use reports::{OutputFormat, ReportFormatter};
pub use summary::SummaryAnalyser;
pub use temporal::TemporalAnalyser;

use crate::errors::AppResult;
use crate::source::{
    fetch_records, FetchOptions, RowSource, TableQuery, BRANDS_TABLE, PRODUCTS_TABLE,
    TRANSACTIONS_TABLE, TRANSACTION_ITEMS_TABLE,
};
use crate::types::analysis_results::{
    DemographicsReport, Dimension, KpiSummary, PerformanceReport, TimeSeriesReport,
};
use crate::types::{Dataset, FilterSpec, SaleLine};
use crate::utils::time::{Granularity, TimeBucketer};
use std::sync::Arc;
use tracing::{debug, warn};

/// Filtered, joined lines of one request
#[derive(Debug, Clone, Default)]
pub struct LoadedLines {
    pub lines: Vec<SaleLine>,
    /// False when a best-effort fetch stopped early
    pub complete: bool,
    pub warnings: Vec<String>,
}

/// Main analytics engine
pub struct AnalyticsEngine {
    source: Arc<dyn RowSource>,
    options: FetchOptions,
    bucketer: TimeBucketer,
    top_n: Option<usize>,
}

impl AnalyticsEngine {
    pub fn new(source: Arc<dyn RowSource>, options: FetchOptions) -> Self {
        Self {
            source,
            options,
            bucketer: TimeBucketer::utc(),
            top_n: None,
        }
    }

    /// Bucket and filter dates in this reference timezone
    pub fn with_bucketer(mut self, bucketer: TimeBucketer) -> Self {
        self.bucketer = bucketer;
        self
    }

    /// Keep only the best `n` groups in performance reports
    pub fn with_top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    pub fn bucketer(&self) -> &TimeBucketer {
        &self.bucketer
    }

    /// Fetch the four entity tables, pushing date and store filters down
    pub async fn fetch_dataset(&self, filters: &FilterSpec) -> AppResult<(Dataset, LoadedLines)> {
        let source = self.source.as_ref();
        let transactions_query = TableQuery::new(TRANSACTIONS_TABLE)
            .with_filters(filters.transaction_filters(&self.bucketer));

        let transactions =
            fetch_records(source, &transactions_query, &self.options).await?;
        let items =
            fetch_records(source, &TableQuery::new(TRANSACTION_ITEMS_TABLE), &self.options).await?;
        let products =
            fetch_records(source, &TableQuery::new(PRODUCTS_TABLE), &self.options).await?;
        let brands = fetch_records(source, &TableQuery::new(BRANDS_TABLE), &self.options).await?;

        let status = LoadedLines {
            lines: Vec::new(),
            complete: transactions.complete && items.complete && products.complete && brands.complete,
            warnings: [
                transactions.warning,
                items.warning,
                products.warning,
                brands.warning,
            ]
            .into_iter()
            .flatten()
            .collect(),
        };

        let dataset = Dataset {
            transactions: transactions.records,
            transaction_items: items.records,
            products: products.records,
            brands: brands.records,
        };
        Ok((dataset, status))
    }

    /// Joined lines matching every filter
    pub async fn load_lines(&self, filters: &FilterSpec) -> AppResult<LoadedLines> {
        let (dataset, mut loaded) = self.fetch_dataset(filters).await?;
        let joined = dataset.sale_lines();
        let total = joined.len();

        loaded.lines = joined
            .into_iter()
            .filter(|line| filters.matches(line, &self.bucketer))
            .collect();

        debug!("{} of {} sale lines match filters", loaded.lines.len(), total);
        for warning in &loaded.warnings {
            warn!("{}", warning);
        }
        Ok(loaded)
    }

    /// Lines for the comparison period, when the filters name a date range
    async fn load_previous(&self, filters: &FilterSpec) -> AppResult<Option<Vec<SaleLine>>> {
        let Some(range) = filters.date_range else {
            return Ok(None);
        };
        let previous = filters.clone().with_date_range(range.previous());
        Ok(Some(self.load_lines(&previous).await?.lines))
    }

    async fn performance(
        &self,
        filters: &FilterSpec,
        dimension: Dimension,
    ) -> AppResult<PerformanceReport> {
        let current = self.load_lines(filters).await?;
        let previous = self.load_previous(filters).await?;
        let mut report =
            PerformanceAnalyser::analyse(&current.lines, previous.as_deref(), dimension);
        if let Some(n) = self.top_n {
            report.results = top_n(report.results, n);
        }
        Ok(report)
    }

    pub async fn brand_performance(&self, filters: &FilterSpec) -> AppResult<PerformanceReport> {
        self.performance(filters, Dimension::Brand).await
    }

    pub async fn category_performance(
        &self,
        filters: &FilterSpec,
    ) -> AppResult<PerformanceReport> {
        self.performance(filters, Dimension::Category).await
    }

    pub async fn region_performance(&self, filters: &FilterSpec) -> AppResult<PerformanceReport> {
        self.performance(filters, Dimension::Region).await
    }

    /// Product mix ranking; each row carries its product's brand
    pub async fn product_performance(&self, filters: &FilterSpec) -> AppResult<PerformanceReport> {
        self.performance(filters, Dimension::Product).await
    }

    pub async fn time_series(
        &self,
        filters: &FilterSpec,
        granularity: Granularity,
    ) -> AppResult<TimeSeriesReport> {
        let loaded = self.load_lines(filters).await?;
        Ok(TemporalAnalyser::analyse(
            &loaded.lines,
            granularity,
            &self.bucketer,
        ))
    }

    pub async fn summary(&self, filters: &FilterSpec) -> AppResult<KpiSummary> {
        let current = self.load_lines(filters).await?;
        let previous = self.load_previous(filters).await?.unwrap_or_default();
        Ok(SummaryAnalyser::summarise(
            &current.lines,
            &previous,
            filters.date_range,
        ))
    }

    pub async fn demographics(&self, filters: &FilterSpec) -> AppResult<DemographicsReport> {
        let current = self.load_lines(filters).await?;
        let previous = self.load_previous(filters).await?;
        Ok(SummaryAnalyser::demographics(
            &current.lines,
            previous.as_deref(),
        ))
    }
}
