//! Analysis result types
//!
//! Transient values built fresh for each request and handed to the formatters.

use super::filters::DateRange;
use super::money::Centavos;
use crate::utils::time::{BucketKey, Granularity};
use serde::Serialize;

/// Grouped summary row for one key (brand, category, region, ...)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    pub group_key: String,
    pub revenue: Centavos,
    pub transaction_count: u64,
    pub units_sold: i64,
    pub market_share_percent: f64,
    pub growth_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_client: Option<bool>,
    /// Brand of the product, on product rankings only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
}

/// Revenue split between the client's brands and competitors
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClientShare {
    pub client_revenue: Centavos,
    pub competitor_revenue: Centavos,
    pub client_share_percent: f64,
    pub competitor_share_percent: f64,
}

/// Which field a performance report is grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Brand,
    Category,
    Region,
    Product,
    Gender,
    AgeBand,
}

impl Dimension {
    pub fn display_name(&self) -> &'static str {
        match self {
            Dimension::Brand => "Brand",
            Dimension::Category => "Category",
            Dimension::Region => "Region",
            Dimension::Product => "Product",
            Dimension::Gender => "Gender",
            Dimension::AgeBand => "Age Band",
        }
    }
}

/// Revenue ranking for one dimension
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub dimension: Dimension,
    pub total_revenue: Centavos,
    pub total_transactions: u64,
    pub total_units: i64,
    /// All groups, ranked by revenue (ties by key)
    pub results: Vec<AggregationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_share: Option<ClientShare>,
}

impl PerformanceReport {
    pub fn empty(dimension: Dimension) -> Self {
        Self {
            dimension,
            total_revenue: Centavos::ZERO,
            total_transactions: 0,
            total_units: 0,
            results: Vec::new(),
            client_share: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// One bucket of a time series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub bucket: BucketKey,
    pub label: String,
    pub revenue: Centavos,
    pub transaction_count: u64,
    pub units_sold: i64,
    pub avg_transaction_value: Centavos,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesReport {
    pub granularity: Granularity,
    pub total_revenue: Centavos,
    pub total_transactions: u64,
    /// Chronological
    pub points: Vec<TimeSeriesPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_date: Option<String>,
}

/// Headline KPIs for a period with growth against the previous period
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<DateRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_period: Option<DateRange>,
    pub total_revenue: Centavos,
    pub transaction_count: u64,
    pub avg_transaction_value: Centavos,
    /// Approximated by age/gender/store composite; see `Transaction::customer_key`
    pub unique_customers: u64,
    pub units_sold: i64,
    pub revenue_growth: f64,
    pub transaction_growth: f64,
    pub customer_growth: f64,
    pub avg_value_growth: f64,
}

/// Shopper profile breakdowns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemographicsReport {
    pub by_gender: PerformanceReport,
    pub by_age_band: PerformanceReport,
}
