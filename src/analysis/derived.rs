//! Post-fold derived metrics
//!
//! Market share, growth and top-N ranking are computed from finished group
//! totals, never during the fold.

use super::aggregate::GroupedMetrics;
use crate::types::analysis_results::AggregationResult;
use crate::types::Centavos;
use crate::utils::math::{apportion_percent, growth_percent, share_percent};
use std::cmp::Ordering;

/// Reducer names shared by the analysers
pub const REVENUE: &str = "revenue";
pub const TRANSACTIONS: &str = "transactions";
pub const UNITS: &str = "units";
pub const CUSTOMERS: &str = "customers";

/// Group revenue as a percentage of the result set's total, one decimal
pub fn market_share_percent(group_revenue: Centavos, total_revenue: Centavos) -> f64 {
    share_percent(group_revenue.0, total_revenue.0)
}

/// Revenue growth against a previous period, zero when there was none
pub fn revenue_growth_percent(current: Centavos, previous: Centavos) -> f64 {
    growth_percent(current.0, previous.0)
}

/// Rank by revenue descending; ties by ascending group key
pub fn compare_by_revenue(a: &AggregationResult, b: &AggregationResult) -> Ordering {
    b.revenue
        .cmp(&a.revenue)
        .then_with(|| a.group_key.cmp(&b.group_key))
}

/// Stable, deterministic top-N selection
pub fn top_n(mut results: Vec<AggregationResult>, n: usize) -> Vec<AggregationResult> {
    results.sort_by(compare_by_revenue);
    results.truncate(n);
    results
}

/// Turn a keyed fold into result rows with share and growth
///
/// `grouped` must carry the [`REVENUE`], [`TRANSACTIONS`] and [`UNITS`] reducers;
/// `previous` is the same fold over the comparison period. Rows keep the fold's
/// first-seen order. Shares are apportioned so the full set sums to 100.0.
pub fn to_results(
    grouped: &GroupedMetrics<String>,
    previous: Option<&GroupedMetrics<String>>,
) -> Vec<AggregationResult> {
    let revenues: Vec<i64> = grouped.iter().map(|g| g.metrics.value(REVENUE)).collect();
    let shares = apportion_percent(&revenues);

    grouped
        .iter()
        .zip(shares)
        .map(|(group, share)| {
            let revenue = Centavos(group.metrics.value(REVENUE));
            let previous_revenue = previous
                .and_then(|p| p.get(&group.key))
                .map(|m| Centavos(m.value(REVENUE)))
                .unwrap_or(Centavos::ZERO);

            AggregationResult {
                group_key: group.key.clone(),
                revenue,
                transaction_count: group.metrics.value(TRANSACTIONS).max(0) as u64,
                units_sold: group.metrics.value(UNITS),
                market_share_percent: share,
                growth_percent: revenue_growth_percent(revenue, previous_revenue),
                is_client: None,
                brand: None,
            }
        })
        .collect()
}
