//! Headline KPIs with period-over-period growth

use super::performance::{distinct_transactions, PerformanceAnalyser};
use super::temporal::average_value;
use crate::types::analysis_results::{DemographicsReport, Dimension, KpiSummary};
use crate::types::{Centavos, DateRange, SaleLine};
use crate::utils::math::growth_percent;
use std::collections::HashSet;

struct PeriodTotals {
    revenue: Centavos,
    transactions: u64,
    customers: u64,
    units: i64,
}

impl PeriodTotals {
    fn of(lines: &[SaleLine]) -> Self {
        Self {
            revenue: lines.iter().map(|l| l.revenue).sum(),
            transactions: distinct_transactions(lines),
            customers: lines
                .iter()
                .map(|l| l.customer_key.as_str())
                .collect::<HashSet<_>>()
                .len() as u64,
            units: lines.iter().map(|l| l.quantity).sum(),
        }
    }

    fn avg_value(&self) -> Centavos {
        average_value(self.revenue, self.transactions)
    }
}

pub struct SummaryAnalyser;

impl SummaryAnalyser {
    /// KPI totals for `lines`, with growth against `previous`
    ///
    /// Growth figures are 0 when the previous period has nothing to compare to.
    pub fn summarise(
        lines: &[SaleLine],
        previous: &[SaleLine],
        period: Option<DateRange>,
    ) -> KpiSummary {
        let now = PeriodTotals::of(lines);
        let before = PeriodTotals::of(previous);

        KpiSummary {
            period,
            previous_period: period.map(|p| p.previous()),
            total_revenue: now.revenue,
            transaction_count: now.transactions,
            avg_transaction_value: now.avg_value(),
            unique_customers: now.customers,
            units_sold: now.units,
            revenue_growth: growth_percent(now.revenue.0, before.revenue.0),
            transaction_growth: growth_percent(now.transactions as i64, before.transactions as i64),
            customer_growth: growth_percent(now.customers as i64, before.customers as i64),
            avg_value_growth: growth_percent(now.avg_value().0, before.avg_value().0),
        }
    }

    /// Revenue by gender and by age band
    pub fn demographics(lines: &[SaleLine], previous: Option<&[SaleLine]>) -> DemographicsReport {
        DemographicsReport {
            by_gender: PerformanceAnalyser::analyse(lines, previous, Dimension::Gender),
            by_age_band: PerformanceAnalyser::analyse(lines, previous, Dimension::AgeBand),
        }
    }
}
