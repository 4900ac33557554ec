//! Sales over time
//!
//! Buckets are computed in the engine's reference timezone. Hour-of-day series
//! always carry all 24 slots; day, week and month series are gap-filled between
//! the first and last bucket so charts get a contiguous axis.

use super::aggregate::aggregate_by_key;
use super::derived::{REVENUE, TRANSACTIONS, UNITS};
use super::performance::{distinct_transactions, line_reducers};
use crate::types::analysis_results::{TimeSeriesPoint, TimeSeriesReport};
use crate::types::{Centavos, SaleLine};
use crate::utils::time::{BucketKey, Granularity, TimeBucketer};
use std::collections::BTreeMap;

/// Average of a revenue total over a transaction count, rounded to the centavo
pub fn average_value(revenue: Centavos, transactions: u64) -> Centavos {
    if transactions == 0 {
        return Centavos::ZERO;
    }
    let n = transactions as i64;
    let half = if revenue.0 >= 0 { n / 2 } else { -(n / 2) };
    Centavos((revenue.0 + half) / n)
}

pub struct TemporalAnalyser;

impl TemporalAnalyser {
    /// Chronological series of revenue, transactions and units
    pub fn analyse(
        lines: &[SaleLine],
        granularity: Granularity,
        bucketer: &TimeBucketer,
    ) -> TimeSeriesReport {
        let reducers = line_reducers();
        let grouped = aggregate_by_key(
            lines,
            |l: &SaleLine| bucketer.bucket_key(l.timestamp, granularity),
            &reducers,
        );

        let mut buckets: BTreeMap<BucketKey, (i64, i64, i64)> = grouped
            .iter()
            .map(|g| {
                (
                    g.key,
                    (
                        g.metrics.value(REVENUE),
                        g.metrics.value(TRANSACTIONS),
                        g.metrics.value(UNITS),
                    ),
                )
            })
            .collect();

        fill_gaps(&mut buckets, granularity);

        let points = buckets
            .into_iter()
            .map(|(bucket, (revenue, transactions, units))| {
                let transactions = transactions.max(0) as u64;
                TimeSeriesPoint {
                    label: bucket.label(),
                    bucket,
                    revenue: Centavos(revenue),
                    transaction_count: transactions,
                    units_sold: units,
                    avg_transaction_value: average_value(Centavos(revenue), transactions),
                }
            })
            .collect();

        let first_date = lines
            .iter()
            .map(|l| l.timestamp)
            .min()
            .map(|t| bucketer.local_date(t).to_string());
        let last_date = lines
            .iter()
            .map(|l| l.timestamp)
            .max()
            .map(|t| bucketer.local_date(t).to_string());

        TimeSeriesReport {
            granularity,
            total_revenue: lines.iter().map(|l| l.revenue).sum(),
            total_transactions: distinct_transactions(lines),
            points,
            first_date,
            last_date,
        }
    }
}

fn fill_gaps(buckets: &mut BTreeMap<BucketKey, (i64, i64, i64)>, granularity: Granularity) {
    if granularity == Granularity::Hour {
        for hour in 0..24 {
            buckets.entry(BucketKey::Hour(hour)).or_insert((0, 0, 0));
        }
        return;
    }

    let (Some(first), Some(last)) = (
        buckets.keys().next().copied(),
        buckets.keys().next_back().copied(),
    ) else {
        return;
    };
    let mut key = first;
    while key < last {
        key = key.next();
        buckets.entry(key).or_insert((0, 0, 0));
    }
}
