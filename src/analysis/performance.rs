//! Revenue ranking by brand, category, region and shopper profile
//!
//! Every report is computed from joined sale lines: revenue is the sum of
//! `quantity * unit_price`, transactions are distinct transaction ids within a
//! group, units are summed quantities.

use super::aggregate::{aggregate_by_key, GroupedMetrics, Reducer};
use super::derived::{compare_by_revenue, to_results, REVENUE, TRANSACTIONS, UNITS};
use crate::types::analysis_results::{ClientShare, Dimension, PerformanceReport};
use crate::types::{Centavos, SaleLine, UNKNOWN};
use crate::utils::math::apportion_percent;
use std::collections::{HashMap, HashSet};

/// Reducers shared by every line-based report
pub fn line_reducers<'a>() -> Vec<Reducer<'a, SaleLine>> {
    vec![
        Reducer::sum(REVENUE, |l: &SaleLine| l.revenue.0),
        Reducer::count_distinct(TRANSACTIONS, |l: &SaleLine| l.transaction_id.clone()),
        Reducer::sum(UNITS, |l: &SaleLine| l.quantity),
    ]
}

/// Group key of a line for one dimension
pub fn dimension_key(line: &SaleLine, dimension: Dimension) -> String {
    match dimension {
        Dimension::Brand => line.brand.clone(),
        Dimension::Category => line.category.clone(),
        Dimension::Region => line.region.clone(),
        Dimension::Product => line.product_name.clone(),
        Dimension::Gender => gender_label(line.customer_gender.as_deref()),
        Dimension::AgeBand => age_band(line.customer_age).to_string(),
    }
}

/// Normalised gender label; blanks and unrecognised values are Unknown
pub fn gender_label(gender: Option<&str>) -> String {
    match gender.map(|g| g.trim().to_lowercase()).as_deref() {
        Some("m") | Some("male") => "Male".to_string(),
        Some("f") | Some("female") => "Female".to_string(),
        Some("") | None => UNKNOWN.to_string(),
        Some(_) => "Other".to_string(),
    }
}

/// Age band of a shopper
pub fn age_band(age: Option<u32>) -> &'static str {
    match age {
        None => UNKNOWN,
        Some(0..=17) => "Under 18",
        Some(18..=24) => "18-24",
        Some(25..=34) => "25-34",
        Some(35..=44) => "35-44",
        Some(45..=54) => "45-54",
        Some(_) => "55+",
    }
}

/// Performance analyser over joined sale lines
pub struct PerformanceAnalyser;

impl PerformanceAnalyser {
    /// Rank groups of one dimension by revenue with share and period growth
    ///
    /// `previous` holds the comparison period's lines; growth is 0 for every
    /// group when it is `None` or when the group had no previous revenue.
    pub fn analyse(
        lines: &[SaleLine],
        previous: Option<&[SaleLine]>,
        dimension: Dimension,
    ) -> PerformanceReport {
        if lines.is_empty() {
            return PerformanceReport::empty(dimension);
        }

        let reducers = line_reducers();
        let current = group_lines(lines, dimension, &reducers);
        let before = previous.map(|p| group_lines(p, dimension, &reducers));

        let mut results = to_results(&current, before.as_ref());

        let client_share = if dimension == Dimension::Brand {
            let flags = client_flags(lines);
            for result in &mut results {
                result.is_client = flags.get(result.group_key.as_str()).copied();
            }
            Some(client_share(lines))
        } else {
            None
        };

        if dimension == Dimension::Product {
            let brands = product_brands(lines);
            for result in &mut results {
                result.brand = brands.get(result.group_key.as_str()).map(|b| b.to_string());
            }
        }

        results.sort_by(compare_by_revenue);

        PerformanceReport {
            dimension,
            total_revenue: Centavos(current.total(REVENUE)),
            total_transactions: distinct_transactions(lines),
            total_units: current.total(UNITS),
            results,
            client_share,
        }
    }

    pub fn analyse_brands(lines: &[SaleLine], previous: Option<&[SaleLine]>) -> PerformanceReport {
        Self::analyse(lines, previous, Dimension::Brand)
    }

    pub fn analyse_categories(
        lines: &[SaleLine],
        previous: Option<&[SaleLine]>,
    ) -> PerformanceReport {
        Self::analyse(lines, previous, Dimension::Category)
    }

    pub fn analyse_regions(lines: &[SaleLine], previous: Option<&[SaleLine]>) -> PerformanceReport {
        Self::analyse(lines, previous, Dimension::Region)
    }

    /// Product mix: each product's revenue, units and share, with its brand
    pub fn analyse_products(
        lines: &[SaleLine],
        previous: Option<&[SaleLine]>,
    ) -> PerformanceReport {
        Self::analyse(lines, previous, Dimension::Product)
    }
}

fn group_lines(
    lines: &[SaleLine],
    dimension: Dimension,
    reducers: &[Reducer<'_, SaleLine>],
) -> GroupedMetrics<String> {
    aggregate_by_key(lines, |l: &SaleLine| dimension_key(l, dimension), reducers)
}

/// Distinct transactions across all lines; a basket spanning two groups counts once
pub fn distinct_transactions(lines: &[SaleLine]) -> u64 {
    lines
        .iter()
        .map(|l| l.transaction_id.as_str())
        .collect::<HashSet<_>>()
        .len() as u64
}

fn client_flags(lines: &[SaleLine]) -> HashMap<&str, bool> {
    let mut flags = HashMap::new();
    for line in lines {
        flags.entry(line.brand.as_str()).or_insert(line.is_client);
    }
    flags
}

fn product_brands(lines: &[SaleLine]) -> HashMap<&str, &str> {
    let mut brands = HashMap::new();
    for line in lines {
        brands
            .entry(line.product_name.as_str())
            .or_insert(line.brand.as_str());
    }
    brands
}

/// Client versus competitor revenue split
pub fn client_share(lines: &[SaleLine]) -> ClientShare {
    let (client, competitor): (Vec<&SaleLine>, Vec<&SaleLine>) =
        lines.iter().partition(|l| l.is_client);
    let client_revenue: Centavos = client.iter().map(|l| l.revenue).sum();
    let competitor_revenue: Centavos = competitor.iter().map(|l| l.revenue).sum();
    let shares = apportion_percent(&[client_revenue.0, competitor_revenue.0]);

    ClientShare {
        client_revenue,
        competitor_revenue,
        client_share_percent: shares[0],
        competitor_share_percent: shares[1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn line(tx: &str, brand: &str, client: bool, qty: i64, price: i64) -> SaleLine {
        SaleLine {
            transaction_id: tx.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap(),
            store_id: Some("1".to_string()),
            region: "NCR".to_string(),
            customer_key: "30|female|1".to_string(),
            customer_age: Some(30),
            customer_gender: Some("F".to_string()),
            product_id: format!("{}-p", brand),
            product_name: format!("{} product", brand),
            category: "Beverages".to_string(),
            brand: brand.to_string(),
            is_client: client,
            quantity: qty,
            revenue: Centavos(qty * price),
        }
    }

    #[test]
    fn test_brand_report_ranks_and_conserves_total() {
        let lines = vec![
            line("t1", "Alaska", true, 2, 500),
            line("t1", "Milo", false, 1, 3000),
            line("t2", "Alaska", true, 1, 500),
        ];
        let report = PerformanceAnalyser::analyse_brands(&lines, None);

        assert_eq!(report.results[0].group_key, "Milo");
        assert_eq!(report.results[1].is_client, Some(true));
        assert_eq!(report.results[1].transaction_count, 2);
        assert_eq!(report.total_transactions, 2);
        assert_eq!(report.total_units, 4);

        let sum: Centavos = report.results.iter().map(|r| r.revenue).sum();
        assert_eq!(sum, report.total_revenue);

        let share = report.client_share.unwrap();
        assert_eq!(share.client_revenue, Centavos(1500));
        assert_eq!(share.client_share_percent, 33.3);
        assert_eq!(share.competitor_share_percent, 66.7);
    }

    #[test]
    fn test_growth_against_previous_period() {
        let current = vec![line("t1", "Alaska", true, 3, 100)];
        let previous = vec![line("t0", "Alaska", true, 2, 100)];
        let report = PerformanceAnalyser::analyse_brands(&current, Some(previous.as_slice()));
        assert_eq!(report.results[0].growth_percent, 50.0);

        let report = PerformanceAnalyser::analyse_brands(&current, Some(&[][..]));
        assert_eq!(report.results[0].growth_percent, 0.0);
    }

    #[test]
    fn test_product_mix_carries_brand() {
        let mut lines = vec![
            line("t1", "Alaska", true, 2, 3250),
            line("t2", "Milo", false, 10, 950),
            line("t3", "Alaska", true, 1, 3250),
        ];
        lines[2].product_name = "Alaska Condensada".to_string();

        let report = PerformanceAnalyser::analyse_products(&lines, None);
        assert_eq!(report.dimension, Dimension::Product);
        assert!(report.client_share.is_none());
        let keys: Vec<&str> = report.results.iter().map(|r| r.group_key.as_str()).collect();
        assert_eq!(keys, vec!["Milo product", "Alaska product", "Alaska Condensada"]);
        assert_eq!(report.results[0].brand.as_deref(), Some("Milo"));
        assert_eq!(report.results[2].brand.as_deref(), Some("Alaska"));
        assert_eq!(report.results[0].units_sold, 10);
        assert!(report.results.iter().all(|r| r.is_client.is_none()));

        let brands = PerformanceAnalyser::analyse_brands(&lines, None);
        assert!(brands.results.iter().all(|r| r.brand.is_none()));
    }

    #[test]
    fn test_empty_lines_give_empty_report() {
        let report = PerformanceAnalyser::analyse_regions(&[], None);
        assert!(report.is_empty());
        assert_eq!(report.total_revenue, Centavos::ZERO);
        assert!(report.client_share.is_none());
    }

    #[test]
    fn test_share_sums_to_hundred() {
        let lines: Vec<SaleLine> = (0..21)
            .map(|i| line(&format!("t{}", i), &format!("Brand {:02}", i), i % 2 == 0, 1, 100 + i))
            .collect();
        let report = PerformanceAnalyser::analyse_brands(&lines, None);
        assert_eq!(report.results.len(), 21);
        let total: f64 = report.results.iter().map(|r| r.market_share_percent).sum();
        assert!((total - 100.0).abs() <= 0.1, "total = {}", total);

        let split = report.client_share.unwrap();
        assert!((split.client_share_percent + split.competitor_share_percent - 100.0).abs() <= 0.1);
    }

    #[test]
    fn test_profile_labels() {
        assert_eq!(gender_label(Some(" female ")), "Female");
        assert_eq!(gender_label(Some("M")), "Male");
        assert_eq!(gender_label(Some("")), UNKNOWN);
        assert_eq!(gender_label(Some("nonbinary")), "Other");
        assert_eq!(age_band(Some(17)), "Under 18");
        assert_eq!(age_band(Some(34)), "25-34");
        assert_eq!(age_band(Some(70)), "55+");
        assert_eq!(age_band(None), UNKNOWN);
    }
}
