//! Aggregation properties over joined sale lines

use crate::common::{ab_dataset, two_week_dataset};
use scout_analytics::analysis::aggregate::{aggregate_by_key, Reducer};
use scout_analytics::analysis::{top_n, PerformanceAnalyser, SummaryAnalyser, TemporalAnalyser};
use scout_analytics::types::analysis_results::Dimension;
use scout_analytics::types::{Centavos, DateRange, SaleLine};
use scout_analytics::utils::time::{Granularity, TimeBucketer};
use chrono::NaiveDate;

fn june(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

fn lines_between(lines: &[SaleLine], range: DateRange) -> Vec<SaleLine> {
    lines
        .iter()
        .filter(|l| range.contains(l.timestamp.date_naive()))
        .cloned()
        .collect()
}

#[test]
fn test_ab_market_share() {
    let lines = ab_dataset().sale_lines();
    let report = PerformanceAnalyser::analyse_brands(&lines, None);

    assert_eq!(report.total_revenue, Centavos(45_000));
    assert_eq!(report.results[0].group_key, "B");
    assert_eq!(report.results[0].revenue, Centavos(30_000));
    assert_eq!(report.results[0].market_share_percent, 66.7);
    assert_eq!(report.results[1].group_key, "A");
    assert_eq!(report.results[1].revenue, Centavos(15_000));
    assert_eq!(report.results[1].market_share_percent, 33.3);
    assert!(report.results.iter().all(|r| r.growth_percent == 0.0));

    let split = report.client_share.unwrap();
    assert_eq!(split.client_revenue, Centavos(15_000));
    assert_eq!(split.competitor_share_percent, 66.7);
}

#[test]
fn test_revenue_is_conserved_across_dimensions() {
    let lines = two_week_dataset().sale_lines();
    let total: Centavos = lines.iter().map(|l| l.revenue).sum();
    assert_eq!(total, Centavos(41_200));

    for dimension in [
        Dimension::Brand,
        Dimension::Category,
        Dimension::Region,
        Dimension::Gender,
        Dimension::AgeBand,
    ] {
        let report = PerformanceAnalyser::analyse(&lines, None, dimension);
        let sum: Centavos = report.results.iter().map(|r| r.revenue).sum();
        assert_eq!(sum, total, "{:?}", dimension);

        let share: f64 = report.results.iter().map(|r| r.market_share_percent).sum();
        assert!((share - 100.0).abs() <= 0.1, "{:?}: {}", dimension, share);
    }
}

#[test]
fn test_unknown_product_groups_as_unknown() {
    let lines = two_week_dataset().sale_lines();
    let report = PerformanceAnalyser::analyse_categories(&lines, None);
    let unknown = report
        .results
        .iter()
        .find(|r| r.group_key == "Unknown")
        .unwrap();
    assert_eq!(unknown.revenue, Centavos(2_000));
}

#[test]
fn test_regions_from_store_location() {
    let lines = two_week_dataset().sale_lines();
    let report = PerformanceAnalyser::analyse_regions(&lines, None);
    let keys: Vec<&str> = report.results.iter().map(|r| r.group_key.as_str()).collect();
    assert_eq!(keys, vec!["Makati", "Cebu City", "Manila"]);
    assert_eq!(report.results[0].revenue, Centavos(23_300));
    assert_eq!(report.results[1].transaction_count, 2);
}

#[test]
fn test_growth_against_previous_week() {
    let lines = two_week_dataset().sale_lines();
    let week = DateRange::new(june(10), june(16));
    let current = lines_between(&lines, week);
    let previous = lines_between(&lines, week.previous());

    let report = PerformanceAnalyser::analyse_brands(&current, Some(&previous));
    let growth = |brand: &str| {
        report
            .results
            .iter()
            .find(|r| r.group_key == brand)
            .map(|r| r.growth_percent)
            .unwrap()
    };
    assert_eq!(growth("Alaska"), 100.0);
    assert_eq!(growth("Milo"), 150.0);
    assert_eq!(growth("Lucky Me"), -66.7);
    assert_eq!(growth("Unknown"), 0.0);
}

#[test]
fn test_summary_kpis() {
    let lines = two_week_dataset().sale_lines();
    let week = DateRange::new(june(10), june(16));
    let current = lines_between(&lines, week);
    let previous = lines_between(&lines, week.previous());

    let summary = SummaryAnalyser::summarise(&current, &previous, Some(week));
    assert_eq!(summary.total_revenue, Centavos(26_100));
    assert_eq!(summary.transaction_count, 3);
    assert_eq!(summary.avg_transaction_value, Centavos(8_700));
    assert_eq!(summary.unique_customers, 3);
    assert_eq!(summary.revenue_growth, 72.8);
    assert_eq!(summary.transaction_growth, 50.0);
    assert_eq!(summary.customer_growth, 50.0);
    assert_eq!(summary.avg_value_growth, 15.2);
    assert_eq!(summary.previous_period, Some(DateRange::new(june(3), june(9))));
}

#[test]
fn test_demographics_bands() {
    let lines = two_week_dataset().sale_lines();
    let report = SummaryAnalyser::demographics(&lines, None);

    let female = report
        .by_gender
        .results
        .iter()
        .find(|r| r.group_key == "Female")
        .unwrap();
    assert_eq!(female.revenue, Centavos(23_300));
    assert_eq!(female.transaction_count, 2);

    let bands: Vec<&str> = report
        .by_age_band
        .results
        .iter()
        .map(|r| r.group_key.as_str())
        .collect();
    assert!(bands.contains(&"25-34"));
    assert!(bands.contains(&"18-24"));
    assert!(bands.contains(&"Unknown"));
}

#[test]
fn test_weekly_series_is_chronological() {
    let lines = two_week_dataset().sale_lines();
    let report = TemporalAnalyser::analyse(&lines, Granularity::Week, &TimeBucketer::utc());

    assert_eq!(report.points.len(), 2);
    assert_eq!(report.points[0].label, "2024-06-03");
    assert_eq!(report.points[0].revenue, Centavos(15_100));
    assert_eq!(report.points[1].revenue, Centavos(26_100));
    assert_eq!(report.total_revenue, Centavos(41_200));
}

#[test]
fn test_daily_series_is_gap_filled() {
    let lines = two_week_dataset().sale_lines();
    let report = TemporalAnalyser::analyse(&lines, Granularity::Day, &TimeBucketer::utc());

    assert_eq!(report.points.len(), 12);
    assert_eq!(report.first_date.as_deref(), Some("2024-06-03"));
    assert_eq!(report.last_date.as_deref(), Some("2024-06-14"));
    assert_eq!(report.points[1].revenue, Centavos::ZERO);
}

#[test]
fn test_hourly_series_has_24_slots() {
    let lines = two_week_dataset().sale_lines();
    let report = TemporalAnalyser::analyse(&lines, Granularity::Hour, &TimeBucketer::utc());

    assert_eq!(report.points.len(), 24);
    assert_eq!(report.points[8].revenue, Centavos(10_300));
    assert_eq!(report.points[0].transaction_count, 0);
}

#[test]
fn test_aggregation_is_idempotent() {
    let lines = two_week_dataset().sale_lines();
    let reducers = vec![
        Reducer::sum("revenue", |l: &SaleLine| l.revenue.0),
        Reducer::count("lines"),
        Reducer::max("largest", |l: &SaleLine| l.revenue.0),
    ];
    let first = aggregate_by_key(&lines, |l: &SaleLine| l.brand.clone(), &reducers);
    let second = aggregate_by_key(&lines, |l: &SaleLine| l.brand.clone(), &reducers);
    assert_eq!(first, second);
    assert_eq!(first.keys().next().map(String::as_str), Some("Alaska"));
    assert_eq!(first.get(&"Milo".to_string()).unwrap().value("largest"), 9_500);
}

#[test]
fn test_empty_input_is_not_an_error() {
    let report = PerformanceAnalyser::analyse_brands(&[], None);
    assert!(report.is_empty());
    assert_eq!(report.total_revenue, Centavos::ZERO);

    let summary = SummaryAnalyser::summarise(&[], &[], None);
    assert_eq!(summary.avg_transaction_value, Centavos::ZERO);
    assert_eq!(summary.revenue_growth, 0.0);
}

#[test]
fn test_top_n_breaks_ties_by_key() {
    let lines = ab_dataset().sale_lines();
    let mut results = PerformanceAnalyser::analyse_brands(&lines, None).results;
    results[0].revenue = Centavos(15_000);
    let ranked = top_n(results, 1);
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].group_key, "A");
}
