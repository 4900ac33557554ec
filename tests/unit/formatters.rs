//! Currency, percent and export formatting

use crate::common::ab_dataset;
use scout_analytics::analysis::reports::table::{to_csv, to_json, to_print_html, to_table};
use scout_analytics::analysis::{OutputFormat, PerformanceAnalyser, ReportFormatter};
use scout_analytics::types::analysis_results::AggregationResult;
use scout_analytics::types::Centavos;
use scout_analytics::utils::currency::{format_currency, format_percent, DisplayValue};

#[test]
fn test_currency_and_percent_display() {
    assert_eq!(format_currency(&DisplayValue::Number(1234.5)), "₱1,235");
    assert_eq!(format_currency(&DisplayValue::Money(Centavos(0))), "₱0");
    assert_eq!(format_currency(&DisplayValue::from("not a number")), "not a number");
    assert_eq!(format_currency(&DisplayValue::Number(f64::INFINITY)), "inf");
    assert_eq!(format_percent(&DisplayValue::Number(33.333)), "33.3%");
    assert_eq!(format_percent(&DisplayValue::from("")), "");
}

#[test]
fn test_csv_round_trips_commas() {
    let results = vec![AggregationResult {
        group_key: "Brand, Inc.".to_string(),
        revenue: Centavos(123_450),
        transaction_count: 3,
        units_sold: 7,
        market_share_percent: 100.0,
        growth_percent: 0.0,
        is_client: None,
        brand: None,
    }];
    let csv_text = to_csv(&to_table(&results, "Brand")).unwrap();

    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
    assert_eq!(&reader.headers().unwrap()[0], "Brand");
    let record = reader.records().next().unwrap().unwrap();
    assert_eq!(&record[0], "Brand, Inc.");
    assert_eq!(record[1].parse::<f64>().unwrap(), 1234.5);
}

#[test]
fn test_exports_keep_aggregator_order() {
    let lines = ab_dataset().sale_lines();
    let report = PerformanceAnalyser::analyse_brands(&lines, None);
    let table = to_table(&report.results, "Brand");

    let json: Vec<serde_json::Value> = serde_json::from_str(&to_json(&table).unwrap()).unwrap();
    assert_eq!(json[0]["Brand"], "B");
    assert_eq!(json[1]["Brand"], "A");
    assert_eq!(json[1]["Client"], "Yes");

    let html = to_print_html(&table, "Brands & Share");
    assert!(html.contains("<h1>Brands &amp; Share</h1>"));
    assert!(html.find(">B<").unwrap() < html.find(">A<").unwrap());
}

#[test]
fn test_report_formatter_outputs() {
    let lines = ab_dataset().sale_lines();
    let report = PerformanceAnalyser::analyse_brands(&lines, None);

    let console = ReportFormatter::format_performance(&report, &OutputFormat::Console).unwrap();
    assert!(console.contains("₱300"));
    assert!(console.contains("33.3%"));

    let csv_text = ReportFormatter::format_performance(&report, &OutputFormat::Csv).unwrap();
    assert_eq!(csv_text.lines().count(), 3);

    let html = ReportFormatter::format_performance(&report, &OutputFormat::Html).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
}
