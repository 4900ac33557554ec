//! Reports over the bundled mock fixture

use anyhow::Result;
use scout_analytics::analysis::AnalyticsEngine;
use scout_analytics::cli::commands::analytics::{produce_report, ReportArgs, ReportKind, SourceArgs};
use scout_analytics::config::SourceKind;
use scout_analytics::source::{FetchOptions, MemorySource};
use scout_analytics::types::{Centavos, FilterSpec};
use scout_analytics::utils::time::Granularity;
use std::path::PathBuf;
use std::sync::Arc;

/// Line revenue across all 125 fixture items
const FIXTURE_REVENUE: Centavos = Centavos(816_525);

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/scout_mock.json")
}

fn fixture_engine() -> Result<AnalyticsEngine> {
    let source = MemorySource::from_json_file(&fixture_path())?;
    let options = FetchOptions {
        page_size: 25,
        ..Default::default()
    };
    Ok(AnalyticsEngine::new(Arc::new(source), options))
}

fn report_args(format: &str) -> ReportArgs {
    ReportArgs {
        source: SourceArgs {
            source: Some(SourceKind::Mock),
            fixture: Some(fixture_path()),
            ..Default::default()
        },
        filters: Default::default(),
        format: format.to_string(),
        output: None,
        top_n: Some(0),
    }
}

#[tokio::test]
async fn test_every_dimension_conserves_revenue() -> Result<()> {
    let engine = fixture_engine()?;
    let filters = FilterSpec::default();

    for report in [
        engine.brand_performance(&filters).await?,
        engine.category_performance(&filters).await?,
        engine.region_performance(&filters).await?,
    ] {
        assert_eq!(report.total_revenue, FIXTURE_REVENUE);
        let sum: Centavos = report.results.iter().map(|r| r.revenue).sum();
        assert_eq!(sum, FIXTURE_REVENUE, "{:?}", report.dimension);
        let share: f64 = report.results.iter().map(|r| r.market_share_percent).sum();
        assert!((share - 100.0).abs() <= 0.1, "{:?}", report.dimension);
    }

    let demographics = engine.demographics(&filters).await?;
    assert_eq!(demographics.by_gender.total_revenue, FIXTURE_REVENUE);
    assert_eq!(demographics.by_age_band.total_revenue, FIXTURE_REVENUE);
    Ok(())
}

#[tokio::test]
async fn test_hourly_series_has_every_hour() -> Result<()> {
    let engine = fixture_engine()?;
    let series = engine
        .time_series(&FilterSpec::default(), Granularity::Hour)
        .await?;
    assert_eq!(series.points.len(), 24);
    assert_eq!(series.total_transactions, 60);
    let sum: Centavos = series.points.iter().map(|p| p.revenue).sum();
    assert_eq!(sum, FIXTURE_REVENUE);
    Ok(())
}

#[tokio::test]
async fn test_daily_csv_report_from_fixture() -> Result<()> {
    let csv_text =
        produce_report(&report_args("csv"), ReportKind::Trends, Granularity::Day).await?;

    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
    let headers = reader.headers()?.clone();
    assert_eq!(&headers[0], "Period");
    assert_eq!(&headers[1], "Revenue");

    let mut periods = Vec::new();
    let mut revenue = 0.0;
    for record in reader.records() {
        let record = record?;
        periods.push(record[0].to_string());
        revenue += record[1].parse::<f64>()?;
    }
    let mut sorted = periods.clone();
    sorted.sort();
    assert_eq!(periods, sorted);
    assert!((revenue - FIXTURE_REVENUE.as_pesos()).abs() < 0.01);
    Ok(())
}

#[tokio::test]
async fn test_brand_json_report_from_fixture() -> Result<()> {
    let json = produce_report(&report_args("json"), ReportKind::Brands, Granularity::Day).await?;
    let value: serde_json::Value = serde_json::from_str(&json)?;
    assert_eq!(value["dimension"], "brand");
    assert_eq!(value["total_transactions"], 60);
    assert!(value["client_share"]["client_share_percent"].as_f64().is_some());
    Ok(())
}
