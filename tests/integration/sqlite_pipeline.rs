//! Analytics over a seeded SQLite store, paged in small pages

use crate::common::{memory_source, seeded_database, two_week_dataset};
use anyhow::Result;
use chrono::NaiveDate;
use scout_analytics::analysis::AnalyticsEngine;
use scout_analytics::database::Database;
use scout_analytics::source::{FetchOptions, SqliteSource};
use scout_analytics::types::{Centavos, DateRange, FilterSpec};
use scout_analytics::utils::time::Granularity;
use std::sync::Arc;

fn small_pages() -> FetchOptions {
    FetchOptions {
        page_size: 2,
        ..Default::default()
    }
}

fn sqlite_engine(path: &str) -> Result<AnalyticsEngine> {
    let source = SqliteSource::new(Database::new(path)?);
    Ok(AnalyticsEngine::new(Arc::new(source), small_pages()))
}

fn week_two() -> FilterSpec {
    FilterSpec::default().with_date_range(DateRange::new(
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
        NaiveDate::from_ymd_opt(2024, 6, 16).unwrap(),
    ))
}

#[tokio::test]
async fn test_brand_totals_from_sqlite() -> Result<()> {
    let (_dir, path) = seeded_database(&two_week_dataset())?;
    let engine = sqlite_engine(&path)?;

    let report = engine.brand_performance(&FilterSpec::default()).await?;
    assert_eq!(report.total_revenue, Centavos(41_200));
    assert_eq!(report.total_transactions, 5);
    assert_eq!(report.results[0].group_key, "Alaska");
    assert_eq!(report.results[0].is_client, Some(true));
    assert_eq!(report.results[0].revenue, Centavos(19_500));
    Ok(())
}

#[tokio::test]
async fn test_date_range_pushed_down() -> Result<()> {
    let (_dir, path) = seeded_database(&two_week_dataset())?;
    let engine = sqlite_engine(&path)?;

    let summary = engine.summary(&week_two()).await?;
    assert_eq!(summary.total_revenue, Centavos(26_100));
    assert_eq!(summary.transaction_count, 3);
    assert_eq!(summary.revenue_growth, 72.8);
    Ok(())
}

#[tokio::test]
async fn test_store_and_category_filters() -> Result<()> {
    let (_dir, path) = seeded_database(&two_week_dataset())?;
    let engine = sqlite_engine(&path)?;

    let filters = FilterSpec {
        stores: vec!["3".to_string()],
        categories: vec!["beverages".to_string()],
        ..Default::default()
    };
    let report = engine.region_performance(&filters).await?;
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].group_key, "Cebu City");
    assert_eq!(report.total_revenue, Centavos(9_500));
    Ok(())
}

#[tokio::test]
async fn test_sqlite_matches_memory_source() -> Result<()> {
    let dataset = two_week_dataset();
    let (_dir, path) = seeded_database(&dataset)?;
    let sqlite = sqlite_engine(&path)?;
    let memory = AnalyticsEngine::new(Arc::new(memory_source(&dataset)), small_pages());

    let filters = week_two();
    assert_eq!(
        sqlite.category_performance(&filters).await?,
        memory.category_performance(&filters).await?
    );
    assert_eq!(
        sqlite.time_series(&filters, Granularity::Day).await?,
        memory.time_series(&filters, Granularity::Day).await?
    );
    assert_eq!(
        sqlite.demographics(&filters).await?,
        memory.demographics(&filters).await?
    );
    Ok(())
}

#[tokio::test]
async fn test_product_mix_by_shopper_profile() -> Result<()> {
    let (_dir, path) = seeded_database(&two_week_dataset())?;
    let engine = sqlite_engine(&path)?;

    let female = FilterSpec {
        genders: vec!["F".to_string()],
        ..Default::default()
    };
    let report = engine.product_performance(&female).await?;
    assert_eq!(report.total_revenue, Centavos(23_300));
    assert_eq!(report.results[0].group_key, "Alaska Evaporated Milk");
    assert_eq!(report.results[0].brand.as_deref(), Some("Alaska"));
    assert_eq!(report.results[0].units_sold, 6);
    assert_eq!(report.results[1].group_key, "Milo Sachet");
    assert_eq!(report.results[1].revenue, Centavos(3_800));

    let young = FilterSpec {
        age_bands: vec!["18-24".to_string()],
        ..Default::default()
    };
    let report = engine.product_performance(&young).await?;
    let keys: Vec<&str> = report.results.iter().map(|r| r.group_key.as_str()).collect();
    assert_eq!(keys, vec!["Milo Sachet", "Lucky Me Pancit Canton"]);
    assert_eq!(report.results[1].brand.as_deref(), Some("Lucky Me"));
    Ok(())
}
