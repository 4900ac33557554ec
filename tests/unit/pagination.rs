//! Paginated fetch against a capped in-memory backend

use crate::common::numbered_rows;
use scout_analytics::errors::SourceError;
use scout_analytics::source::{fetch_all, FetchOptions, MemorySource, PageRange, TableQuery};
use std::time::Duration;

fn options(page_size: usize) -> FetchOptions {
    FetchOptions {
        page_size,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_2500_rows_take_three_requests() {
    let source = MemorySource::new()
        .with_table("transactions", numbered_rows(2500))
        .with_page_cap(1000);

    let outcome = fetch_all(&source, &TableQuery::new("transactions"), &options(1000))
        .await
        .unwrap();

    assert_eq!(outcome.rows.len(), 2500);
    assert!(outcome.complete);
    assert_eq!(
        source.requests(),
        vec![
            PageRange { offset: 0, limit: 1000 },
            PageRange { offset: 1000, limit: 1000 },
            PageRange { offset: 2000, limit: 1000 },
        ]
    );
    let ids: Vec<u64> = outcome
        .rows
        .iter()
        .map(|r| r["id"].as_u64().unwrap())
        .collect();
    assert!(ids.windows(2).all(|w| w[0] + 1 == w[1]));
}

#[tokio::test]
async fn test_concurrent_window_keeps_offset_order() {
    let source = MemorySource::new()
        .with_table("transaction_items", numbered_rows(2345))
        .with_page_cap(500);
    let options = FetchOptions {
        page_size: 500,
        concurrent_pages: 3,
        ..Default::default()
    };

    let outcome = fetch_all(&source, &TableQuery::new("transaction_items"), &options)
        .await
        .unwrap();
    assert_eq!(outcome.rows.len(), 2345);
    assert_eq!(outcome.rows[500]["id"], 500);
    assert_eq!(outcome.rows[2344]["id"], 2344);
}

#[tokio::test]
async fn test_best_effort_returns_partial_rows() {
    let source = MemorySource::new()
        .with_table("transactions", numbered_rows(2500))
        .failing_at("transactions", 2000);
    let options = FetchOptions {
        page_size: 1000,
        best_effort: true,
        ..Default::default()
    };

    let outcome = fetch_all(&source, &TableQuery::new("transactions"), &options)
        .await
        .unwrap();
    assert!(!outcome.complete);
    assert_eq!(outcome.rows.len(), 2000);
    assert!(outcome.warning.is_some());
}

#[tokio::test]
async fn test_strict_mode_names_failed_page() {
    let source = MemorySource::new()
        .with_table("transactions", numbered_rows(2500))
        .failing_at("transactions", 1000);

    let err = fetch_all(&source, &TableQuery::new("transactions"), &options(1000))
        .await
        .unwrap_err();
    match err {
        SourceError::SourceUnavailable { table, offset, .. } => {
            assert_eq!(table, "transactions");
            assert_eq!(offset, 1000);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_fails_even_in_best_effort() {
    let source = MemorySource::new()
        .with_table("brands", numbered_rows(10))
        .with_delay(Duration::from_millis(200));
    let options = FetchOptions {
        page_size: 5,
        timeout: Some(Duration::from_millis(50)),
        best_effort: true,
        ..Default::default()
    };

    let err = fetch_all(&source, &TableQuery::new("brands"), &options)
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Timeout { .. }));
}
