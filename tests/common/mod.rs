//! Common Test Utilities
//!
//! Dataset builders and store setup shared by the unit and integration tests.

#![allow(dead_code)]

use scout_analytics::database::Database;
use scout_analytics::errors::AppResult;
use scout_analytics::source::MemorySource;
use scout_analytics::types::Dataset;
use serde_json::{json, Value};
use tempfile::TempDir;

/// Two brands in one week: A sells 150.00, B sells 300.00
pub fn ab_dataset() -> Dataset {
    serde_json::from_value(json!({
        "transactions": [
            {"id": "t1", "created_at": "2024-06-15T14:30:00Z", "store_id": "s1",
             "store_location": "Poblacion, Makati, NCR", "customer_age": 30, "customer_gender": "F"},
            {"id": "t2", "created_at": "2024-06-16T09:05:00Z", "store_id": "s2",
             "store_location": "Lahug, Cebu City, Central Visayas", "customer_age": 52, "customer_gender": "M"}
        ],
        "transaction_items": [
            {"transaction_id": "t1", "product_id": "pa", "quantity": 3, "price": 50},
            {"transaction_id": "t2", "product_id": "pb", "quantity": 2, "price": "150.00"}
        ],
        "products": [
            {"id": "pa", "name": "Product A", "category": "Snacks", "brand_id": "a"},
            {"id": "pb", "name": "Product B", "category": "Beverages", "brand_id": "b"}
        ],
        "brands": [
            {"id": "a", "name": "A", "is_client": true},
            {"id": "b", "name": "B", "is_client": false}
        ]
    }))
    .unwrap()
}

/// Two weeks of sales across three stores, with one orphan item
pub fn two_week_dataset() -> Dataset {
    serde_json::from_value(json!({
        "transactions": [
            {"id": 1, "created_at": "2024-06-03T08:15:00Z", "store_id": 1,
             "store_location": "Poblacion, Makati, NCR", "customer_age": 27, "customer_gender": "Female"},
            {"id": 2, "created_at": "2024-06-05T18:40:00Z", "store_id": 2,
             "store_location": "Tondo, Manila, NCR", "customer_age": 44, "customer_gender": "Male"},
            {"id": 3, "created_at": "2024-06-10T07:00:00Z", "store_id": 1,
             "store_location": "Poblacion, Makati, NCR", "customer_age": 27, "customer_gender": "Female"},
            {"id": 4, "created_at": "2024-06-12T12:30:00Z", "store_id": 3,
             "store_location": "Lahug, Cebu City, Central Visayas", "customer_age": 19, "customer_gender": "M"},
            {"id": 5, "created_at": "2024-06-14T20:10:00Z", "store_id": 3,
             "store_location": "Lahug, Cebu City, Central Visayas"}
        ],
        "transaction_items": [
            {"transaction_id": 1, "product_id": 101, "quantity": 2, "price": 32.5},
            {"transaction_id": 1, "product_id": 501, "quantity": 4, "price": 9.5},
            {"transaction_id": 2, "product_id": 601, "quantity": 3, "price": 16},
            {"transaction_id": 3, "product_id": 101, "quantity": 4, "price": 32.5},
            {"transaction_id": 4, "product_id": 501, "quantity": 10, "price": 9.5},
            {"transaction_id": 4, "product_id": 601, "quantity": 1, "price": 16},
            {"transaction_id": 5, "product_id": 999, "quantity": 1, "price": 20}
        ],
        "products": [
            {"id": 101, "name": "Alaska Evaporated Milk", "category": "Dairy", "brand_id": 1},
            {"id": 501, "name": "Milo Sachet", "category": "Beverages", "brand_id": 5},
            {"id": 601, "name": "Lucky Me Pancit Canton", "category": "Instant Noodles", "brand_id": 6}
        ],
        "brands": [
            {"id": 1, "name": "Alaska", "is_client": true},
            {"id": 5, "name": "Milo", "is_client": false},
            {"id": 6, "name": "Lucky Me", "is_client": 0}
        ]
    }))
    .unwrap()
}

/// `count` rows of a plain numbered table
pub fn numbered_rows(count: usize) -> Vec<Value> {
    (0..count).map(|i| json!({"id": i, "value": i * 2})).collect()
}

pub fn memory_source(dataset: &Dataset) -> MemorySource {
    MemorySource::from_dataset(dataset).unwrap()
}

/// A file-backed store seeded with `dataset`; keep the directory alive while in use
pub fn seeded_database(dataset: &Dataset) -> AppResult<(TempDir, String)> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("scout.db").to_string_lossy().to_string();
    let mut db = Database::new(&path)?;
    db.insert_dataset(dataset)?;
    Ok((dir, path))
}
