//! Bulk loading of entity rows into the local store

use super::Database;
use crate::errors::AppResult;
use crate::types::Dataset;
use rusqlite::params;
use tracing::info;

/// Row counts written by [`Database::insert_dataset`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertCounts {
    pub brands: usize,
    pub products: usize,
    pub transactions: usize,
    pub transaction_items: usize,
}

impl Database {
    /// Insert a dataset in one transaction; existing ids are replaced
    pub fn insert_dataset(&mut self, dataset: &Dataset) -> AppResult<InsertCounts> {
        let counts = self.execute_transaction(|tx| {
            let mut counts = InsertCounts::default();

            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO brands (id, name, category, is_client)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for brand in &dataset.brands {
                counts.brands +=
                    stmt.execute(params![brand.id, brand.name, brand.category, brand.is_client])?;
            }

            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO products (id, name, category, brand_id)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for product in &dataset.products {
                counts.products += stmt.execute(params![
                    product.id,
                    product.name,
                    product.category,
                    product.brand_id
                ])?;
            }

            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO transactions
                 (id, created_at, total_amount, customer_age, customer_gender,
                  store_id, store_location, checkout_duration)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for t in &dataset.transactions {
                counts.transactions += stmt.execute(params![
                    t.id,
                    t.timestamp.to_rfc3339(),
                    t.total_amount.as_pesos(),
                    t.customer_age,
                    t.customer_gender,
                    t.store_id,
                    t.store_location,
                    t.checkout_duration
                ])?;
            }

            let mut stmt = tx.prepare_cached(
                "INSERT INTO transaction_items (transaction_id, product_id, quantity, price)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for item in &dataset.transaction_items {
                counts.transaction_items += stmt.execute(params![
                    item.transaction_id,
                    item.product_id,
                    item.quantity,
                    item.unit_price.as_pesos()
                ])?;
            }

            Ok(counts)
        })?;

        info!(
            "Loaded {} transactions, {} items, {} products, {} brands",
            counts.transactions, counts.transaction_items, counts.products, counts.brands
        );
        Ok(counts)
    }
}
