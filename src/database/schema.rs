//! Local store schema
//!
//! Mirrors the Supabase tables the dashboard reads, plus the migration ledger.
//! Money columns hold pesos as REAL, as the hosted schema does; decoding turns
//! them into centavos. No foreign keys: dangling references group as Unknown.

use crate::errors::AppResult;
use rusqlite::Connection;
use tracing::debug;

pub fn setup_schema(connection: &Connection) -> AppResult<()> {
    connection.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS brands (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT,
            is_client INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT,
            brand_id TEXT
        );

        CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            total_amount REAL NOT NULL DEFAULT 0,
            customer_age INTEGER,
            customer_gender TEXT,
            store_id TEXT,
            store_location TEXT,
            checkout_duration INTEGER
        );

        CREATE TABLE IF NOT EXISTS transaction_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            transaction_id TEXT NOT NULL,
            product_id TEXT NOT NULL,
            quantity INTEGER NOT NULL DEFAULT 0,
            price REAL NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS schema_migrations (
            filename TEXT PRIMARY KEY,
            checksum TEXT NOT NULL,
            applied_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transactions_created_at ON transactions(created_at);
        CREATE INDEX IF NOT EXISTS idx_transactions_store ON transactions(store_id);
        CREATE INDEX IF NOT EXISTS idx_items_transaction ON transaction_items(transaction_id);
        CREATE INDEX IF NOT EXISTS idx_products_brand ON products(brand_id);
        "#,
    )?;

    debug!("Schema ready");
    Ok(())
}
