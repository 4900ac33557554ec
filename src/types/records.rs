//! Source records and the joined sale line
//!
//! The four entities are read-only inputs created by ingestion outside this crate.
//! Field aliases accept the column names used across the Supabase schema versions,
//! except the transaction time: date filters are pushed down on `created_at`, so
//! every transaction row must carry that column.

use super::money::{deserialize_pesos_or_zero, Centavos};
use crate::utils::time::deserialize_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Group label for items whose product, brand or location is missing
pub const UNKNOWN: &str = "Unknown";

/// One purchase event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(rename = "created_at", deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_pesos_or_zero", default)]
    pub total_amount: Centavos,
    #[serde(default)]
    pub customer_age: Option<u32>,
    #[serde(default)]
    pub customer_gender: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub store_id: Option<String>,
    #[serde(default)]
    pub store_location: Option<String>,
    /// Seconds spent at checkout
    #[serde(default, alias = "checkout_seconds")]
    pub checkout_duration: Option<u32>,
}

impl Transaction {
    /// Region label derived from `store_location`
    ///
    /// Locations read `"<barangay>, <city or region>, ..."`; the second segment is
    /// used when present, otherwise the first.
    pub fn region(&self) -> String {
        let Some(location) = self.store_location.as_deref() else {
            return UNKNOWN.to_string();
        };
        let mut parts = location.split(',').map(str::trim).filter(|p| !p.is_empty());
        let first = parts.next();
        match parts.next().or(first) {
            Some(region) => region.to_string(),
            None => UNKNOWN.to_string(),
        }
    }

    /// Approximate customer identity
    ///
    /// Transactions carry no customer id, so a customer is approximated by the
    /// composite of age, gender and store. Two shoppers sharing all three collapse
    /// into one; a repeat shopper at two stores counts twice.
    pub fn customer_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.customer_age.map(|a| a.to_string()).unwrap_or_default(),
            self.customer_gender.as_deref().unwrap_or("").to_lowercase(),
            self.store_id.as_deref().unwrap_or("")
        )
    }
}

/// Link between a transaction and a purchased product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionItem {
    #[serde(deserialize_with = "deserialize_id")]
    pub transaction_id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub product_id: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(alias = "price", deserialize_with = "deserialize_pesos_or_zero", default)]
    pub unit_price: Centavos,
}

impl TransactionItem {
    pub fn line_revenue(&self) -> Centavos {
        self.unit_price * self.quantity
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub brand_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Owned by the dashboard's client rather than a competitor; display grouping only
    #[serde(default, alias = "is_tbwa_client", deserialize_with = "deserialize_flag")]
    pub is_client: bool,
}

/// One transaction item joined with its transaction, product and brand
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleLine {
    pub transaction_id: String,
    pub timestamp: DateTime<Utc>,
    pub store_id: Option<String>,
    pub region: String,
    pub customer_key: String,
    pub customer_age: Option<u32>,
    pub customer_gender: Option<String>,
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub brand: String,
    pub is_client: bool,
    pub quantity: i64,
    pub revenue: Centavos,
}

/// The four entity tables as fetched for one request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub transaction_items: Vec<TransactionItem>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub brands: Vec<Brand>,
}

impl Dataset {
    /// Join items to their transaction, product and brand
    ///
    /// Items whose transaction is not in the set are dropped (the transaction was
    /// filtered out). Missing products or brands group under [`UNKNOWN`]. Output
    /// follows item order.
    pub fn sale_lines(&self) -> Vec<SaleLine> {
        let transactions: HashMap<&str, &Transaction> = self
            .transactions
            .iter()
            .map(|t| (t.id.as_str(), t))
            .collect();
        let products: HashMap<&str, &Product> =
            self.products.iter().map(|p| (p.id.as_str(), p)).collect();
        let brands: HashMap<&str, &Brand> =
            self.brands.iter().map(|b| (b.id.as_str(), b)).collect();

        self.transaction_items
            .iter()
            .filter_map(|item| {
                let tx = transactions.get(item.transaction_id.as_str())?;
                let product = products.get(item.product_id.as_str());
                let brand = product
                    .and_then(|p| p.brand_id.as_deref())
                    .and_then(|id| brands.get(id));

                let category = product
                    .and_then(|p| p.category.clone())
                    .or_else(|| brand.and_then(|b| b.category.clone()))
                    .unwrap_or_else(|| UNKNOWN.to_string());

                Some(SaleLine {
                    transaction_id: tx.id.clone(),
                    timestamp: tx.timestamp,
                    store_id: tx.store_id.clone(),
                    region: tx.region(),
                    customer_key: tx.customer_key(),
                    customer_age: tx.customer_age,
                    customer_gender: tx.customer_gender.clone(),
                    product_id: item.product_id.clone(),
                    product_name: product
                        .map(|p| p.name.clone())
                        .unwrap_or_else(|| UNKNOWN.to_string()),
                    category,
                    brand: brand
                        .map(|b| b.name.clone())
                        .unwrap_or_else(|| UNKNOWN.to_string()),
                    is_client: brand.map(|b| b.is_client).unwrap_or(false),
                    quantity: item.quantity,
                    revenue: item.line_revenue(),
                })
            })
            .collect()
    }
}

/// Ids arrive as integers (serial keys) or strings (uuid keys); both become strings
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}

/// Booleans arrive as JSON bools, SQLite 0/1 integers, or text
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(false),
        serde_json::Value::Bool(b) => Ok(b),
        serde_json::Value::Number(n) => Ok(n.as_f64().is_some_and(|v| v != 0.0)),
        serde_json::Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "t" | "1" | "yes" => Ok(true),
            "false" | "f" | "0" | "no" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!("invalid flag '{}'", other))),
        },
        other => Err(serde::de::Error::custom(format!("invalid flag: {}", other))),
    }
}

fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}
