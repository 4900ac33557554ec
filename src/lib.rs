//! Project Scout Retail Analytics
//!
//! Paginated reads from Supabase, SQLite or a mock dataset, metric aggregation
//! over sari-sari store transactions, and report export.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod database;
pub mod errors;
pub mod migrate;
pub mod source;
pub mod types;
pub mod utils;
