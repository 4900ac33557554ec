//! Row sources
//!
//! A [`RowSource`] answers one bounded page of rows from a named table or view.
//! Backends cap page size themselves; [`pagination::fetch_all`] learns the cap
//! from the first short page and drains the table until an empty page, a short
//! page at the learned size, or the backend's reported total.
//!
//! - `postgrest`: Supabase REST API over HTTP
//! - `sqlite`: local rusqlite store
//! - `memory`: in-process tables loaded from a mock fixture

pub mod memory;
pub mod pagination;
pub mod postgrest;
pub mod retry;
pub mod sqlite;

pub use memory::MemorySource;
pub use pagination::{fetch_all, fetch_records, FetchOptions, FetchOutcome, FetchedRecords, TableQuery};
pub use postgrest::PostgrestSource;
pub use retry::{calculate_next_backoff, retry_with_backoff};
pub use sqlite::SqliteSource;

use crate::config::{AppConfig, SourceKind};
use crate::database::Database;
use crate::errors::{AppResult, SourceResult};
use crate::types::Filter;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// One decoded row, keyed by column name
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Table names read by the analytics layer
pub const TRANSACTIONS_TABLE: &str = "transactions";
pub const TRANSACTION_ITEMS_TABLE: &str = "transaction_items";
pub const PRODUCTS_TABLE: &str = "products";
pub const BRANDS_TABLE: &str = "brands";

/// Offset window of one page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRange {
    pub offset: usize,
    pub limit: usize,
}

/// A single page request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectRequest {
    pub table: String,
    /// Empty selects every column
    pub columns: Vec<String>,
    pub filters: Vec<Filter>,
    /// Column giving the stable order offsets rely on
    pub order_by: String,
    pub range: PageRange,
}

#[async_trait]
pub trait RowSource: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Return at most `request.range.limit` rows starting at `request.range.offset`
    ///
    /// A backend may return fewer rows than asked (its own page cap). Returning
    /// more is a protocol violation.
    async fn select(&self, request: &SelectRequest) -> SourceResult<Vec<Row>>;

    /// One page plus the backend's exact match count, when it reports one
    async fn select_page(&self, request: &SelectRequest) -> SourceResult<Page> {
        Ok(Page {
            rows: self.select(request).await?,
            total: None,
        })
    }
}

/// Rows of one page and, if known, the total rows matching the filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub rows: Vec<Row>,
    pub total: Option<usize>,
}

/// Build the row source named by configuration
pub fn from_config(config: &AppConfig) -> AppResult<Arc<dyn RowSource>> {
    let source: Arc<dyn RowSource> = match config.source.kind {
        SourceKind::Supabase => Arc::new(PostgrestSource::new(
            &config.source.url,
            &config.source.api_key,
            config.source.timeout_seconds,
        )),
        SourceKind::Sqlite => {
            let database = Database::new(&config.database.default_path.to_string_lossy())?;
            Arc::new(SqliteSource::new(database))
        }
        SourceKind::Mock => Arc::new(MemorySource::from_json_file(&config.mock.fixture_path)?),
    };
    Ok(source)
}
