//! Paginated table fetch
//!
//! Pages are requested by offset and concatenated in offset order. A backend may
//! serve fewer rows than `page_size` (PostgREST `max-rows`), so the first short
//! page is taken as the backend's page size and the loop goes on from where that
//! page ended. The fetch stops on an empty page, on a page shorter than a size
//! the backend has already served in full, or once the backend's reported total
//! is reached. With `concurrent_pages` above one, a window of pages is requested
//! at once and results are still appended in offset order.

use super::{PageRange, Row, RowSource, SelectRequest};
use crate::errors::{AppError, AppResult, SourceError, SourceResult};
use crate::types::Filter;
use futures::future::join_all;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Paginated fetch settings
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    pub page_size: usize,
    /// Budget for the whole fetch; `None` waits indefinitely
    pub timeout: Option<Duration>,
    /// Return the rows read before a failed page instead of an error
    pub best_effort: bool,
    pub concurrent_pages: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: 1000,
            timeout: Some(Duration::from_secs(60)),
            best_effort: false,
            concurrent_pages: 1,
        }
    }
}

impl From<&crate::config::SourceConfig> for FetchOptions {
    fn from(config: &crate::config::SourceConfig) -> Self {
        Self {
            page_size: config.page_size,
            timeout: (config.timeout_seconds > 0)
                .then(|| Duration::from_secs(config.timeout_seconds)),
            best_effort: config.best_effort,
            concurrent_pages: config.concurrent_pages.max(1),
        }
    }
}

/// What to read: table, columns and pushed-down filters
#[derive(Debug, Clone, PartialEq)]
pub struct TableQuery {
    pub table: String,
    pub columns: Vec<String>,
    pub filters: Vec<Filter>,
    pub order_by: String,
}

impl TableQuery {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            filters: Vec::new(),
            order_by: "id".to_string(),
        }
    }

    pub fn with_filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn order_by(mut self, column: &str) -> Self {
        self.order_by = column.to_string();
        self
    }

    fn page(&self, offset: usize, limit: usize) -> SelectRequest {
        SelectRequest {
            table: self.table.clone(),
            columns: self.columns.clone(),
            filters: self.filters.clone(),
            order_by: self.order_by.clone(),
            range: PageRange { offset, limit },
        }
    }
}

/// Rows of one table in offset order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    pub rows: Vec<Row>,
    pub pages: usize,
    /// False only in best-effort mode after a failed page
    pub complete: bool,
    pub warning: Option<String>,
}

/// Decoded records of one table
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedRecords<T> {
    pub records: Vec<T>,
    pub complete: bool,
    pub warning: Option<String>,
}

/// Read every row of `query.table` matching its filters
///
/// In strict mode any failed page fails the fetch with
/// [`SourceError::SourceUnavailable`]. In best-effort mode a failure after at
/// least one good page returns the rows read so far with `complete == false`.
/// Exceeding `options.timeout` always fails with [`SourceError::Timeout`].
pub async fn fetch_all(
    source: &dyn RowSource,
    query: &TableQuery,
    options: &FetchOptions,
) -> SourceResult<FetchOutcome> {
    if options.page_size == 0 {
        return Err(SourceError::InvalidRequest(
            "page size must be greater than zero".to_string(),
        ));
    }

    let outcome = match options.timeout {
        Some(budget) => tokio::time::timeout(budget, drain(source, query, options))
            .await
            .map_err(|_| SourceError::Timeout {
                table: query.table.clone(),
                budget,
            })??,
        None => drain(source, query, options).await?,
    };

    info!(
        "Fetched {} rows from {} via {} ({} pages{})",
        outcome.rows.len(),
        query.table,
        source.name(),
        outcome.pages,
        if outcome.complete { "" } else { ", partial" }
    );
    Ok(outcome)
}

async fn drain(
    source: &dyn RowSource,
    query: &TableQuery,
    options: &FetchOptions,
) -> SourceResult<FetchOutcome> {
    let window = options.concurrent_pages.max(1);
    let mut outcome = FetchOutcome {
        complete: true,
        ..Default::default()
    };
    let mut page_size = options.page_size;
    // Set once the backend has served `page_size` rows for a request of that size
    let mut served_in_full = false;
    let mut total: Option<usize> = None;
    let mut offset = 0;

    'window: loop {
        let requests: Vec<SelectRequest> = (0..window)
            .map(|i| query.page(offset + i * page_size, page_size))
            .collect();
        let results = join_all(requests.iter().map(|r| source.select_page(r))).await;

        for (request, result) in requests.iter().zip(results) {
            let page_offset = request.range.offset;
            let page = match result {
                Ok(page) => page,
                Err(e) => return fail_page(outcome, &query.table, page_offset, e, options),
            };

            let len = page.rows.len();
            if len > request.range.limit {
                return Err(SourceError::InvalidResponse(format!(
                    "{} returned {} rows for a page of {} at offset {}",
                    query.table, len, request.range.limit, page_offset
                )));
            }
            if total.is_none() {
                total = page.total;
            }

            debug!("{} page at offset {}: {} rows", query.table, page_offset, len);
            outcome.rows.extend(page.rows);
            outcome.pages += 1;
            offset = page_offset + len;

            let finished = match total {
                Some(total) => len == 0 || offset >= total,
                None => len == 0 || (len < page_size && served_in_full),
            };
            if finished {
                break 'window;
            }

            if len < page_size {
                // Later pages in this window were sized for the old page size
                debug!(
                    "{} serves at most {} rows per page (asked for {})",
                    query.table, len, page_size
                );
                page_size = len;
                served_in_full = true;
                continue 'window;
            }
            served_in_full = true;
        }
    }

    if let Some(total) = total {
        if outcome.rows.len() < total {
            warn!(
                "{}: read {} rows but the source reported {}; rows changed during the fetch",
                query.table,
                outcome.rows.len(),
                total
            );
        }
    }
    Ok(outcome)
}

fn fail_page(
    mut outcome: FetchOutcome,
    table: &str,
    offset: usize,
    error: SourceError,
    options: &FetchOptions,
) -> SourceResult<FetchOutcome> {
    let error = match error {
        SourceError::InvalidRequest(_) | SourceError::SourceUnavailable { .. } => error,
        other => SourceError::SourceUnavailable {
            table: table.to_string(),
            offset,
            reason: other.to_string(),
        },
    };

    if !options.best_effort || outcome.pages == 0 || matches!(error, SourceError::InvalidRequest(_)) {
        return Err(error);
    }

    let message = format!(
        "partial result for {}: {} rows read before failure ({})",
        table,
        outcome.rows.len(),
        error
    );
    warn!("{}", message);
    outcome.complete = false;
    outcome.warning = Some(message);
    Ok(outcome)
}

/// Fetch a table and decode each row into `T`
pub async fn fetch_records<T: DeserializeOwned>(
    source: &dyn RowSource,
    query: &TableQuery,
    options: &FetchOptions,
) -> AppResult<FetchedRecords<T>> {
    let outcome = fetch_all(source, query, options).await?;
    let records = outcome
        .rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            serde_json::from_value(serde_json::Value::Object(row)).map_err(|e| {
                AppError::InvalidData(format!("{} row {}: {}", query.table, i, e))
            })
        })
        .collect::<AppResult<Vec<T>>>()?;

    Ok(FetchedRecords {
        records,
        complete: outcome.complete,
        warning: outcome.warning,
    })
}
