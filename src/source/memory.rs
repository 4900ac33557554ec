//! In-memory row source
//!
//! Serves tables loaded from a mock fixture (the dashboard's offline mode) or
//! built in tests. Pages honour an optional backend-style page cap, and every
//! request is logged so callers can inspect the pagination sequence.

use super::{Page, PageRange, Row, RowSource, SelectRequest};
use crate::errors::{AppError, AppResult, SourceError, SourceResult};
use crate::types::Dataset;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct MemorySource {
    tables: HashMap<String, Vec<Row>>,
    page_cap: Option<usize>,
    exact_count: bool,
    failure: Option<(String, usize)>,
    delay: Option<Duration>,
    requests: Mutex<Vec<PageRange>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a table; non-object values are skipped
    pub fn with_table(mut self, name: &str, rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.tables.insert(name.to_string(), rows);
        self
    }

    /// Never return more than `cap` rows per page
    pub fn with_page_cap(mut self, cap: usize) -> Self {
        self.page_cap = Some(cap);
        self
    }

    /// Report the total match count with every page, as PostgREST does for `Prefer: count=exact`
    pub fn with_exact_count(mut self) -> Self {
        self.exact_count = true;
        self
    }

    /// Fail every request for `table` at `offset`
    pub fn failing_at(mut self, table: &str, offset: usize) -> Self {
        self.failure = Some((table.to_string(), offset));
        self
    }

    /// Sleep before answering each page
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Load a fixture shaped `{"transactions": [...], "transaction_items": [...], ...}`
    pub fn from_json_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Cannot read mock fixture {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> AppResult<Self> {
        let value: Value = serde_json::from_str(content)?;
        let Value::Object(tables) = value else {
            return Err(AppError::InvalidData(
                "mock fixture must be an object of tables".to_string(),
            ));
        };

        let mut source = Self::new();
        for (name, rows) in tables {
            match rows {
                Value::Array(rows) => source = source.with_table(&name, rows),
                _ => {
                    return Err(AppError::InvalidData(format!(
                        "mock table '{}' is not an array",
                        name
                    )))
                }
            }
        }
        Ok(source)
    }

    /// Serve a typed dataset in the same row shape the backends return
    pub fn from_dataset(dataset: &Dataset) -> AppResult<Self> {
        let value = serde_json::to_value(dataset)?;
        Self::from_json_str(&value.to_string())
    }

    pub fn table_len(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, Vec::len)
    }

    /// Page requests received so far, in arrival order
    pub fn requests(&self) -> Vec<PageRange> {
        self.requests
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl RowSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn select_page(&self, request: &SelectRequest) -> SourceResult<Page> {
        let rows = self.select(request).await?;
        let total = self.exact_count.then(|| {
            self.tables.get(&request.table).map_or(0, |rows| {
                rows.iter()
                    .filter(|row| request.filters.iter().all(|f| f.matches(row)))
                    .count()
            })
        });
        Ok(Page { rows, total })
    }

    async fn select(&self, request: &SelectRequest) -> SourceResult<Vec<Row>> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(request.range);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some((table, offset)) = &self.failure {
            if *table == request.table && *offset == request.range.offset {
                return Err(SourceError::SourceUnavailable {
                    table: table.clone(),
                    offset: *offset,
                    reason: "simulated backend failure".to_string(),
                });
            }
        }

        let Some(rows) = self.tables.get(&request.table) else {
            return Err(SourceError::InvalidRequest(format!(
                "unknown table '{}'",
                request.table
            )));
        };

        let mut matching: Vec<&Row> = rows
            .iter()
            .filter(|row| request.filters.iter().all(|f| f.matches(row)))
            .collect();
        matching.sort_by(|a, b| {
            compare_values(a.get(&request.order_by), b.get(&request.order_by))
        });

        let limit = match self.page_cap {
            Some(cap) => request.range.limit.min(cap),
            None => request.range.limit,
        };

        Ok(matching
            .into_iter()
            .skip(request.range.offset)
            .take(limit)
            .map(|row| {
                if request.columns.is_empty() {
                    row.clone()
                } else {
                    row.iter()
                        .filter(|(k, _)| request.columns.contains(k))
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect()
                }
            })
            .collect())
    }
}
