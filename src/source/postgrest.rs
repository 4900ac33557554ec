//! Supabase (PostgREST) row source
//!
//! `GET {url}/rest/v1/{table}?select=..&{column}={op}.{value}&order=..&offset=..&limit=..`
//! authenticated with the anon key in both the `apikey` and bearer headers.
//! The server applies its own max-rows cap (1000 by default) to every page, so
//! each request asks for `Prefer: count=exact` and the total from the
//! `Content-Range` header drives pagination.

use super::{Page, Row, RowSource, SelectRequest};
use crate::errors::{SourceError, SourceResult};
use crate::types::Filter;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

pub struct PostgrestSource {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl PostgrestSource {
    pub fn new(base_url: &str, api_key: &str, timeout_seconds: u64) -> Self {
        let mut builder = Client::builder();
        if timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(timeout_seconds));
        }
        let http_client = builder.build().unwrap_or_default();

        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

/// Query-string pairs for one page request
pub fn query_params(request: &SelectRequest) -> Vec<(String, String)> {
    let select = if request.columns.is_empty() {
        "*".to_string()
    } else {
        request.columns.join(",")
    };

    let mut params = vec![("select".to_string(), select)];
    for filter in &request.filters {
        params.push((filter.column().to_string(), filter_expression(filter)));
    }
    params.push(("order".to_string(), format!("{}.asc", request.order_by)));
    params.push(("offset".to_string(), request.range.offset.to_string()));
    params.push(("limit".to_string(), request.range.limit.to_string()));
    params
}

/// Total from a `Content-Range` header such as `0-999/2500` or `*/0`
///
/// `None` when the server did not count (`0-999/*`) or the header is malformed.
pub fn parse_content_range(header: &str) -> Option<usize> {
    let (_, total) = header.trim().rsplit_once('/')?;
    total.parse().ok()
}

/// PostgREST operator expression, e.g. `gte.2024-06-01T00:00:00+00:00` or `in.(1,2)`
pub fn filter_expression(filter: &Filter) -> String {
    match filter {
        Filter::Eq(_, Value::Null) => "is.null".to_string(),
        Filter::Eq(_, v) => format!("eq.{}", literal(v)),
        Filter::In(_, values) => {
            let items: Vec<String> = values.iter().map(list_item).collect();
            format!("in.({})", items.join(","))
        }
        Filter::Gte(_, v) => format!("gte.{}", literal(v)),
        Filter::Lte(_, v) => format!("lte.{}", literal(v)),
        Filter::Lt(_, v) => format!("lt.{}", literal(v)),
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// List members containing reserved characters are double-quoted
fn list_item(value: &Value) -> String {
    let raw = literal(value);
    if raw.contains([',', '(', ')', '"', ' ']) {
        format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        raw
    }
}

#[async_trait]
impl RowSource for PostgrestSource {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn select(&self, request: &SelectRequest) -> SourceResult<Vec<Row>> {
        Ok(self.select_page(request).await?.rows)
    }

    async fn select_page(&self, request: &SelectRequest) -> SourceResult<Page> {
        let url = self.table_url(&request.table);
        let unavailable = |reason: String| SourceError::SourceUnavailable {
            table: request.table.clone(),
            offset: request.range.offset,
            reason,
        };
        debug!(
            "GET {} offset={} limit={}",
            url, request.range.offset, request.range.limit
        );

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "count=exact")
            .query(&query_params(request))
            .send()
            .await
            .map_err(|e| {
                error!("Request to {} failed: {}", url, e);
                unavailable(format!("request failed: {}", e))
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::InvalidRequest(format!(
                "{} rejected by server ({}): {}",
                request.table, status, body
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("{} returned {}: {}", url, status, body);
            return Err(unavailable(format!("HTTP {}: {}", status, body)));
        }

        let total = response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range);

        let body: Value = response
            .json()
            .await
            .map_err(|e| SourceError::InvalidResponse(format!("{}: {}", request.table, e)))?;

        let rows = match body {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(row) => Ok(row),
                    other => Err(SourceError::InvalidResponse(format!(
                        "{}: expected object rows, got {}",
                        request.table, other
                    ))),
                })
                .collect::<SourceResult<Vec<Row>>>()?,
            other => {
                return Err(SourceError::InvalidResponse(format!(
                    "{}: expected an array, got {}",
                    request.table, other
                )))
            }
        };
        Ok(Page { rows, total })
    }
}
