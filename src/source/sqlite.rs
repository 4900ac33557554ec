//! Local SQLite row source
//!
//! Translates a page request into `SELECT .. WHERE .. ORDER BY .. LIMIT ? OFFSET ?`
//! with bound parameters. Table and column names cannot be bound, so they are
//! checked against a plain identifier pattern first. Queries run on the blocking
//! pool.

use super::{Row, RowSource, SelectRequest};
use crate::database::Database;
use crate::errors::{SourceError, SourceResult};
use crate::types::Filter;
use crate::utils::time::parse_timestamp;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use rusqlite::types::{Value as SqlValue, ValueRef};
use serde_json::Value;
use std::sync::{Arc, Mutex};

lazy_static! {
    static ref IDENTIFIER: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid");
}

pub struct SqliteSource {
    db: Arc<Mutex<Database>>,
}

impl SqliteSource {
    pub fn new(database: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(database)),
        }
    }

    pub fn from_shared(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    pub fn shared(&self) -> Arc<Mutex<Database>> {
        Arc::clone(&self.db)
    }
}

fn identifier(name: &str) -> SourceResult<&str> {
    if IDENTIFIER.is_match(name) {
        Ok(name)
    } else {
        Err(SourceError::InvalidRequest(format!(
            "invalid identifier '{}'",
            name
        )))
    }
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(hex::encode(b)),
    }
}

/// Range comparisons against timestamps compare instants, not text
fn comparison(column: &str, op: &str, bound: &Value, params: &mut Vec<SqlValue>) -> String {
    params.push(to_sql(bound));
    let is_instant = bound.as_str().and_then(parse_timestamp).is_some();
    if is_instant {
        format!("julianday({}) {} julianday(?{})", column, op, params.len())
    } else {
        format!("{} {} ?{}", column, op, params.len())
    }
}

/// SQL text and bound parameters for one page
pub fn build_select(request: &SelectRequest) -> SourceResult<(String, Vec<SqlValue>)> {
    let table = identifier(&request.table)?;
    let columns = if request.columns.is_empty() {
        "*".to_string()
    } else {
        request
            .columns
            .iter()
            .map(|c| identifier(c))
            .collect::<SourceResult<Vec<_>>>()?
            .join(", ")
    };

    let mut params = Vec::new();
    let mut clauses = Vec::new();
    for filter in &request.filters {
        let column = identifier(filter.column())?;
        let clause = match filter {
            Filter::Eq(_, Value::Null) => format!("{} IS NULL", column),
            Filter::Eq(_, v) => {
                params.push(to_sql(v));
                format!("{} = ?{}", column, params.len())
            }
            Filter::In(_, values) if values.is_empty() => "0".to_string(),
            Filter::In(_, values) => {
                let slots: Vec<String> = values
                    .iter()
                    .map(|v| {
                        params.push(to_sql(v));
                        format!("?{}", params.len())
                    })
                    .collect();
                format!("{} IN ({})", column, slots.join(", "))
            }
            Filter::Gte(_, v) => comparison(column, ">=", v, &mut params),
            Filter::Lte(_, v) => comparison(column, "<=", v, &mut params),
            Filter::Lt(_, v) => comparison(column, "<", v, &mut params),
        };
        clauses.push(clause);
    }

    let mut sql = format!("SELECT {} FROM {}", columns, table);
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(&format!(" ORDER BY {}", identifier(&request.order_by)?));
    params.push(SqlValue::Integer(request.range.limit as i64));
    sql.push_str(&format!(" LIMIT ?{}", params.len()));
    params.push(SqlValue::Integer(request.range.offset as i64));
    sql.push_str(&format!(" OFFSET ?{}", params.len()));

    Ok((sql, params))
}

fn run_select(db: &Database, request: &SelectRequest) -> SourceResult<Vec<Row>> {
    let (sql, params) = build_select(request)?;
    let unavailable = |e: rusqlite::Error| SourceError::SourceUnavailable {
        table: request.table.clone(),
        offset: request.range.offset,
        reason: e.to_string(),
    };

    let conn = db.connection();
    let mut stmt = conn.prepare(&sql).map_err(|e| match e {
        rusqlite::Error::SqliteFailure(_, Some(ref msg)) if msg.contains("no such") => {
            SourceError::InvalidRequest(msg.clone())
        }
        other => unavailable(other),
    })?;
    let names: Vec<String> = stmt.column_names().iter().map(|n| n.to_string()).collect();

    let rows = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            let mut map = Row::new();
            for (i, name) in names.iter().enumerate() {
                map.insert(name.clone(), from_sql(row.get_ref(i)?));
            }
            Ok(map)
        })
        .map_err(unavailable)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(unavailable)?;
    Ok(rows)
}

#[async_trait]
impl RowSource for SqliteSource {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn select(&self, request: &SelectRequest) -> SourceResult<Vec<Row>> {
        let db = Arc::clone(&self.db);
        let request = request.clone();
        let table = request.table.clone();
        let offset = request.range.offset;

        tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|_| SourceError::SourceUnavailable {
                table: request.table.clone(),
                offset: request.range.offset,
                reason: "database lock poisoned".to_string(),
            })?;
            run_select(&guard, &request)
        })
        .await
        .map_err(|e| SourceError::SourceUnavailable {
            table,
            offset,
            reason: format!("query task failed: {}", e),
        })?
    }
}
