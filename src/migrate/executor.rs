//! Statement executors
//!
//! [`SqliteExecutor`] runs statements on the local store. [`PostgrestExecutor`]
//! sends them to a hosted database through an `exec_sql` RPC function, which
//! must exist on the server (`POST /rest/v1/rpc/exec_sql`).

use crate::database::Database;
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Runs one SQL statement
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self, sql: &str) -> AppResult<()>;
}

pub struct SqliteExecutor {
    db: Arc<Mutex<Database>>,
}

impl SqliteExecutor {
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

#[async_trait]
impl StatementExecutor for SqliteExecutor {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn execute(&self, sql: &str) -> AppResult<()> {
        let db = Arc::clone(&self.db);
        let sql = sql.to_string();

        tokio::task::spawn_blocking(move || -> AppResult<()> {
            let guard = db
                .lock()
                .map_err(|_| AppError::Migration("database lock poisoned".to_string()))?;
            guard.connection().execute_batch(&sql)?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Migration(format!("statement task failed: {}", e)))?
    }
}

pub struct PostgrestExecutor {
    http_client: Client,
    base_url: String,
    api_key: String,
    function: String,
    parameter: String,
}

impl PostgrestExecutor {
    pub fn new(base_url: &str, api_key: &str, timeout_seconds: u64) -> Self {
        let mut builder = Client::builder();
        if timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(timeout_seconds));
        }

        Self {
            http_client: builder.build().unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            function: "exec_sql".to_string(),
            parameter: "sql".to_string(),
        }
    }

    /// Use a differently named RPC function or argument (e.g. `sql_query`)
    pub fn with_function(mut self, function: &str, parameter: &str) -> Self {
        self.function = function.to_string();
        self.parameter = parameter.to_string();
        self
    }

    pub fn rpc_url(&self) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, self.function)
    }

    pub fn request_body(&self, sql: &str) -> Value {
        let mut body = Map::new();
        body.insert(self.parameter.clone(), Value::String(sql.to_string()));
        Value::Object(body)
    }
}

#[async_trait]
impl StatementExecutor for PostgrestExecutor {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn execute(&self, sql: &str) -> AppResult<()> {
        let url = self.rpc_url();
        debug!("POST {}", url);

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(sql))
            .send()
            .await
            .map_err(|e| AppError::Migration(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Migration(format!("HTTP {}: {}", status, body)));
        }
        Ok(())
    }
}
