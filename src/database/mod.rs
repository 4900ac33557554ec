//! Local SQLite store
//!
//! Holds the same four entity tables as the hosted backend so the dashboard's
//! analytics can run offline, plus the `schema_migrations` ledger used by the
//! statement runner.

pub mod operations;
pub mod schema;

pub use schema::setup_schema;

use crate::errors::AppResult;
use rusqlite::Connection;
use tracing::info;

pub struct Database {
    connection: Connection,
}

impl Database {
    /// Open (or create) a database file and make sure the schema exists
    ///
    /// `":memory:"` gives a private in-memory store.
    pub fn new(database_path: &str) -> AppResult<Self> {
        let connection = Connection::open(database_path)?;
        setup_schema(&connection)?;

        info!("Database initialised at: {}", database_path);
        Ok(Self { connection })
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Execute a function within a database transaction
    pub fn execute_transaction<F, R>(&mut self, f: F) -> AppResult<R>
    where
        F: FnOnce(&rusqlite::Transaction) -> AppResult<R>,
    {
        let tx = self.connection.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }
}
