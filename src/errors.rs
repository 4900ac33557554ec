use std::time::Duration;
use thiserror::Error;

/// Application-wide error type - single point of truth
#[derive(Error, Debug)]
pub enum AppError {
    /// Local SQLite store operations
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Row source (Supabase, SQLite or mock) failures
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// File I/O operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV export
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration issues
    #[error("Configuration error: {0}")]
    Config(String),

    /// Row decoding and data validation
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Statement runner failures that stop a plan
    #[error("Migration error: {0}")]
    Migration(String),
}

/// Row source error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    /// A page request failed; no partial aggregation is performed on the rows read so far
    #[error("Source unavailable: {table} at offset {offset} - {reason}")]
    SourceUnavailable {
        table: String,
        offset: usize,
        reason: String,
    },

    /// The whole paginated fetch exceeded its time budget
    #[error("Fetch timeout: {budget:?} for {table}")]
    Timeout { table: String, budget: Duration },

    /// The backend answered with something that cannot be a page of rows
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The request itself is malformed (unknown table, bad identifier)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Application-wide result type - single point of truth
pub type AppResult<T> = Result<T, AppError>;

/// Result type for row source operations
pub type SourceResult<T> = Result<T, SourceError>;

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidData(format!("JSON error: {}", err))
    }
}

impl From<glob::PatternError> for AppError {
    fn from(err: glob::PatternError) -> Self {
        AppError::Config(format!("Glob pattern error: {}", err))
    }
}

impl From<glob::GlobError> for AppError {
    fn from(err: glob::GlobError) -> Self {
        AppError::Config(format!("Glob error: {}", err))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
