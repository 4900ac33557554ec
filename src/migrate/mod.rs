//! Statement runner
//!
//! Applies SQL scripts statement by statement with per-statement fallbacks,
//! against the local SQLite store or a hosted database's `exec_sql` RPC.
//! Migration files are applied in sorted order and recorded by sha256 checksum
//! so re-runs skip files that have not changed.

pub mod executor;
pub mod plan;
pub mod runner;

pub use executor::{PostgrestExecutor, SqliteExecutor, StatementExecutor};
pub use plan::{split_statements, ErrorPolicy, PlannedStatement, StatementPlan};
pub use runner::{
    apply_migration_files, apply_statements, file_checksum, ApplyReport, FileResult, FileStatus,
    MemoryLedger, MigrationLedger, MigrationReport, SqliteLedger, StatementOutcome,
    StatementResult,
};
