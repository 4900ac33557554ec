//! Applying plans and migration files

use super::executor::StatementExecutor;
use super::plan::{ErrorPolicy, StatementPlan};
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use chrono::Utc;
use rusqlite::OptionalExtension;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

/// How one planned statement ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatementOutcome {
    Applied,
    /// The primary failed and the fallback at this index (0-based) succeeded
    AppliedFallback { fallback: usize },
    /// Primary and every fallback failed, errors in attempt order
    Failed { errors: Vec<String> },
    /// Not attempted because an earlier statement stopped the plan
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementResult {
    pub label: String,
    #[serde(flatten)]
    pub outcome: StatementOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub results: Vec<StatementResult>,
    pub stopped: bool,
}

impl ApplyReport {
    pub fn applied(&self) -> usize {
        self.results
            .iter()
            .filter(|r| {
                matches!(
                    r.outcome,
                    StatementOutcome::Applied | StatementOutcome::AppliedFallback { .. }
                )
            })
            .count()
    }

    pub fn failed(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, StatementOutcome::Failed { .. }))
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0 && !self.stopped
    }
}

/// Run every statement of `plan`, trying fallbacks in order
///
/// Never returns an error for a failing statement; failures are recorded in
/// the report and `policy` decides whether the rest of the plan runs.
pub async fn apply_statements(
    executor: &dyn StatementExecutor,
    plan: &StatementPlan,
    policy: ErrorPolicy,
) -> ApplyReport {
    let mut report = ApplyReport::default();
    let total = plan.len();

    for (i, statement) in plan.statements.iter().enumerate() {
        if report.stopped {
            report.results.push(StatementResult {
                label: statement.label.clone(),
                outcome: StatementOutcome::Skipped,
            });
            continue;
        }

        let mut errors = Vec::new();
        let mut outcome = None;
        for (attempt, sql) in statement.attempts().enumerate() {
            match executor.execute(sql).await {
                Ok(()) => {
                    outcome = Some(if attempt == 0 {
                        StatementOutcome::Applied
                    } else {
                        StatementOutcome::AppliedFallback {
                            fallback: attempt - 1,
                        }
                    });
                    break;
                }
                Err(e) => errors.push(e.to_string()),
            }
        }

        let outcome = match outcome {
            Some(outcome) => {
                info!("[{}/{}] {}: {:?}", i + 1, total, statement.label, outcome);
                outcome
            }
            None => {
                error!(
                    "[{}/{}] {} failed on {}: {}",
                    i + 1,
                    total,
                    statement.label,
                    executor.name(),
                    errors.join("; ")
                );
                if policy == ErrorPolicy::StopOnError {
                    report.stopped = true;
                }
                StatementOutcome::Failed { errors }
            }
        };
        report.results.push(StatementResult {
            label: statement.label.clone(),
            outcome,
        });
    }

    info!(
        "Applied {} of {} statements ({} failed)",
        report.applied(),
        total,
        report.failed()
    );
    report
}

/// Record of migration files already applied
pub trait MigrationLedger: Send + Sync {
    fn checksum(&self, filename: &str) -> AppResult<Option<String>>;

    fn record(&self, filename: &str, checksum: &str) -> AppResult<()>;
}

/// Ledger kept in the local store's `schema_migrations` table
pub struct SqliteLedger {
    db: Arc<Mutex<Database>>,
}

impl SqliteLedger {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    fn with_db<R>(&self, f: impl FnOnce(&Database) -> AppResult<R>) -> AppResult<R> {
        let guard = self
            .db
            .lock()
            .map_err(|_| AppError::Migration("database lock poisoned".to_string()))?;
        f(&guard)
    }
}

impl MigrationLedger for SqliteLedger {
    fn checksum(&self, filename: &str) -> AppResult<Option<String>> {
        self.with_db(|db| {
            Ok(db
                .connection()
                .query_row(
                    "SELECT checksum FROM schema_migrations WHERE filename = ?1",
                    [filename],
                    |row| row.get(0),
                )
                .optional()?)
        })
    }

    fn record(&self, filename: &str, checksum: &str) -> AppResult<()> {
        self.with_db(|db| {
            db.connection().execute(
                "INSERT OR REPLACE INTO schema_migrations (filename, checksum, applied_at)
                 VALUES (?1, ?2, ?3)",
                rusqlite::params![filename, checksum, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
    }
}

/// In-process ledger for hosted targets without a local store
#[derive(Default)]
pub struct MemoryLedger {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MigrationLedger for MemoryLedger {
    fn checksum(&self, filename: &str) -> AppResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Migration("ledger lock poisoned".to_string()))?;
        Ok(entries.get(filename).cloned())
    }

    fn record(&self, filename: &str, checksum: &str) -> AppResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Migration("ledger lock poisoned".to_string()))?;
        entries.insert(filename.to_string(), checksum.to_string());
        Ok(())
    }
}

/// Hex sha256 of a migration file's contents
pub fn file_checksum(contents: &[u8]) -> String {
    hex::encode(Sha256::digest(contents))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Applied,
    /// Already recorded with the same checksum
    Unchanged,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileResult {
    pub filename: String,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statements: Option<ApplyReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub files: Vec<FileResult>,
}

impl MigrationReport {
    pub fn count(&self, status: FileStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }
}

/// Apply every file matching `pattern`, in sorted path order
///
/// Files recorded in `ledger` with an unchanged checksum are skipped. A file is
/// recorded only when all of its statements succeed, so failed files are
/// retried on the next run. Under [`ErrorPolicy::StopOnError`] the first failed
/// file ends the run with [`AppError::Migration`].
pub async fn apply_migration_files(
    executor: &dyn StatementExecutor,
    ledger: &dyn MigrationLedger,
    pattern: &str,
    policy: ErrorPolicy,
) -> AppResult<MigrationReport> {
    let mut paths = glob::glob(pattern)?.collect::<Result<Vec<_>, _>>()?;
    paths.sort();

    if paths.is_empty() {
        warn!("No migration files match {}", pattern);
    }

    let mut report = MigrationReport::default();
    for path in paths {
        let filename = migration_name(&path);
        let contents = std::fs::read(&path)?;
        let checksum = file_checksum(&contents);

        match ledger.checksum(&filename)? {
            Some(recorded) if recorded == checksum => {
                info!("Skipping {} (already applied)", filename);
                report.files.push(FileResult {
                    filename,
                    status: FileStatus::Unchanged,
                    statements: None,
                });
                continue;
            }
            Some(_) => warn!("{} changed since it was applied; re-applying", filename),
            None => {}
        }

        let script = String::from_utf8_lossy(&contents);
        let plan = StatementPlan::from_sql(&script);
        info!("Applying {} ({} statements)", filename, plan.len());
        let applied = apply_statements(executor, &plan, policy).await;

        if applied.is_success() {
            ledger.record(&filename, &checksum)?;
            report.files.push(FileResult {
                filename,
                status: FileStatus::Applied,
                statements: Some(applied),
            });
        } else if policy == ErrorPolicy::StopOnError {
            return Err(AppError::Migration(format!(
                "{}: {} of {} statements failed",
                filename,
                applied.failed(),
                plan.len()
            )));
        } else {
            report.files.push(FileResult {
                filename,
                status: FileStatus::Failed,
                statements: Some(applied),
            });
        }
    }

    Ok(report)
}

fn migration_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
