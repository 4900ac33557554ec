//! Migration files applied to a file-backed SQLite store

use crate::common::{seeded_database, two_week_dataset};
use anyhow::Result;
use scout_analytics::database::Database;
use scout_analytics::migrate::{
    apply_migration_files, apply_statements, ErrorPolicy, FileStatus, MigrationLedger,
    PlannedStatement, SqliteExecutor, SqliteLedger, StatementOutcome, StatementPlan,
};

fn shipped_migrations() -> String {
    format!("{}/migrations/*.sql", env!("CARGO_MANIFEST_DIR"))
}

fn column_names(db: &Database, table: &str) -> Result<Vec<String>> {
    let mut stmt = db
        .connection()
        .prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

#[tokio::test]
async fn test_shipped_migrations_apply_once() -> Result<()> {
    let (_dir, path) = seeded_database(&two_week_dataset())?;

    let executor = SqliteExecutor::new(Database::new(&path)?);
    let ledger = SqliteLedger::new(executor.shared());
    let report =
        apply_migration_files(&executor, &ledger, &shipped_migrations(), ErrorPolicy::StopOnError)
            .await?;
    assert_eq!(report.count(FileStatus::Applied), 2);
    assert_eq!(report.files[0].filename, "001_add_payment_method.sql");
    drop(ledger);
    drop(executor);

    // Ledger survives reopening the file
    let db = Database::new(&path)?;
    assert!(column_names(&db, "transactions")?.contains(&"payment_method".to_string()));
    let revenue: f64 = db.connection().query_row(
        "SELECT revenue FROM daily_sales WHERE sale_date = '2024-06-12'",
        [],
        |row| row.get(0),
    )?;
    assert_eq!(revenue, 111.0);

    let executor = SqliteExecutor::new(db);
    let ledger = SqliteLedger::new(executor.shared());
    let rerun =
        apply_migration_files(&executor, &ledger, &shipped_migrations(), ErrorPolicy::StopOnError)
            .await?;
    assert_eq!(rerun.count(FileStatus::Unchanged), 2);
    assert_eq!(rerun.count(FileStatus::Applied), 0);
    Ok(())
}

#[tokio::test]
async fn test_changed_file_is_reapplied() -> Result<()> {
    let (_dir, path) = seeded_database(&two_week_dataset())?;
    let migrations = tempfile::tempdir()?;
    let file = migrations.path().join("001_stores.sql");
    let pattern = format!("{}/*.sql", migrations.path().display());

    std::fs::write(&file, "CREATE TABLE stores (id TEXT PRIMARY KEY);")?;
    let executor = SqliteExecutor::new(Database::new(&path)?);
    let ledger = SqliteLedger::new(executor.shared());
    let first = apply_migration_files(&executor, &ledger, &pattern, ErrorPolicy::StopOnError).await?;
    assert_eq!(first.count(FileStatus::Applied), 1);
    let recorded = ledger.checksum("001_stores.sql")?;
    assert!(recorded.is_some());

    std::fs::write(
        &file,
        "CREATE TABLE IF NOT EXISTS stores (id TEXT PRIMARY KEY);\n\
         ALTER TABLE stores ADD COLUMN barangay TEXT;",
    )?;
    let second =
        apply_migration_files(&executor, &ledger, &pattern, ErrorPolicy::StopOnError).await?;
    assert_eq!(second.count(FileStatus::Applied), 1);
    assert_ne!(ledger.checksum("001_stores.sql")?, recorded);

    let shared = executor.shared();
    let db = shared.lock().map_err(|_| anyhow::anyhow!("lock poisoned"))?;
    assert!(column_names(&db, "stores")?.contains(&"barangay".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_fallback_statement_on_existing_schema() -> Result<()> {
    let (_dir, path) = seeded_database(&two_week_dataset())?;
    let executor = SqliteExecutor::new(Database::new(&path)?);

    let plan = StatementPlan::new().push(
        PlannedStatement::new(
            "recreate brands",
            "CREATE TABLE brands (id TEXT PRIMARY KEY, name TEXT)",
        )
        .with_fallback("CREATE TABLE IF NOT EXISTS brands (id TEXT PRIMARY KEY, name TEXT)"),
    );
    let report = apply_statements(&executor, &plan, ErrorPolicy::StopOnError).await;
    assert_eq!(
        report.results[0].outcome,
        StatementOutcome::AppliedFallback { fallback: 0 }
    );
    assert!(report.is_success());

    // Seeded rows are untouched
    let shared = executor.shared();
    let db = shared.lock().map_err(|_| anyhow::anyhow!("lock poisoned"))?;
    let brands: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM brands", [], |row| row.get(0))?;
    assert_eq!(brands, 3);
    Ok(())
}
