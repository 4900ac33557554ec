use super::analytics::{get_db_path_from_config, parse_format, write_output_to_file};
use crate::analysis::reports::utils::{console_header, export_json};
use crate::analysis::OutputFormat;
use crate::config::AppConfig;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::migrate::{
    apply_migration_files, ErrorPolicy, FileStatus, MigrationReport, PostgrestExecutor,
    SqliteExecutor, SqliteLedger, StatementExecutor, StatementOutcome,
};
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Where statements are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MigrationTarget {
    Sqlite,
    Supabase,
}

/// Apply SQL migration files in sorted order
#[derive(Args, Debug, Clone)]
pub struct MigrateCommand {
    /// Glob of migration files
    #[arg(long, default_value = "./migrations/*.sql")]
    pub files: String,

    /// Execute against the local store or the hosted database's exec_sql RPC
    #[arg(long, value_enum, default_value = "sqlite")]
    pub target: MigrationTarget,

    /// SQLite database path, also holding the applied-files ledger (overrides config.toml)
    #[arg(long)]
    pub database_path: Option<PathBuf>,

    /// Stop at the first statement that fails with all its fallbacks
    #[arg(long)]
    pub stop_on_error: bool,

    /// RPC function used for the supabase target
    #[arg(long, default_value = "exec_sql")]
    pub rpc_function: String,

    /// Name of the RPC function's SQL argument
    #[arg(long, default_value = "sql")]
    pub rpc_param: String,

    /// Output format (console or json)
    #[arg(long, default_value = "console")]
    pub format: String,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

impl MigrateCommand {
    pub async fn run(&self) -> AppResult<()> {
        let config = AppConfig::get_defaults()?;
        let db_path = get_db_path_from_config(&self.database_path, &config);
        let format = parse_format(&self.format)?;
        let policy = if self.stop_on_error {
            ErrorPolicy::StopOnError
        } else {
            ErrorPolicy::ContinueOnError
        };

        let db = Arc::new(Mutex::new(Database::new(&db_path)?));
        let ledger = SqliteLedger::new(Arc::clone(&db));
        let executor: Box<dyn StatementExecutor> = match self.target {
            MigrationTarget::Sqlite => Box::new(SqliteExecutor::from_shared(Arc::clone(&db))),
            MigrationTarget::Supabase => {
                if config.source.api_key.is_empty() {
                    return Err(AppError::Config(
                        "Supabase target selected but no API key configured. Set SUPABASE_ANON_KEY or source.api_key in config.toml".to_string(),
                    ));
                }
                Box::new(
                    PostgrestExecutor::new(
                        &config.source.url,
                        &config.source.api_key,
                        config.source.timeout_seconds,
                    )
                    .with_function(&self.rpc_function, &self.rpc_param),
                )
            }
        };

        info!(
            "Applying {} with {} executor (ledger: {})",
            self.files,
            executor.name(),
            db_path
        );
        let report = apply_migration_files(executor.as_ref(), &ledger, &self.files, policy).await?;
        let formatted = format_migration_report(&report, &format)?;

        match &self.output {
            Some(path) => write_output_to_file(path, &formatted, "Migration report"),
            None => {
                print!("{}", formatted);
                Ok(())
            }
        }
    }
}

/// Console or JSON view of a migration run
pub fn format_migration_report(report: &MigrationReport, format: &OutputFormat) -> AppResult<String> {
    match format {
        OutputFormat::Json => export_json(report),
        OutputFormat::Console => {
            let mut output = console_header("Migration Results");

            if report.files.is_empty() {
                output.push_str("No migration files found.\n");
                return Ok(output);
            }

            for file in &report.files {
                let status = match file.status {
                    FileStatus::Applied => "✅ applied",
                    FileStatus::Unchanged => "⏭️  unchanged",
                    FileStatus::Failed => "❌ failed",
                };
                output.push_str(&format!("  {:<40} {}\n", file.filename, status));

                if let Some(statements) = &file.statements {
                    for result in &statements.results {
                        match &result.outcome {
                            StatementOutcome::AppliedFallback { fallback } => output.push_str(
                                &format!("      {}: applied fallback {}\n", result.label, fallback + 1),
                            ),
                            StatementOutcome::Failed { errors } => output.push_str(&format!(
                                "      {}: {}\n",
                                result.label,
                                errors.last().map(String::as_str).unwrap_or("failed")
                            )),
                            _ => {}
                        }
                    }
                }
            }

            output.push_str(&format!(
                "\nApplied: {}  Unchanged: {}  Failed: {}\n",
                report.count(FileStatus::Applied),
                report.count(FileStatus::Unchanged),
                report.count(FileStatus::Failed)
            ));
            Ok(output)
        }
        other => Err(AppError::Config(format!(
            "{:?} output is not available for migration reports (use console or json)",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::{ApplyReport, FileResult, StatementResult};

    #[test]
    fn test_console_migration_report() {
        let report = MigrationReport {
            files: vec![
                FileResult {
                    filename: "001_payment.sql".to_string(),
                    status: FileStatus::Unchanged,
                    statements: None,
                },
                FileResult {
                    filename: "002_views.sql".to_string(),
                    status: FileStatus::Failed,
                    statements: Some(ApplyReport {
                        results: vec![StatementResult {
                            label: "statement 1".to_string(),
                            outcome: StatementOutcome::Failed {
                                errors: vec!["no such table: stores".to_string()],
                            },
                        }],
                        stopped: false,
                    }),
                },
            ],
        };
        let output = format_migration_report(&report, &OutputFormat::Console).unwrap();
        assert!(output.contains("📊 Migration Results"));
        assert!(output.contains("statement 1: no such table: stores"));
        assert!(output.contains("Applied: 0  Unchanged: 1  Failed: 1"));

        assert!(format_migration_report(&report, &OutputFormat::Csv).is_err());
    }
}
