//! Report formatting and output generation
//!
//! Provides formatting for analysis results via the [`ReportFormatter`] facade.
//! Supports Console, JSON, CSV and printable HTML output formats.

pub mod performance;
pub mod summary;
pub mod table;
pub mod temporal;
pub mod utils;

use crate::errors::{AppError, AppResult};
use crate::types::analysis_results::{
    DemographicsReport, KpiSummary, PerformanceReport, TimeSeriesReport,
};
use std::str::FromStr;

pub use table::{to_csv, to_json, to_print_html, to_table, ColumnKind, Table};

/// Output format options for analysis reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
    Csv,
    Html,
}

impl OutputFormat {
    /// File extension used when exporting to a file
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Console => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Html => "html",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" | "text" => Ok(OutputFormat::Console),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "html" | "print" => Ok(OutputFormat::Html),
            other => Err(AppError::Config(format!(
                "Unknown output format '{}' (expected console, json, csv or html)",
                other
            ))),
        }
    }
}

/// Facade for all report formatting operations
pub struct ReportFormatter;

impl ReportFormatter {
    // Utilities
    pub fn format_number(n: i64) -> String {
        utils::format_number(n)
    }

    // Performance
    pub fn format_performance(r: &PerformanceReport, f: &OutputFormat) -> AppResult<String> {
        performance::format_performance(r, f)
    }

    // Temporal
    pub fn format_time_series(r: &TimeSeriesReport, f: &OutputFormat) -> AppResult<String> {
        temporal::format_time_series(r, f)
    }

    // Summary
    pub fn format_summary(r: &KpiSummary, f: &OutputFormat) -> AppResult<String> {
        summary::format_summary(r, f)
    }
    pub fn format_demographics(r: &DemographicsReport, f: &OutputFormat) -> AppResult<String> {
        summary::format_demographics(r, f)
    }
}
