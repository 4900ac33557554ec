//! Time series report formatter

use super::table::{render_console, series_table, to_csv, to_print_html};
use super::utils::{console_header, export_json, format_number};
use super::OutputFormat;
use crate::errors::AppResult;
use crate::types::analysis_results::TimeSeriesReport;
use crate::utils::currency::format_pesos;
use crate::utils::time::Granularity;

fn title(report: &TimeSeriesReport) -> String {
    let label = match report.granularity {
        Granularity::Hour => "Hourly",
        Granularity::Day => "Daily",
        Granularity::Week => "Weekly",
        Granularity::Month => "Monthly",
    };
    format!("{} Sales Trend", label)
}

/// Format a time series
///
/// Rows are chronological. `--format json` carries the bucket keys as well as
/// the display labels.
pub fn format_time_series(report: &TimeSeriesReport, format: &OutputFormat) -> AppResult<String> {
    let table = series_table(report);
    match format {
        OutputFormat::Json => export_json(report),
        OutputFormat::Csv => to_csv(&table),
        OutputFormat::Html => Ok(to_print_html(&table, &title(report))),
        OutputFormat::Console => {
            let mut output = console_header(&title(report));

            if report.total_transactions == 0 {
                output.push_str("No sales found for the selected filters.\n");
                return Ok(output);
            }

            output.push_str(&format!(
                "Total Revenue: {}\n",
                format_pesos(report.total_revenue)
            ));
            output.push_str(&format!(
                "Transactions: {}\n",
                format_number(report.total_transactions as i64)
            ));
            if let (Some(first), Some(last)) = (&report.first_date, &report.last_date) {
                output.push_str(&format!("Period: {} to {}\n", first, last));
            }
            output.push('\n');

            output.push_str(&render_console(&table));

            if report.granularity == Granularity::Hour {
                output.push('\n');
                output.push_str("Note: Hours are in the configured reference timezone.\n");
            }

            Ok(output)
        }
    }
}
