//! Brand, category and region ranking formatter

use super::table::{render_console, to_csv, to_print_html, to_table};
use super::utils::{console_header, export_json, format_number};
use super::OutputFormat;
use crate::errors::AppResult;
use crate::types::analysis_results::PerformanceReport;
use crate::utils::currency::{format_pesos, format_percent, DisplayValue};

fn title(report: &PerformanceReport) -> String {
    format!("{} Performance", report.dimension.display_name())
}

/// Format a performance ranking
///
/// JSON carries the full report (totals and client split); CSV and HTML carry
/// the ranked rows only.
pub fn format_performance(report: &PerformanceReport, format: &OutputFormat) -> AppResult<String> {
    let table = to_table(&report.results, report.dimension.display_name());
    match format {
        OutputFormat::Json => export_json(report),
        OutputFormat::Csv => to_csv(&table),
        OutputFormat::Html => Ok(to_print_html(&table, &title(report))),
        OutputFormat::Console => {
            let mut output = console_header(&title(report));

            if report.is_empty() {
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
            output.push_str(&format!(
                "Units Sold: {}\n\n",
                format_number(report.total_units)
            ));

            output.push_str(&render_console(&table));

            if let Some(split) = &report.client_share {
                output.push('\n');
                output.push_str(&format!(
                    "Client Brands: {} ({})\n",
                    format_pesos(split.client_revenue),
                    format_percent(&DisplayValue::Number(split.client_share_percent))
                ));
                output.push_str(&format!(
                    "Competitors:   {} ({})\n",
                    format_pesos(split.competitor_revenue),
                    format_percent(&DisplayValue::Number(split.competitor_share_percent))
                ));
            }

            Ok(output)
        }
    }
}
