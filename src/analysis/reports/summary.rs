//! KPI summary and demographics formatters

use super::table::{render_console, to_csv, to_print_html, to_table, ColumnKind, Table};
use super::utils::{console_header, export_json, format_number};
use super::OutputFormat;
use crate::errors::AppResult;
use crate::types::analysis_results::{DemographicsReport, KpiSummary};
use crate::utils::currency::{format_growth, format_pesos, DisplayValue};

/// One row per KPI: value and growth against the previous period
pub fn kpi_table(summary: &KpiSummary) -> Table {
    let mut table = Table::new(&[
        ("Metric", ColumnKind::Text),
        ("Value", ColumnKind::Text),
        ("Growth", ColumnKind::Growth),
    ]);
    let rows = [
        (
            "Total Revenue",
            DisplayValue::Money(summary.total_revenue),
            summary.revenue_growth,
        ),
        (
            "Transactions",
            DisplayValue::Number(summary.transaction_count as f64),
            summary.transaction_growth,
        ),
        (
            "Avg Transaction",
            DisplayValue::Money(summary.avg_transaction_value),
            summary.avg_value_growth,
        ),
        (
            "Unique Customers",
            DisplayValue::Number(summary.unique_customers as f64),
            summary.customer_growth,
        ),
    ];
    for (metric, value, growth) in rows {
        table.push_row(vec![
            DisplayValue::from(metric),
            value,
            DisplayValue::Number(growth),
        ]);
    }
    table
}

/// Format the headline KPIs
pub fn format_summary(summary: &KpiSummary, format: &OutputFormat) -> AppResult<String> {
    match format {
        OutputFormat::Json => export_json(summary),
        OutputFormat::Csv => to_csv(&kpi_table(summary)),
        OutputFormat::Html => Ok(to_print_html(&kpi_table(summary), "Dashboard Summary")),
        OutputFormat::Console => {
            let mut output = console_header("Dashboard Summary");

            if let Some(period) = &summary.period {
                output.push_str(&format!("Period: {} to {}\n", period.start, period.end));
            }
            if let Some(previous) = &summary.previous_period {
                output.push_str(&format!(
                    "Compared with: {} to {}\n",
                    previous.start, previous.end
                ));
            }
            output.push('\n');

            output.push_str(&format!(
                "  {:<18} {:>14} {:>10}\n",
                "Metric", "Value", "Growth"
            ));
            output.push_str(&format!("  {:-<18} {:->14} {:->10}\n", "", "", ""));
            let rows = [
                (
                    "Total Revenue",
                    format_pesos(summary.total_revenue),
                    summary.revenue_growth,
                ),
                (
                    "Transactions",
                    format_number(summary.transaction_count as i64),
                    summary.transaction_growth,
                ),
                (
                    "Avg Transaction",
                    format_pesos(summary.avg_transaction_value),
                    summary.avg_value_growth,
                ),
                (
                    "Unique Customers",
                    format_number(summary.unique_customers as i64),
                    summary.customer_growth,
                ),
            ];
            for (metric, value, growth) in rows {
                output.push_str(&format!(
                    "  {:<18} {:>14} {:>10}\n",
                    metric,
                    value,
                    format_growth(growth)
                ));
            }
            output.push_str(&format!(
                "\nUnits Sold: {}\n",
                format_number(summary.units_sold)
            ));
            output.push_str("Note: Unique customers are approximated by age, gender and store.\n");

            Ok(output)
        }
    }
}

/// Gender rows followed by age band rows, with a leading segment column
fn demographics_table(report: &DemographicsReport) -> Table {
    let gender = to_table(&report.by_gender.results, "Group");
    let age = to_table(&report.by_age_band.results, "Group");

    let mut columns = vec![("Segment", ColumnKind::Text)];
    columns.extend(gender.columns.iter().map(|c| (c.name.as_str(), c.kind)));
    let mut table = Table::new(&columns);
    for (segment, rows) in [("Gender", gender.rows), ("Age Band", age.rows)] {
        for row in rows {
            let mut cells = vec![DisplayValue::from(segment)];
            cells.extend(row);
            table.push_row(cells);
        }
    }
    table
}

/// Format shopper demographics
pub fn format_demographics(report: &DemographicsReport, format: &OutputFormat) -> AppResult<String> {
    match format {
        OutputFormat::Json => export_json(report),
        OutputFormat::Csv => to_csv(&demographics_table(report)),
        OutputFormat::Html => Ok(to_print_html(
            &demographics_table(report),
            "Customer Demographics",
        )),
        OutputFormat::Console => {
            let mut output = console_header("Customer Demographics");

            if report.by_gender.is_empty() {
                output.push_str("No sales found for the selected filters.\n");
                return Ok(output);
            }

            output.push_str("By Gender:\n");
            output.push_str(&render_console(&to_table(
                &report.by_gender.results,
                "Gender",
            )));
            output.push_str("\nBy Age Band:\n");
            output.push_str(&render_console(&to_table(
                &report.by_age_band.results,
                "Age Band",
            )));

            Ok(output)
        }
    }
}
