//! Tabular export structures
//!
//! A [`Table`] keeps raw cell values with a per-column kind. Console and HTML
//! output format cells for display (`₱1,235`, `33.3%`); CSV and JSON keep the
//! raw values so exports stay machine-readable. Row order is always the order
//! the rows were added in.

use super::utils::format_number;
use crate::errors::AppResult;
use crate::types::analysis_results::{AggregationResult, TimeSeriesReport};
use crate::utils::currency::{format_currency, format_growth, format_percent, DisplayValue};
use serde::Serialize;
use serde_json::{Map, Value};

/// How a column is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Text,
    Money,
    Count,
    Percent,
    Growth,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<DisplayValue>>,
}

impl Table {
    pub fn new(columns: &[(&str, ColumnKind)]) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|(name, kind)| Column {
                    name: name.to_string(),
                    kind: *kind,
                })
                .collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<DisplayValue>) {
        self.rows.push(row);
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells formatted for display
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&self.columns)
                    .map(|(cell, column)| display_cell(cell, column.kind))
                    .collect()
            })
            .collect()
    }
}

fn display_cell(cell: &DisplayValue, kind: ColumnKind) -> String {
    match (kind, cell) {
        (ColumnKind::Money, _) => format_currency(cell),
        (ColumnKind::Percent, _) => format_percent(cell),
        (_, DisplayValue::Money(_)) => format_currency(cell),
        (ColumnKind::Growth, DisplayValue::Number(n)) => format_growth(*n),
        (ColumnKind::Count, DisplayValue::Number(n)) if n.is_finite() && n.fract() == 0.0 => {
            format_number(*n as i64)
        }
        _ => cell.to_string(),
    }
}

/// Raw cell text for CSV
fn raw_cell(cell: &DisplayValue) -> String {
    cell.to_string()
}

fn raw_json(cell: &DisplayValue) -> Value {
    match cell {
        DisplayValue::Money(c) => Value::from(c.as_pesos()),
        DisplayValue::Number(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        DisplayValue::Text(s) => Value::String(s.clone()),
    }
}

/// Ranked results as a table, keyed by `key_header`
///
/// A client column is added when any row carries the client flag, and a brand
/// column after the key when rows carry their brand (product mix).
pub fn to_table(results: &[AggregationResult], key_header: &str) -> Table {
    let with_client = results.iter().any(|r| r.is_client.is_some());
    let with_brand = results.iter().any(|r| r.brand.is_some());
    let mut columns = vec![(key_header, ColumnKind::Text)];
    if with_brand {
        columns.push(("Brand", ColumnKind::Text));
    }
    columns.extend([
        ("Revenue", ColumnKind::Money),
        ("Transactions", ColumnKind::Count),
        ("Units", ColumnKind::Count),
        ("Market Share", ColumnKind::Percent),
        ("Growth", ColumnKind::Growth),
    ]);
    if with_client {
        columns.push(("Client", ColumnKind::Text));
    }

    let mut table = Table::new(&columns);
    for r in results {
        let mut row = vec![DisplayValue::from(r.group_key.as_str())];
        if with_brand {
            row.push(DisplayValue::from(r.brand.as_deref().unwrap_or("")));
        }
        row.extend([
            DisplayValue::Money(r.revenue),
            DisplayValue::Number(r.transaction_count as f64),
            DisplayValue::Number(r.units_sold as f64),
            DisplayValue::Number(r.market_share_percent),
            DisplayValue::Number(r.growth_percent),
        ]);
        if with_client {
            row.push(DisplayValue::from(match r.is_client {
                Some(true) => "Yes",
                Some(false) => "No",
                None => "",
            }));
        }
        table.push_row(row);
    }
    table
}

/// Time series points as a table, chronological
pub fn series_table(report: &TimeSeriesReport) -> Table {
    let mut table = Table::new(&[
        ("Period", ColumnKind::Text),
        ("Revenue", ColumnKind::Money),
        ("Transactions", ColumnKind::Count),
        ("Units", ColumnKind::Count),
        ("Avg Transaction", ColumnKind::Money),
    ]);
    for point in &report.points {
        table.push_row(vec![
            DisplayValue::from(point.label.as_str()),
            DisplayValue::Money(point.revenue),
            DisplayValue::Number(point.transaction_count as f64),
            DisplayValue::Number(point.units_sold as f64),
            DisplayValue::Money(point.avg_transaction_value),
        ]);
    }
    table
}

/// CSV with a header row and standard quoting
pub fn to_csv(table: &Table) -> AppResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.headers())?;
    for row in &table.rows {
        writer.write_record(row.iter().map(raw_cell))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| crate::errors::AppError::InvalidData(format!("CSV flush failed: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| crate::errors::AppError::InvalidData(format!("CSV is not UTF-8: {}", e)))
}

/// Array of objects keyed by header, in row order
pub fn to_json(table: &Table) -> AppResult<String> {
    let rows: Vec<Value> = table
        .rows
        .iter()
        .map(|row| {
            let object: Map<String, Value> = table
                .columns
                .iter()
                .zip(row)
                .map(|(column, cell)| (column.name.clone(), raw_json(cell)))
                .collect();
            Value::Object(object)
        })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Standalone printable HTML page holding one table
pub fn to_print_html(table: &Table, title: &str) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    html.push_str(
        "<style>\n\
         body { font-family: sans-serif; margin: 24px; }\n\
         table { border-collapse: collapse; width: 100%; }\n\
         th, td { border: 1px solid #ccc; padding: 6px 10px; }\n\
         td.num { text-align: right; }\n\
         @media print { body { margin: 0; } }\n\
         </style>\n</head>\n<body>\n",
    );
    html.push_str(&format!("<h1>{}</h1>\n<table>\n<thead><tr>", escape_html(title)));
    for column in &table.columns {
        html.push_str(&format!("<th>{}</th>", escape_html(&column.name)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in table.display_rows() {
        html.push_str("<tr>");
        for (cell, column) in row.iter().zip(&table.columns) {
            if column.kind == ColumnKind::Text {
                html.push_str(&format!("<td>{}</td>", escape_html(cell)));
            } else {
                html.push_str(&format!("<td class=\"num\">{}</td>", escape_html(cell)));
            }
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    html
}

/// Aligned plain-text rendering for the console
pub fn render_console(table: &Table) -> String {
    let rows = table.display_rows();
    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.chars().count())
                .chain(std::iter::once(column.name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: Vec<&str>| -> String {
        let parts: Vec<String> = cells
            .iter()
            .zip(&table.columns)
            .zip(&widths)
            .map(|((cell, column), width)| match column.kind {
                ColumnKind::Text => format!("{:<width$}", cell, width = width),
                _ => format!("{:>width$}", cell, width = width),
            })
            .collect();
        format!("  {}\n", parts.join("  ").trim_end())
    };

    let mut output = line(table.headers());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&line(rule.iter().map(String::as_str).collect()));
    for row in &rows {
        output.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    output
}
