//! Dashboard filter parameters
//!
//! Filters are passed explicitly into every fetch and aggregation call. All
//! conditions combine with AND; an empty list means "no restriction".

use super::records::SaleLine;
use crate::analysis::performance::{age_band, gender_label};
use crate::utils::time::TimeBucketer;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inclusive calendar date range, interpreted in the pipeline's reference timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// The range of equal length immediately before this one, used for growth
    pub fn previous(&self) -> DateRange {
        let len = Duration::days(self.days());
        DateRange {
            start: self.start - len,
            end: self.end - len,
        }
    }

    /// Half-open UTC instant bounds `[start, end)`
    pub fn instant_bounds(&self, bucketer: &TimeBucketer) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            bucketer.start_of_day(self.start),
            bucketer.start_of_day(self.end + Duration::days(1)),
        )
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// One comparison pushed down to the row source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Filter {
    Eq(String, Value),
    In(String, Vec<Value>),
    Gte(String, Value),
    Lte(String, Value),
    Lt(String, Value),
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(c, _) | Filter::In(c, _) | Filter::Gte(c, _) | Filter::Lte(c, _) | Filter::Lt(c, _) => c,
        }
    }

    /// Evaluate against a JSON object row; a missing column never matches
    pub fn matches(&self, row: &serde_json::Map<String, Value>) -> bool {
        let Some(actual) = row.get(self.column()) else {
            return false;
        };
        match self {
            Filter::Eq(_, expected) => values_equal(actual, expected),
            Filter::In(_, options) => options.iter().any(|o| values_equal(actual, o)),
            Filter::Gte(_, bound) => compare(actual, bound).is_some_and(|o| o.is_ge()),
            Filter::Lte(_, bound) => compare(actual, bound).is_some_and(|o| o.is_le()),
            Filter::Lt(_, bound) => compare(actual, bound).is_some_and(|o| o.is_lt()),
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        // Ids are compared textually so "7" matches 7
        (Value::Number(x), Value::String(y)) | (Value::String(y), Value::Number(x)) => {
            x.to_string() == *y
        }
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => {
            // Timestamps compare as instants, everything else lexically
            match (
                crate::utils::time::parse_timestamp(x),
                crate::utils::time::parse_timestamp(y),
            ) {
                (Some(tx), Some(ty)) => Some(tx.cmp(&ty)),
                _ => Some(x.cmp(y)),
            }
        }
        _ => None,
    }
}

/// User-selected dashboard filters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub brands: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub stores: Vec<String>,
    /// Product names or ids
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub genders: Vec<String>,
    /// Age band labels such as `25-34` or `55+`
    #[serde(default)]
    pub age_bands: Vec<String>,
}

impl FilterSpec {
    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.date_range.is_none()
            && self.regions.is_empty()
            && self.brands.is_empty()
            && self.categories.is_empty()
            && self.stores.is_empty()
            && self.products.is_empty()
            && self.genders.is_empty()
            && self.age_bands.is_empty()
    }

    /// Conditions the `transactions` table can evaluate itself
    ///
    /// Region, brand and category live on joined rows and are applied by
    /// [`FilterSpec::matches`] after the join.
    pub fn transaction_filters(&self, bucketer: &TimeBucketer) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(range) = &self.date_range {
            let (start, end) = range.instant_bounds(bucketer);
            filters.push(Filter::Gte(
                "created_at".to_string(),
                Value::String(start.to_rfc3339()),
            ));
            filters.push(Filter::Lt(
                "created_at".to_string(),
                Value::String(end.to_rfc3339()),
            ));
        }
        if !self.stores.is_empty() {
            filters.push(Filter::In(
                "store_id".to_string(),
                self.stores.iter().cloned().map(Value::String).collect(),
            ));
        }
        filters
    }

    /// Full conjunctive check on a joined line
    pub fn matches(&self, line: &SaleLine, bucketer: &TimeBucketer) -> bool {
        if let Some(range) = &self.date_range {
            if !range.contains(bucketer.local_date(line.timestamp)) {
                return false;
            }
        }
        if !self.stores.is_empty() {
            match &line.store_id {
                Some(store) if self.stores.iter().any(|s| s == store) => {}
                _ => return false,
            }
        }
        if !self.products.is_empty()
            && !self.products.iter().any(|p| {
                p.eq_ignore_ascii_case(&line.product_name) || *p == line.product_id
            })
        {
            return false;
        }
        if !self.genders.is_empty() {
            let label = gender_label(line.customer_gender.as_deref());
            if !self
                .genders
                .iter()
                .any(|g| g.eq_ignore_ascii_case(&label) || gender_label(Some(g)) == label)
            {
                return false;
            }
        }
        matches_any(&self.regions, &line.region)
            && matches_any(&self.brands, &line.brand)
            && matches_any(&self.categories, &line.category)
            && matches_any(&self.age_bands, age_band(line.customer_age))
    }
}

fn matches_any(selected: &[String], value: &str) -> bool {
    selected.is_empty() || selected.iter().any(|s| s.eq_ignore_ascii_case(value))
}
