//! Time utilities for temporal analysis
//!
//! Maps transaction timestamps to hour/day/week/month bucket keys. Every key is
//! computed in a single reference timezone held by [`TimeBucketer`]; source
//! timestamps are parsed as UTC instants and shifted once, here.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone, Timelike, Utc,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bucket granularity for time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
    Week,
    Month,
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hour" | "hourly" => Ok(Granularity::Hour),
            "day" | "daily" => Ok(Granularity::Day),
            "week" | "weekly" => Ok(Granularity::Week),
            "month" | "monthly" => Ok(Granularity::Month),
            other => Err(format!("unknown granularity '{}'", other)),
        }
    }
}

/// Normalised key for one time bucket
///
/// Keys of the same granularity order chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BucketKey {
    /// Hour of day, 0-23
    Hour(u32),
    /// Calendar date
    Day(NaiveDate),
    /// Monday starting the ISO week
    Week(NaiveDate),
    Month { year: i32, month: u32 },
}

impl BucketKey {
    pub fn granularity(&self) -> Granularity {
        match self {
            BucketKey::Hour(_) => Granularity::Hour,
            BucketKey::Day(_) => Granularity::Day,
            BucketKey::Week(_) => Granularity::Week,
            BucketKey::Month { .. } => Granularity::Month,
        }
    }

    /// The adjacent following bucket (hours wrap at midnight)
    pub fn next(&self) -> BucketKey {
        match *self {
            BucketKey::Hour(h) => BucketKey::Hour((h + 1) % 24),
            BucketKey::Day(d) => BucketKey::Day(d + Duration::days(1)),
            BucketKey::Week(d) => BucketKey::Week(d + Duration::days(7)),
            BucketKey::Month { year, month } if month == 12 => BucketKey::Month {
                year: year + 1,
                month: 1,
            },
            BucketKey::Month { year, month } => BucketKey::Month {
                year,
                month: month + 1,
            },
        }
    }

    /// Half-open date range `[start, end)` covered by a day, week or month bucket
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match *self {
            BucketKey::Hour(_) => None,
            BucketKey::Day(d) => Some((d, d + Duration::days(1))),
            BucketKey::Week(d) => Some((d, d + Duration::days(7))),
            BucketKey::Month { year, month } => {
                let start = NaiveDate::from_ymd_opt(year, month, 1)?;
                let end = match self.next() {
                    BucketKey::Month { year, month } => NaiveDate::from_ymd_opt(year, month, 1)?,
                    _ => return None,
                };
                Some((start, end))
            }
        }
    }

    /// Chart label; hours render as `HH:00`
    pub fn label(&self) -> String {
        match self {
            BucketKey::Hour(h) => format!("{:02}:00", h),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKey::Hour(h) => write!(f, "{}", h),
            BucketKey::Day(d) | BucketKey::Week(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            BucketKey::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
        }
    }
}

impl Serialize for BucketKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BucketKey::Hour(h) => serializer.serialize_u32(*h),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

/// Computes bucket keys in one fixed reference timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBucketer {
    offset: FixedOffset,
}

impl Default for TimeBucketer {
    fn default() -> Self {
        Self::utc()
    }
}

impl TimeBucketer {
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Reference timezone given as minutes east of UTC (Asia/Manila is 480)
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(|offset| Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    fn local(&self, timestamp: DateTime<Utc>) -> NaiveDateTime {
        timestamp.with_timezone(&self.offset).naive_local()
    }

    /// Map a timestamp to its bucket key
    pub fn bucket_key(&self, timestamp: DateTime<Utc>, granularity: Granularity) -> BucketKey {
        let local = self.local(timestamp);
        let date = local.date();
        match granularity {
            Granularity::Hour => BucketKey::Hour(local.hour()),
            Granularity::Day => BucketKey::Day(date),
            Granularity::Week => BucketKey::Week(iso_week_start(date)),
            Granularity::Month => BucketKey::Month {
                year: date.year(),
                month: date.month(),
            },
        }
    }

    /// Calendar date of a timestamp in the reference timezone
    pub fn local_date(&self, timestamp: DateTime<Utc>) -> NaiveDate {
        self.local(timestamp).date()
    }

    /// UTC instant of local midnight starting `date`
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(NaiveTime::MIN);
        match self.offset.from_local_datetime(&midnight).single() {
            Some(local) => local.with_timezone(&Utc),
            None => Utc.from_utc_datetime(&midnight),
        }
    }
}

/// Bucket a timestamp in UTC
///
/// # Examples
/// ```
/// use scout_analytics::utils::time::{bucket_key, parse_timestamp, Granularity};
///
/// let ts = parse_timestamp("2024-06-15T14:30:00Z").unwrap();
/// assert_eq!(bucket_key(ts, Granularity::Hour).to_string(), "14");
/// assert_eq!(bucket_key(ts, Granularity::Day).to_string(), "2024-06-15");
/// ```
pub fn bucket_key(timestamp: DateTime<Utc>, granularity: Granularity) -> BucketKey {
    TimeBucketer::utc().bucket_key(timestamp, granularity)
}

/// Monday of the ISO week containing `date`
pub fn iso_week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Parse a source timestamp
///
/// Accepts RFC 3339, Postgres text output (`2024-06-15 14:30:00+00`), and naive
/// date-times or bare dates, which are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Serde adapter for [`parse_timestamp`]
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}
