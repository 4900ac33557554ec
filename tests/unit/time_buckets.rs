//! Bucket keys in the reference timezone

use chrono::{NaiveDate, TimeZone, Utc};
use scout_analytics::utils::time::{bucket_key, parse_timestamp, BucketKey, Granularity, TimeBucketer};

#[test]
fn test_bucket_key_examples() {
    let ts = parse_timestamp("2024-06-15T14:30:00Z").unwrap();
    assert_eq!(bucket_key(ts, Granularity::Hour), BucketKey::Hour(14));
    assert_eq!(bucket_key(ts, Granularity::Hour).to_string(), "14");
    assert_eq!(bucket_key(ts, Granularity::Day).to_string(), "2024-06-15");
    assert_eq!(bucket_key(ts, Granularity::Week).to_string(), "2024-06-10");
    assert_eq!(bucket_key(ts, Granularity::Month).to_string(), "2024-06");
}

#[test]
fn test_reference_offset_moves_day_boundary() {
    let manila = TimeBucketer::from_offset_minutes(8 * 60).unwrap();
    let late_utc = Utc.with_ymd_and_hms(2024, 6, 30, 17, 0, 0).unwrap();

    assert_eq!(
        manila.bucket_key(late_utc, Granularity::Day),
        BucketKey::Day(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap())
    );
    assert_eq!(
        manila.bucket_key(late_utc, Granularity::Month),
        BucketKey::Month { year: 2024, month: 7 }
    );
    assert_eq!(manila.bucket_key(late_utc, Granularity::Hour), BucketKey::Hour(1));
}

#[test]
fn test_buckets_are_contiguous() {
    let start = BucketKey::Month { year: 2024, month: 11 };
    let next = start.next();
    assert_eq!(next, BucketKey::Month { year: 2024, month: 12 });
    assert_eq!(next.next(), BucketKey::Month { year: 2025, month: 1 });
    assert!(start < next);

    let (_, end) = start.date_range().unwrap();
    let (next_start, _) = next.date_range().unwrap();
    assert_eq!(end, next_start);
}

#[test]
fn test_naive_timestamps_are_utc() {
    let naive = parse_timestamp("2024-06-15 14:30:00").unwrap();
    let explicit = parse_timestamp("2024-06-15T22:30:00+08:00").unwrap();
    assert_eq!(naive, explicit);
    assert!(parse_timestamp("yesterday").is_none());
}
