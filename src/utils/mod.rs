//! Shared helpers for money, ratios and time buckets

pub mod currency;
pub mod math;
pub mod time;
