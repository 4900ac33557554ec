//! Unit Tests Module
//!
//! Behaviour of individual components through the public API.

pub mod aggregation;
pub mod formatters;
pub mod pagination;
pub mod time_buckets;
