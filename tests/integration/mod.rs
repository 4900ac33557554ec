//! Integration Tests Module
//!
//! End-to-end tests across the source, analysis and report layers.

pub mod migrations;
pub mod mock_fixture;
pub mod sqlite_pipeline;
