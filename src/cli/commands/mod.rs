pub mod analytics;
pub mod migrate;
