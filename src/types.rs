//! Scout analytics type system
//!
//! - `money`: fixed-point peso amounts (`Centavos`)
//! - `records`: source entities and the joined `SaleLine`
//! - `filters`: dashboard filter state and backend predicates
//! - `analysis_results`: report values handed to the formatters

pub mod analysis_results;
pub mod filters;
pub mod money;
pub mod records;

pub use filters::{DateRange, Filter, FilterSpec};
pub use money::Centavos;
pub use records::{Brand, Dataset, Product, SaleLine, Transaction, TransactionItem, UNKNOWN};
