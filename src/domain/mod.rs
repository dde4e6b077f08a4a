//! Core domain types and logic.

pub mod price_series;
pub mod fundamentals;
pub mod indicator;
pub mod criteria;
pub mod screener;
pub mod sizing;
pub mod universe;
pub mod config_validation;
pub mod error;
