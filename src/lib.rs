//! datacompare - Key-based comparison of tabular data
//!
//! Matches rows of two tables (CSV, Excel, JSON) by key, compares the
//! remaining cells under typed column rules, and renders the outcome as a
//! terminal summary, an XML track file, or an HTML report.

pub mod compare;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod parser;

pub use compare::{compare_tables, ComparisonResult, DataComparer};
pub use config::{CompareOptions, Config};
pub use error::CompareError;
pub use model::Table;
