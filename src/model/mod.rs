//! Data model for tabular data representation

mod key;
mod schema;
mod table;

pub use key::{KeyIndexer, KEY_SEPARATOR};
pub use schema::{CellType, Column, ColumnComparisonDetail, ColumnType};
pub use table::{parse_timestamp, CellValue, Row, Table};
