//! Loaders reading tabular files into [`Table`]s

mod csv;
mod excel;
mod json;

use std::path::Path;

use anyhow::{bail, Result};
use tracing::info;

use crate::config::Config;
use crate::model::{CellType, CellValue, Table};

pub use self::csv::CsvParser;
pub use self::excel::ExcelParser;
pub use self::json::JsonParser;

/// Trait for parsing tabular data files
pub trait Parser: Send + Sync {
    /// Parse a file and return a Table
    fn parse(&self, path: &Path, config: &Config) -> Result<Table>;

    /// Check if this parser can handle the given file extension
    fn supports_extension(&self, ext: &str) -> bool;
}

/// Factory for creating parsers based on file extension
pub struct ParserFactory {
    parsers: Vec<Box<dyn Parser>>,
}

impl Default for ParserFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserFactory {
    /// Create a new parser factory with all supported parsers
    pub fn new() -> Self {
        Self {
            parsers: vec![
                Box::new(CsvParser),
                Box::new(ExcelParser),
                Box::new(JsonParser),
            ],
        }
    }

    /// Get a parser for the given file path
    pub fn get_parser(&self, path: &Path) -> Result<&dyn Parser> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        for parser in &self.parsers {
            if parser.supports_extension(&ext) {
                return Ok(parser.as_ref());
            }
        }

        bail!(
            "Unsupported file format: {}",
            path.extension()
                .and_then(|e| e.to_str())
                .unwrap_or("unknown")
        )
    }

    /// Parse a file using the appropriate parser
    pub fn parse(&self, path: &Path, config: &Config) -> Result<Table> {
        let parser = self.get_parser(path)?;
        let table = parser.parse(path, config)?;
        info!(
            path = %path.display(),
            rows = table.row_count(),
            columns = table.column_count(),
            "table loaded"
        );
        Ok(table)
    }
}

/// Infer column types from data
pub(crate) fn infer_column_types(table: &mut Table) {
    for col_idx in 0..table.column_count() {
        let mut inferred = CellType::Null;

        for row in &table.rows {
            if let Some(cell) = row.cells.get(col_idx) {
                let cell_type = match cell {
                    CellValue::Null => CellType::Null,
                    CellValue::Bool(_) => CellType::Bool,
                    CellValue::Int(_) => CellType::Int,
                    CellValue::Float(_) => CellType::Float,
                    CellValue::String(_) => CellType::String,
                    CellValue::Date(_) => CellType::Date,
                    CellValue::DateTime(_) => CellType::DateTime,
                };

                inferred = inferred.widen(cell_type);
            }
        }

        if let Some(col) = table.columns.get_mut(col_idx) {
            col.inferred_type = inferred;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_selection() {
        let factory = ParserFactory::new();
        assert!(factory.get_parser(Path::new("a.CSV")).is_ok());
        assert!(factory.get_parser(Path::new("a.xlsx")).is_ok());
        assert!(factory.get_parser(Path::new("a.ndjson")).is_ok());
        assert!(factory.get_parser(Path::new("a.parquet")).is_err());
    }

    #[test]
    fn test_infer_column_types() {
        let mut table = Table::with_column_names(&["a", "b"]);
        table.push_row(vec![CellValue::Int(1), CellValue::Null]);
        table.push_row(vec![CellValue::Float(1.5), CellValue::from("x")]);
        infer_column_types(&mut table);
        assert_eq!(table.columns[0].inferred_type, CellType::Float);
        assert_eq!(table.columns[1].inferred_type, CellType::String);
    }
}
