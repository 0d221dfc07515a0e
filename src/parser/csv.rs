//! CSV file parser

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

use crate::config::Config;
use crate::model::{CellValue, Column, Table};

use super::{infer_column_types, Parser};

/// Parser for CSV files
pub struct CsvParser;

impl CsvParser {
    /// Read CSV text with a header row from any reader
    pub fn read<R: Read>(reader: R, delimiter: u8) -> Result<Table> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .context("Failed to read CSV headers")?
            .clone();

        let columns: Vec<Column> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| Column::new(name.to_string(), i))
            .collect();

        let mut table = Table::new(columns);

        for (line_num, result) in csv_reader.records().enumerate() {
            let source_line = line_num + 2; // 1-indexed, after the header
            let record =
                result.with_context(|| format!("Failed to read CSV row {}", source_line))?;

            let mut cells: Vec<CellValue> = record.iter().map(parse_cell_value).collect();
            if cells.len() > table.column_count() {
                warn!(
                    line = source_line,
                    extra = cells.len() - table.column_count(),
                    "dropping cells beyond the header width"
                );
                cells.truncate(table.column_count());
            }
            cells.resize(table.column_count(), CellValue::Null);

            table.add_row(cells, source_line);
        }

        infer_column_types(&mut table);
        Ok(table)
    }
}

impl Parser for CsvParser {
    fn parse(&self, path: &Path, _config: &Config) -> Result<Table> {
        let file =
            File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
        let delimiter = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
            _ => b',',
        };
        Self::read(BufReader::new(file), delimiter)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "csv" | "tsv" | "txt")
    }
}

/// Parse a string value into a CellValue with type inference
fn parse_cell_value(s: &str) -> CellValue {
    let trimmed = s.trim();

    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        return CellValue::Null;
    }

    if trimmed.eq_ignore_ascii_case("true") {
        return CellValue::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return CellValue::Bool(false);
    }

    // Leading zeros are identifiers, not numbers
    let leading_zero = trimmed.len() > 1 && trimmed.starts_with('0') && !trimmed.starts_with("0.");
    if !leading_zero {
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Int(i);
        }
        // Only keep floats that render back to the same text
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() && f.to_string() == trimmed {
                return CellValue::Float(f);
            }
        }
    }

    if let Ok(date) = chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return CellValue::Date(date);
    }

    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return CellValue::DateTime(dt);
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return CellValue::DateTime(dt);
    }

    CellValue::String(Cow::Owned(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellType;

    #[test]
    fn test_parse_cell_value() {
        assert_eq!(parse_cell_value(""), CellValue::Null);
        assert_eq!(parse_cell_value("null"), CellValue::Null);
        assert_eq!(parse_cell_value("true"), CellValue::Bool(true));
        assert_eq!(parse_cell_value("42"), CellValue::Int(42));
        assert_eq!(parse_cell_value("3.25"), CellValue::Float(3.25));
        assert_eq!(parse_cell_value("007"), CellValue::from("007"));
        assert_eq!(parse_cell_value("0.5"), CellValue::Float(0.5));
        assert_eq!(parse_cell_value("yes"), CellValue::from("yes"));
        assert_eq!(parse_cell_value("NaN"), CellValue::from("NaN"));
        assert_eq!(parse_cell_value("1.50"), CellValue::from("1.50"));
        assert_eq!(parse_cell_value("1e3"), CellValue::from("1e3"));
        assert_eq!(parse_cell_value("-2.5"), CellValue::Float(-2.5));
        assert_eq!(
            parse_cell_value("hello"),
            CellValue::String(Cow::Owned("hello".to_string()))
        );
    }

    #[test]
    fn test_read_pads_and_truncates() {
        let data = "Id,Name,Joined\n1,Bob,2024-01-02\n2\n3,Ann,2024-02-01,extra\n";
        let table = CsvParser::read(data.as_bytes(), b',').unwrap();

        assert_eq!(table.column_count(), 3);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.rows[1].cells, vec![CellValue::Int(2), CellValue::Null, CellValue::Null]);
        assert_eq!(table.rows[2].cells.len(), 3);
        assert_eq!(table.rows[2].source_line, 4);
        assert_eq!(table.columns[2].inferred_type, CellType::Date);
    }

    #[test]
    fn test_ids_beyond_i64_stay_distinct() {
        let data = "Id,Name\n12345678901234567890,Bob\n12345678901234567891,Sue\n";
        let table = CsvParser::read(data.as_bytes(), b',').unwrap();

        assert_eq!(table.rows[0].cells[0], CellValue::from("12345678901234567890"));
        assert_eq!(table.rows[1].cells[0], CellValue::from("12345678901234567891"));

        let result = crate::compare::compare_tables(
            &table,
            &table.clone(),
            &crate::config::CompareOptions::default(),
        )
        .unwrap();
        assert_eq!(result.total(), 2);
        assert_eq!(result.no_change_count, 2);
    }

    #[test]
    fn test_header_only() {
        let table = CsvParser::read("Id,Name\n".as_bytes(), b',').unwrap();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 2);
    }
}
