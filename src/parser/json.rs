//! JSON array parser

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use indexmap::IndexSet;
use serde_json::Value;

use crate::config::Config;
use crate::model::{CellValue, Column, Table};

use super::{infer_column_types, Parser};

/// Parser for JSON array and newline-delimited JSON files
pub struct JsonParser;

impl JsonParser {
    /// Build a table from already-parsed records
    pub fn from_values(records: Vec<Value>) -> Result<Table> {
        // Columns are the union of object keys, in first-seen order
        let mut column_names: IndexSet<String> = IndexSet::new();
        for item in &records {
            match item {
                Value::Object(obj) => column_names.extend(obj.keys().cloned()),
                _ => bail!("JSON records must be objects, found: {}", item),
            }
        }

        let columns: Vec<Column> = column_names
            .iter()
            .enumerate()
            .map(|(i, name)| Column::new(name.clone(), i))
            .collect();

        let mut table = Table::new(columns);

        for (line_num, item) in records.iter().enumerate() {
            if let Value::Object(obj) = item {
                let cells = column_names
                    .iter()
                    .map(|key| json_value_to_cell(obj.get(key)))
                    .collect();
                table.add_row(cells, line_num + 1);
            }
        }

        infer_column_types(&mut table);
        Ok(table)
    }
}

impl Parser for JsonParser {
    fn parse(&self, path: &Path, _config: &Config) -> Result<Table> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open JSON file: {}", path.display()))?;
        let reader = BufReader::new(file);

        let is_lines = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e.to_lowercase().as_str(), "jsonl" | "ndjson"));

        let records = if is_lines {
            let mut records = Vec::new();
            for (i, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let value: Value = serde_json::from_str(&line)
                    .with_context(|| format!("Failed to parse JSON on line {}", i + 1))?;
                records.push(value);
            }
            records
        } else {
            let value: Value =
                serde_json::from_reader(reader).context("Failed to parse JSON file")?;
            match value {
                Value::Array(arr) => arr,
                Value::Object(_) => vec![value],
                _ => bail!("JSON must be an array or object"),
            }
        };

        Self::from_values(records)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "json" | "jsonl" | "ndjson")
    }
}

fn json_value_to_cell(value: Option<&Value>) -> CellValue {
    match value {
        None | Some(Value::Null) => CellValue::Null,
        Some(Value::Bool(b)) => CellValue::Bool(*b),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                CellValue::Int(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(Cow::Owned(n.to_string()))
            }
        }
        // Strings stay text; typed column rules parse dates on demand
        Some(Value::String(s)) => CellValue::String(Cow::Owned(s.clone())),
        Some(nested @ (Value::Array(_) | Value::Object(_))) => {
            CellValue::String(Cow::Owned(nested.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_union_of_keys() {
        let table = JsonParser::from_values(vec![
            json!({"id": 1, "name": "Bob"}),
            json!({"id": 2, "tags": ["a", "b"]}),
        ])
        .unwrap();

        let names: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "tags"]);
        assert_eq!(table.rows[1].cells[1], CellValue::Null);
        assert_eq!(table.rows[1].cells[2], CellValue::from(r#"["a","b"]"#));
    }

    #[test]
    fn test_columns_follow_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        std::fs::write(&path, r#"[{"zip": "0150", "name": "Bob", "age": 40}]"#).unwrap();

        let table = JsonParser.parse(&path, &Config::default()).unwrap();
        let names: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["zip", "name", "age"]);
    }

    #[test]
    fn test_empty_array_is_empty_table() {
        let table = JsonParser::from_values(Vec::new()).unwrap();
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_rejects_scalars() {
        assert!(JsonParser::from_values(vec![json!(1)]).is_err());
    }

    #[test]
    fn test_ndjson_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.ndjson");
        std::fs::write(&path, "{\"id\": 1}\n\n{\"id\": 2.5}\n").unwrap();

        let table = JsonParser.parse(&path, &Config::default()).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[1].cells[0], CellValue::Float(2.5));
    }
}
