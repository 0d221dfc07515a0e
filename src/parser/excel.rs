//! Excel file parser (xlsx, xls, ods)

use std::borrow::Cow;
use std::path::Path;

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};

use crate::config::Config;
use crate::model::{CellValue, Column, Table};

use super::{infer_column_types, Parser};

/// Parser for Excel files
pub struct ExcelParser;

impl Parser for ExcelParser {
    fn parse(&self, path: &Path, config: &Config) -> Result<Table> {
        let mut workbook = open_workbook_auto(path)
            .with_context(|| format!("Failed to open Excel file: {}", path.display()))?;

        let sheet_name = match config.sheet_name {
            Some(ref name) => name.clone(),
            None => match workbook.sheet_names().first() {
                Some(first) => first.clone(),
                None => bail!("No sheets found in workbook"),
            },
        };

        let range: Range<Data> = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("Failed to read sheet: {}", sheet_name))?;

        parse_range(&range)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "xlsx" | "xls" | "ods" | "xlsm")
    }
}

/// First row is the header; an empty sheet yields an empty table
fn parse_range(range: &Range<Data>) -> Result<Table> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Table::default());
    };

    let columns: Vec<Column> = header_row
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let name = cell_to_string(cell);
            Column::new(if name.is_empty() { format!("Column{}", i + 1) } else { name }, i)
        })
        .collect();

    let mut table = Table::new(columns);

    for (line_num, row) in rows.enumerate() {
        let mut cells: Vec<CellValue> = row.iter().map(convert_cell).collect();
        cells.resize(table.column_count(), CellValue::Null);
        table.add_row(cells, line_num + 2); // +2 for 1-indexing and header
    }

    infer_column_types(&mut table);
    Ok(table)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format!("{}", dt),
        Data::Error(e) => format!("#{:?}", e),
    }
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => {
            if s.trim().is_empty() {
                CellValue::Null
            } else {
                CellValue::String(Cow::Owned(s.clone()))
            }
        }
        Data::Float(f) => {
            // Whole floats are how Excel stores integers
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                CellValue::Int(*f as i64)
            } else {
                CellValue::Float(*f)
            }
        }
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => timestamp_cell(format!("{}", dt)),
        Data::DateTimeIso(s) => timestamp_cell(s.clone()),
        Data::DurationIso(s) => CellValue::String(Cow::Owned(s.clone())),
        Data::Error(e) => CellValue::String(Cow::Owned(format!("#{:?}", e))),
    }
}

fn timestamp_cell(text: String) -> CellValue {
    if let Ok(date) = chrono::NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
        return CellValue::Date(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(datetime) = chrono::NaiveDateTime::parse_from_str(&text, format) {
            return CellValue::DateTime(datetime);
        }
    }
    CellValue::String(Cow::Owned(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellType;

    #[test]
    fn test_parse_range() {
        let mut range: Range<Data> = Range::new((0, 0), (2, 2));
        range.set_value((0, 0), Data::String("Id".into()));
        range.set_value((0, 1), Data::String("Name".into()));
        range.set_value((1, 0), Data::Float(1.0));
        range.set_value((1, 1), Data::String("Bob".into()));
        range.set_value((1, 2), Data::Float(2.5));
        range.set_value((2, 0), Data::Float(2.0));
        range.set_value((2, 1), Data::String("  ".into()));

        let table = parse_range(&range).unwrap();
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.columns[2].name, "Column3");
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0].cells[0], CellValue::Int(1));
        assert_eq!(table.rows[1].cells[1], CellValue::Null);
        assert_eq!(table.rows[1].source_line, 3);
        assert_eq!(table.columns[0].inferred_type, CellType::Int);
    }

    #[test]
    fn test_empty_sheet() {
        let range: Range<Data> = Range::empty();
        let table = parse_range(&range).unwrap();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 0);
    }

    #[test]
    fn test_iso_timestamps() {
        assert!(matches!(
            convert_cell(&Data::DateTimeIso("2024-03-01".into())),
            CellValue::Date(_)
        ));
        assert!(matches!(
            convert_cell(&Data::DateTimeIso("2024-03-01T10:00:00".into())),
            CellValue::DateTime(_)
        ));
    }
}
