//! Table, Row, and Cell data structures

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::schema::Column;
use crate::error::{CompareError, Result};

/// Text layouts accepted when a cell has to be read as a timestamp
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d-%b-%Y"];

/// A cell value with type information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Cow<'static, str>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => true,
            (CellValue::Bool(a), CellValue::Bool(b)) => a == b,
            (CellValue::Int(a), CellValue::Int(b)) => a == b,
            (CellValue::Float(a), CellValue::Float(b)) => {
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (CellValue::String(a), CellValue::String(b)) => a == b,
            (CellValue::Date(a), CellValue::Date(b)) => a == b,
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a == b,
            (CellValue::Int(a), CellValue::Float(b)) => (*a as f64) == *b,
            (CellValue::Float(a), CellValue::Int(b)) => *a == (*b as f64),
            _ => false,
        }
    }
}

impl CellValue {
    /// Render the value as text. Null renders as the empty string.
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            CellValue::Null => Cow::Borrowed(""),
            CellValue::Bool(b) => Cow::Owned(b.to_string()),
            CellValue::Int(i) => Cow::Owned(i.to_string()),
            CellValue::Float(f) => Cow::Owned(f.to_string()),
            CellValue::String(s) => Cow::Borrowed(s.as_ref()),
            CellValue::Date(d) => Cow::Owned(d.to_string()),
            CellValue::DateTime(dt) => Cow::Owned(dt.to_string()),
        }
    }

    /// True when the rendered value is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.display().trim().is_empty()
    }

    /// Read the value as an integer; null counts as zero
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CellValue::Null => Some(0),
            CellValue::Bool(b) => Some(i64::from(*b)),
            CellValue::Int(i) => Some(*i),
            CellValue::Float(f) if f.is_finite() => Some(f.round() as i64),
            CellValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Some(0)
                } else {
                    trimmed.parse().ok()
                }
            }
            _ => None,
        }
    }

    /// Read the value as a real number; null counts as zero
    pub fn as_real(&self) -> Option<f64> {
        match self {
            CellValue::Null => Some(0.0),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            CellValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Some(0.0)
                } else {
                    trimmed.parse().ok()
                }
            }
            _ => None,
        }
    }

    /// Read the value as a timestamp, parsing text where needed
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Date(d) => d.and_hms_opt(0, 0, 0),
            CellValue::DateTime(dt) => Some(*dt),
            CellValue::String(s) => parse_timestamp(s),
            _ => None,
        }
    }
}

/// Parse a timestamp from one of the accepted text layouts
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(Cow::Owned(s.to_string()))
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(Cow::Owned(s))
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

impl<T> From<Option<T>> for CellValue
where
    T: Into<CellValue>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => CellValue::Null,
        }
    }
}

/// A row in the table
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Cell values in column order
    pub cells: Vec<CellValue>,
    /// Original line/row number in source file (1-indexed)
    pub source_line: usize,
}

impl Row {
    pub fn new(cells: Vec<CellValue>, source_line: usize) -> Self {
        Self { cells, source_line }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }
}

/// A table containing columns and rows
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Column definitions
    pub columns: Vec<Column>,
    /// All rows in the table
    pub rows: Vec<Row>,
}

impl Table {
    /// Create a new empty table with column definitions
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Create an empty table from column names
    pub fn with_column_names<S: AsRef<str>>(names: &[S]) -> Self {
        Self::new(
            names
                .iter()
                .enumerate()
                .map(|(i, name)| Column::new(name.as_ref(), i))
                .collect(),
        )
    }

    /// Add a row to the table
    pub fn add_row(&mut self, cells: Vec<CellValue>, source_line: usize) {
        self.rows.push(Row::new(cells, source_line));
    }

    /// Append a row numbered after the existing rows
    pub fn push_row<I, V>(&mut self, cells: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let line = self.rows.len() + 1;
        self.add_row(cells.into_iter().map(Into::into).collect(), line);
    }

    /// Get column index by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Resolve column names to indices, failing on the first unknown name
    pub fn resolve_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>> {
        names
            .iter()
            .map(|name| {
                self.column_index(name.as_ref())
                    .ok_or_else(|| CompareError::UnknownColumn(name.as_ref().to_string()))
            })
            .collect()
    }

    /// Copy of this table with its columns reordered to follow `reference`.
    ///
    /// Columns shared with `reference` come first, in its order; the rest keep
    /// their relative order after them. Rows keep their source lines.
    pub fn aligned_to(&self, reference: &Table) -> Table {
        let mut order: Vec<usize> = reference
            .columns
            .iter()
            .filter_map(|c| self.column_index(&c.name))
            .collect();
        let rest: Vec<usize> = (0..self.column_count())
            .filter(|i| !order.contains(i))
            .collect();
        order.extend(rest);

        let columns = order
            .iter()
            .enumerate()
            .map(|(position, &i)| {
                let column = &self.columns[i];
                Column::with_type(column.name.clone(), position, column.inferred_type)
            })
            .collect();

        let mut aligned = Table::new(columns);
        for row in &self.rows {
            let cells = order
                .iter()
                .map(|&i| row.get(i).cloned().unwrap_or(CellValue::Null))
                .collect();
            aligned.add_row(cells, row.source_line);
        }
        aligned
    }

    /// Look up a cell of `row` by column name
    pub fn value<'a>(&self, row: &'a Row, column: &str) -> Option<&'a CellValue> {
        self.column_index(column).and_then(|i| row.get(i))
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}
