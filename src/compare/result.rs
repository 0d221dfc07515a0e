//! Per-row outcomes and the aggregated comparison result

use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::model::{CellType, CellValue, Column, Row, Table};

/// Name of the key column appended to the final table
pub const PK_COLUMN: &str = "ComparisonPK";
/// Name of the comment column appended to the final table
pub const COMMENT_COLUMN: &str = "ComparisonComment";

/// A cell that differs between two matched rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellDifference {
    /// Column index in the first dataset
    pub column_index: usize,
    pub column_name: String,
    /// Rendered value from the first dataset
    pub value1: String,
    /// Rendered value from the second dataset
    pub value2: String,
}

/// Classification of one row key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowOutcome {
    OnlyTable1,
    OnlyTable2,
    ExactMatch,
    Differences,
}

/// Outcome for one row key
#[derive(Debug, Clone)]
pub struct RowComparison {
    pub in_table1: bool,
    pub in_table2: bool,
    pub key: String,
    pub row1: Option<Row>,
    pub row2: Option<Row>,
    pub differences: Vec<CellDifference>,
}

impl RowComparison {
    pub fn only_in_table1(key: String, row: &Row) -> Self {
        Self {
            in_table1: true,
            in_table2: false,
            key,
            row1: Some(row.clone()),
            row2: None,
            differences: Vec::new(),
        }
    }

    pub fn only_in_table2(key: String, row: &Row) -> Self {
        Self {
            in_table1: false,
            in_table2: true,
            key,
            row1: None,
            row2: Some(row.clone()),
            differences: Vec::new(),
        }
    }

    pub fn matched(key: String, row1: &Row, row2: &Row, differences: Vec<CellDifference>) -> Self {
        Self {
            in_table1: true,
            in_table2: true,
            key,
            row1: Some(row1.clone()),
            row2: Some(row2.clone()),
            differences,
        }
    }

    /// Present in both datasets
    pub fn is_found(&self) -> bool {
        self.in_table1 && self.in_table2
    }

    pub fn only_table1(&self) -> bool {
        self.in_table1 && !self.in_table2
    }

    pub fn only_table2(&self) -> bool {
        self.in_table2 && !self.in_table1
    }

    pub fn exact_match(&self) -> bool {
        self.is_found() && self.differences.is_empty()
    }

    pub fn outcome(&self) -> RowOutcome {
        if self.only_table1() {
            RowOutcome::OnlyTable1
        } else if self.only_table2() {
            RowOutcome::OnlyTable2
        } else if self.exact_match() {
            RowOutcome::ExactMatch
        } else {
            RowOutcome::Differences
        }
    }

    /// Human readable summary of the outcome
    pub fn row_comment(&self, label1: &str, label2: &str) -> String {
        match self.outcome() {
            RowOutcome::OnlyTable1 => format!("Only Found in: {}", label1),
            RowOutcome::OnlyTable2 => format!("Only Found in: {}", label2),
            RowOutcome::ExactMatch => "Exact Match".to_string(),
            RowOutcome::Differences => "Differences Found".to_string(),
        }
    }

    /// Difference recorded for a column, if any
    pub fn difference(&self, column_name: &str) -> Option<&CellDifference> {
        self.differences.iter().find(|d| d.column_name == column_name)
    }
}

/// Everything produced by one comparison run
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    pub label1: String,
    pub label2: String,
    /// Columns of the first dataset
    pub columns: Vec<Column>,
    /// Key column positions used for matching
    pub key_columns: Vec<usize>,
    pub rows: Vec<RowComparison>,
    /// Keys only in the first dataset
    pub add_count: usize,
    /// Matched keys with at least one difference
    pub update_count: usize,
    /// Keys only in the second dataset
    pub delete_count: usize,
    /// Matched keys without differences
    pub no_change_count: usize,
    /// First dataset's columns plus key and comment columns
    pub final_table: Table,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub elapsed: Duration,
}

impl ComparisonResult {
    /// Comment for a row of this result
    pub fn comment(&self, row: &RowComparison) -> String {
        row.row_comment(&self.label1, &self.label2)
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.add_count > 0 || self.update_count > 0 || self.delete_count > 0
    }

    /// Total number of distinct keys
    pub fn total(&self) -> usize {
        self.add_count + self.update_count + self.delete_count + self.no_change_count
    }

    /// Total cells reported as different
    pub fn cells_changed(&self) -> usize {
        self.rows.iter().map(|r| r.differences.len()).sum()
    }

    /// Rows with a given outcome
    pub fn rows_with(&self, outcome: RowOutcome) -> impl Iterator<Item = &RowComparison> {
        self.rows.iter().filter(move |r| r.outcome() == outcome)
    }

    /// Each row outcome paired with its final-table row, whose cells follow
    /// the first dataset's column order
    pub fn entries(&self) -> impl Iterator<Item = (&RowComparison, &Row)> {
        self.rows.iter().zip(&self.final_table.rows)
    }

    /// Entries with a given outcome
    pub fn entries_with(&self, outcome: RowOutcome) -> impl Iterator<Item = (&RowComparison, &Row)> {
        self.entries().filter(move |(r, _)| r.outcome() == outcome)
    }
}

/// Collects row outcomes and the final table while a comparison runs
pub struct ResultAggregator<'t> {
    label1: String,
    label2: String,
    table1: &'t Table,
    /// For each column of the first dataset, its position in the second
    table2_positions: Vec<Option<usize>>,
    rows: Vec<RowComparison>,
    final_table: Table,
}

impl<'t> ResultAggregator<'t> {
    pub fn new(label1: &str, label2: &str, table1: &'t Table, table2: &Table) -> Self {
        let mut columns = table1.columns.clone();
        let width = columns.len();
        columns.push(Column::with_type(PK_COLUMN, width, CellType::String));
        columns.push(Column::with_type(COMMENT_COLUMN, width + 1, CellType::String));

        let table2_positions = table1
            .columns
            .iter()
            .map(|c| table2.column_index(&c.name))
            .collect();

        Self {
            label1: label1.to_string(),
            label2: label2.to_string(),
            table1,
            table2_positions,
            rows: Vec::new(),
            final_table: Table::new(columns),
        }
    }

    pub fn push_only_table1(&mut self, key: String, row: &Row) {
        let cells = self.table1_cells(row);
        self.push(RowComparison::only_in_table1(key, row), cells, row.source_line);
    }

    pub fn push_only_table2(&mut self, key: String, row: &Row) {
        let cells = self
            .table2_positions
            .iter()
            .map(|pos| pos.and_then(|i| row.get(i)).cloned().unwrap_or(CellValue::Null))
            .collect();
        self.push(RowComparison::only_in_table2(key, row), cells, row.source_line);
    }

    pub fn push_matched(
        &mut self,
        key: String,
        row1: &Row,
        row2: &Row,
        differences: Vec<CellDifference>,
    ) {
        let cells = self.table1_cells(row1);
        self.push(
            RowComparison::matched(key, row1, row2, differences),
            cells,
            row1.source_line,
        );
    }

    fn table1_cells(&self, row: &Row) -> Vec<CellValue> {
        let mut cells = row.cells.clone();
        cells.resize(self.table1.column_count(), CellValue::Null);
        cells
    }

    fn push(&mut self, comparison: RowComparison, mut cells: Vec<CellValue>, source_line: usize) {
        cells.push(CellValue::from(comparison.key.clone()));
        cells.push(CellValue::from(
            comparison.row_comment(&self.label1, &self.label2),
        ));
        self.final_table.add_row(cells, source_line);
        self.rows.push(comparison);
    }

    /// Derive the counters and seal the result
    pub fn finish(
        self,
        key_columns: Vec<usize>,
        started_at: DateTime<Local>,
        finished_at: DateTime<Local>,
        elapsed: Duration,
    ) -> ComparisonResult {
        let count = |outcome: RowOutcome| self.rows.iter().filter(|r| r.outcome() == outcome).count();
        let add_count = count(RowOutcome::OnlyTable1);
        let delete_count = count(RowOutcome::OnlyTable2);
        let update_count = count(RowOutcome::Differences);
        let no_change_count = count(RowOutcome::ExactMatch);

        ComparisonResult {
            label1: self.label1,
            label2: self.label2,
            columns: self.table1.columns.clone(),
            key_columns,
            rows: self.rows,
            add_count,
            update_count,
            delete_count,
            no_change_count,
            final_table: self.final_table,
            started_at,
            finished_at,
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcomes_and_comments() {
        let row = Row::new(vec![CellValue::Int(1)], 1);
        let only1 = RowComparison::only_in_table1("1".into(), &row);
        let only2 = RowComparison::only_in_table2("1".into(), &row);
        let exact = RowComparison::matched("1".into(), &row, &row, Vec::new());
        let diff = RowComparison::matched(
            "1".into(),
            &row,
            &row,
            vec![CellDifference {
                column_index: 0,
                column_name: "Id".into(),
                value1: "1".into(),
                value2: "2".into(),
            }],
        );

        assert_eq!(only1.row_comment("Prod", "Test"), "Only Found in: Prod");
        assert_eq!(only2.row_comment("Prod", "Test"), "Only Found in: Test");
        assert_eq!(exact.row_comment("Prod", "Test"), "Exact Match");
        assert_eq!(diff.row_comment("Prod", "Test"), "Differences Found");

        assert!(exact.exact_match() && exact.is_found());
        assert!(!diff.exact_match() && diff.is_found());
        assert!(only1.only_table1() && !only1.is_found());
        assert!(only2.only_table2() && only2.row1.is_none());
        assert!(diff.difference("Id").is_some());
    }

    #[test]
    fn test_table2_rows_follow_table1_schema() {
        let t1 = Table::with_column_names(&["Id", "Name", "Extra"]);
        let t2 = Table::with_column_names(&["Name", "Id"]);
        let mut aggregator = ResultAggregator::new("A", "B", &t1, &t2);
        aggregator.push_only_table2("7".into(), &Row::new(vec!["Ann".into(), CellValue::Int(7)], 1));

        let now = Local::now();
        let result = aggregator.finish(vec![0], now, now, Duration::ZERO);
        let names: Vec<_> = result.final_table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Id", "Name", "Extra", PK_COLUMN, COMMENT_COLUMN]);

        let cells = &result.final_table.rows[0].cells;
        assert_eq!(cells[0], CellValue::Int(7));
        assert_eq!(cells[1], CellValue::from("Ann"));
        assert_eq!(cells[2], CellValue::Null);
        assert_eq!(cells[3], CellValue::from("7"));
        assert_eq!(cells[4], CellValue::from("Only Found in: B"));
        assert_eq!(result.delete_count, 1);
        assert_eq!(result.total(), 1);
    }
}
