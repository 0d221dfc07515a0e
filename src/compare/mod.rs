//! Comparison engine for two keyed tables

pub mod cell;
mod ignore;
mod result;
mod row_match;

use std::time::Instant;

use chrono::Local;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, warn};

use crate::config::CompareOptions;
use crate::error::Result;
use crate::model::{CellValue, ColumnComparisonDetail, KeyIndexer, Row, Table};

pub use cell::CellComparator;
pub use ignore::ConditionalIgnoreEvaluator;
pub use result::{
    CellDifference, ComparisonResult, ResultAggregator, RowComparison, RowOutcome,
    COMMENT_COLUMN, PK_COLUMN,
};
pub use row_match::{classify, KeyMap, RowMatcher, RowMatches};

static NULL_CELL: CellValue = CellValue::Null;

/// Compares two tables under a fixed [`CompareOptions`] policy.
///
/// The comparer keeps no per-run state; every call to
/// [`DataComparer::run_comparison`] builds its lookups from scratch.
pub struct DataComparer {
    options: CompareOptions,
    indexer: KeyIndexer,
    comparator: CellComparator,
    details: FxHashMap<String, ColumnComparisonDetail>,
    ignored: FxHashSet<String>,
    conditional: ConditionalIgnoreEvaluator,
}

impl DataComparer {
    /// Create a new comparer with configuration
    pub fn new(options: CompareOptions) -> Self {
        let details = options
            .column_details
            .iter()
            .map(|d| (d.name.clone(), d.clone()))
            .collect();
        let ignored = options.ignore_columns.iter().cloned().collect();

        Self {
            indexer: KeyIndexer::new(options.key_columns.clone()),
            comparator: CellComparator::new(options.case_sensitive),
            conditional: ConditionalIgnoreEvaluator::new(options.conditional_ignore.clone()),
            details,
            ignored,
            options,
        }
    }

    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    /// Key builder used for both tables
    pub fn key_indexer(&self) -> &KeyIndexer {
        &self.indexer
    }

    /// Compare two tables
    pub fn run_comparison(&self, table1: &Table, table2: &Table) -> Result<ComparisonResult> {
        let started_at = Local::now();
        let clock = Instant::now();

        info!(
            table1 = %self.options.label1,
            table2 = %self.options.label2,
            rows1 = table1.row_count(),
            rows2 = table2.row_count(),
            "starting comparison"
        );

        let matches = RowMatcher::new(&self.indexer).match_rows(table1, table2)?;
        let compared = self.compared_columns(table1, table2);

        let mut aggregator =
            ResultAggregator::new(&self.options.label1, &self.options.label2, table1, table2);

        for (key, row) in matches.only_table1 {
            aggregator.push_only_table1(key, row);
        }
        for (key, row) in matches.only_table2 {
            aggregator.push_only_table2(key, row);
        }
        for (key, row1, row2) in matches.matched {
            let differences = self.compare_rows(table1, &compared, row1, row2)?;
            aggregator.push_matched(key, row1, row2, differences);
        }

        let elapsed = clock.elapsed();
        let result = aggregator.finish(
            self.indexer.column_indices().to_vec(),
            started_at,
            Local::now(),
            elapsed,
        );

        info!(
            added = result.add_count,
            updated = result.update_count,
            deleted = result.delete_count,
            unchanged = result.no_change_count,
            elapsed_ms = elapsed.as_millis() as u64,
            "comparison finished"
        );

        Ok(result)
    }

    /// Columns of the first table that take part in comparison, paired with
    /// their position in the second table
    fn compared_columns(&self, table1: &Table, table2: &Table) -> Vec<ComparedColumn> {
        let mut compared = Vec::with_capacity(table1.column_count());
        for (index, column) in table1.columns.iter().enumerate() {
            if self.ignored.contains(&column.name) {
                debug!(column = %column.name, "column always ignored");
                continue;
            }
            match table2.column_index(&column.name) {
                Some(index2) => compared.push(ComparedColumn {
                    index1: index,
                    index2,
                    name: column.name.clone(),
                }),
                None => warn!(column = %column.name, "column missing from second table, skipped"),
            }
        }
        compared
    }

    /// Compare the cells of one matched row pair
    fn compare_rows(
        &self,
        table1: &Table,
        compared: &[ComparedColumn],
        row1: &Row,
        row2: &Row,
    ) -> Result<Vec<CellDifference>> {
        let skipped = self.conditional.ignored_column(table1, row1);
        let mut differences = Vec::new();

        for column in compared {
            if skipped == Some(column.name.as_str()) {
                continue;
            }

            let a = row1.get(column.index1).unwrap_or(&NULL_CELL);
            let b = row2.get(column.index2).unwrap_or(&NULL_CELL);
            let detail = self.details.get(&column.name);

            if !self.comparator.equal(&column.name, a, b, detail)? {
                differences.push(CellDifference {
                    column_index: column.index1,
                    column_name: column.name.clone(),
                    value1: a.display().into_owned(),
                    value2: b.display().into_owned(),
                });
            }
        }

        Ok(differences)
    }
}

struct ComparedColumn {
    index1: usize,
    index2: usize,
    name: String,
}

/// Convenience function to run a comparison
pub fn compare_tables(
    table1: &Table,
    table2: &Table,
    options: &CompareOptions,
) -> Result<ComparisonResult> {
    DataComparer::new(options.clone()).run_comparison(table1, table2)
}
