//! Composite row keys

use super::table::Row;
use crate::error::{CompareError, Result};

/// Separator placed between key components
pub const KEY_SEPARATOR: &str = "|";

/// Builds the composite key identifying a row across both datasets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyIndexer {
    column_indices: Vec<usize>,
}

impl Default for KeyIndexer {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl KeyIndexer {
    /// Create a key indexer; an empty list means the first column
    pub fn new(column_indices: Vec<usize>) -> Self {
        let column_indices = if column_indices.is_empty() {
            vec![0]
        } else {
            column_indices
        };
        Self { column_indices }
    }

    /// Build the key for a row
    pub fn key_for(&self, row: &Row) -> Result<String> {
        let mut parts = Vec::with_capacity(self.column_indices.len());
        for &index in &self.column_indices {
            let cell = row.get(index).ok_or(CompareError::KeyColumnOutOfRange {
                index,
                width: row.cells.len(),
            })?;
            parts.push(cell.display());
        }
        Ok(parts.join(KEY_SEPARATOR))
    }

    /// Get the column indices
    pub fn column_indices(&self) -> &[usize] {
        &self.column_indices
    }
}
