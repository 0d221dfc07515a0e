//! Row matching algorithm

use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::debug;

use crate::error::Result;
use crate::model::{KeyIndexer, Row, Table};

/// Key to row lookup for one dataset, in first-seen order
pub type KeyMap<'a> = IndexMap<String, &'a Row>;

/// Rows of both datasets sorted into the three key classes
#[derive(Debug, Default)]
pub struct RowMatches<'a> {
    /// Keys only present in the first dataset, in its row order
    pub only_table1: Vec<(String, &'a Row)>,
    /// Keys only present in the second dataset, in its row order
    pub only_table2: Vec<(String, &'a Row)>,
    /// Keys present in both, in the first dataset's row order
    pub matched: Vec<(String, &'a Row, &'a Row)>,
}

impl RowMatches<'_> {
    /// Number of distinct keys across both datasets
    pub fn distinct_keys(&self) -> usize {
        self.only_table1.len() + self.only_table2.len() + self.matched.len()
    }
}

/// Row matcher using key lookup maps
pub struct RowMatcher<'k> {
    indexer: &'k KeyIndexer,
}

impl<'k> RowMatcher<'k> {
    pub fn new(indexer: &'k KeyIndexer) -> Self {
        Self { indexer }
    }

    /// Build the key map for one table. The first row for a key wins.
    pub fn key_map<'a>(&self, table: &'a Table) -> Result<KeyMap<'a>> {
        let mut map = KeyMap::with_capacity(table.row_count());
        for row in &table.rows {
            let key = self.indexer.key_for(row)?;
            match map.entry(key) {
                Entry::Occupied(entry) => {
                    debug!(
                        key = %entry.key(),
                        line = row.source_line,
                        "dropping duplicate key"
                    );
                }
                Entry::Vacant(entry) => {
                    entry.insert(row);
                }
            }
        }
        Ok(map)
    }

    /// Match rows between the two tables
    pub fn match_rows<'a>(&self, table1: &'a Table, table2: &'a Table) -> Result<RowMatches<'a>> {
        let map1 = self.key_map(table1)?;
        let map2 = self.key_map(table2)?;
        Ok(classify(map1, &map2))
    }
}

/// Split two key maps into only-first, only-second and matched groups
pub fn classify<'a>(map1: KeyMap<'a>, map2: &KeyMap<'a>) -> RowMatches<'a> {
    let mut matches = RowMatches::default();

    for (key, row) in map2.iter() {
        if !map1.contains_key(key) {
            matches.only_table2.push((key.clone(), *row));
        }
    }

    for (key, row1) in map1 {
        match map2.get(&key) {
            Some(row2) => matches.matched.push((key, row1, *row2)),
            None => matches.only_table1.push((key, row1)),
        }
    }

    matches
}
