//! Per-row conditional column suppression

use crate::config::ConditionalIgnore;
use crate::model::{Row, Table};

/// Evaluates a [`ConditionalIgnore`] rule against individual rows
#[derive(Debug, Clone, Default)]
pub struct ConditionalIgnoreEvaluator {
    rule: Option<ConditionalIgnore>,
}

impl ConditionalIgnoreEvaluator {
    pub fn new(rule: Option<ConditionalIgnore>) -> Self {
        // A rule without a trigger column can never fire
        let rule = rule.filter(|r| !r.trigger_column.is_empty());
        Self { rule }
    }

    /// Column to skip for `row`, if the rule fires for it
    pub fn ignored_column<'a>(&'a self, table: &Table, row: &Row) -> Option<&'a str> {
        let rule = self.rule.as_ref()?;
        let value = table.value(row, &rule.trigger_column)?;
        if value.display().to_lowercase() == rule.trigger_value.to_lowercase() {
            Some(rule.target_column.as_str())
        } else {
            None
        }
    }
}
