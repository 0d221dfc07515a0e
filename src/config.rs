//! Configuration handling for datacompare

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::ColumnComparisonDetail;
use crate::output::{HtmlReportOptions, XmlReportOptions};

/// Output format for comparison results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Xml,
    Html,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" => Ok(OutputFormat::Terminal),
            "xml" => Ok(OutputFormat::Xml),
            "html" => Ok(OutputFormat::Html),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Skip one column for rows whose trigger column holds a given value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalIgnore {
    /// Column whose value is inspected
    pub trigger_column: String,
    /// Value that fires the rule (matched case-insensitively)
    pub trigger_value: String,
    /// Column excluded from comparison when the rule fires
    pub target_column: String,
}

impl ConditionalIgnore {
    pub fn new(
        trigger_column: impl Into<String>,
        trigger_value: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            trigger_column: trigger_column.into(),
            trigger_value: trigger_value.into(),
            target_column: target_column.into(),
        }
    }
}

/// Comparison policy applied by [`crate::compare::DataComparer`]
#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Display name of the first dataset
    pub label1: String,
    /// Display name of the second dataset
    pub label2: String,
    /// Key column positions; empty means the first column
    pub key_columns: Vec<usize>,
    /// Columns never compared
    pub ignore_columns: Vec<String>,
    /// Case sensitivity for columns without a detail
    pub case_sensitive: bool,
    /// Typed per-column rules
    pub column_details: Vec<ColumnComparisonDetail>,
    /// Optional per-row ignore rule
    pub conditional_ignore: Option<ConditionalIgnore>,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            label1: "Table1".to_string(),
            label2: "Table2".to_string(),
            key_columns: Vec::new(),
            ignore_columns: Vec::new(),
            case_sensitive: true,
            column_details: Vec::new(),
            conditional_ignore: None,
        }
    }
}

impl CompareOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dataset labels used in comments and reports
    pub fn with_labels(mut self, label1: impl Into<String>, label2: impl Into<String>) -> Self {
        self.label1 = label1.into();
        self.label2 = label2.into();
        self
    }

    /// Set key columns for row matching
    pub fn with_key_columns(mut self, indices: Vec<usize>) -> Self {
        self.key_columns = indices;
        self
    }

    /// Set columns to ignore
    pub fn with_ignore_columns(mut self, columns: Vec<String>) -> Self {
        self.ignore_columns = columns;
        self
    }

    /// Set the global case sensitivity
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Add a typed rule for one column
    pub fn with_column_detail(mut self, detail: ColumnComparisonDetail) -> Self {
        self.column_details.push(detail);
        self
    }

    /// Set the conditional ignore rule
    pub fn with_conditional_ignore(mut self, rule: ConditionalIgnore) -> Self {
        self.conditional_ignore = Some(rule);
        self
    }

    /// Merge a profile loaded from disk into these options
    pub fn apply_profile(mut self, profile: CompareProfile) -> Self {
        self.column_details.extend(profile.columns);
        self.ignore_columns.extend(profile.ignore_columns);
        if profile.conditional_ignore.is_some() {
            self.conditional_ignore = profile.conditional_ignore;
        }
        self
    }
}

/// Column rules and ignore settings stored as JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareProfile {
    pub columns: Vec<ColumnComparisonDetail>,
    pub ignore_columns: Vec<String>,
    pub conditional_ignore: Option<ConditionalIgnore>,
}

impl CompareProfile {
    /// Load a profile from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open profile: {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse profile: {}", path.display()))
    }
}

/// Configuration for one command-line run
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Path to the first dataset
    pub table1_file: PathBuf,
    /// Path to the second dataset
    pub table2_file: PathBuf,
    /// Key columns by name; resolved against the first dataset
    pub key_columns: Vec<String>,
    /// Output format
    pub output_format: OutputFormat,
    /// Where to write the report; stdout when absent
    pub output_file: Option<PathBuf>,
    /// Where to write the augmented table as CSV
    pub final_table_file: Option<PathBuf>,
    /// HTML template file; the built-in template is used when absent
    pub template_file: Option<PathBuf>,
    /// For Excel files: which sheet to compare
    pub sheet_name: Option<String>,
    /// Only show statistics, not detailed changes
    pub stats_only: bool,
    pub compare: CompareOptions,
    pub xml: XmlReportOptions,
    pub html: HtmlReportOptions,
}

impl Config {
    /// Create a new Config with file paths
    pub fn new(table1_file: PathBuf, table2_file: PathBuf) -> Self {
        Self {
            table1_file,
            table2_file,
            ..Default::default()
        }
    }

    /// Set key columns for row matching
    pub fn with_key_columns(mut self, keys: Vec<String>) -> Self {
        self.key_columns = keys;
        self
    }

    /// Set output format
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Set Excel sheet name
    pub fn with_sheet_name(mut self, name: String) -> Self {
        self.sheet_name = Some(name);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ColumnType;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("XML".parse::<OutputFormat>(), Ok(OutputFormat::Xml));
        assert!("pdf".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_profile_merges_into_options() {
        let profile: CompareProfile = serde_json::from_str(
            r#"{
                "columns": [{"name": "Qty", "type": "int", "tolerance": 2}],
                "ignore_columns": ["UpdatedAt"],
                "conditional_ignore": {
                    "trigger_column": "Status",
                    "trigger_value": "Closed",
                    "target_column": "Amount"
                }
            }"#,
        )
        .unwrap();

        let options = CompareOptions::new()
            .with_ignore_columns(vec!["Note".to_string()])
            .apply_profile(profile);

        assert_eq!(options.ignore_columns, vec!["Note", "UpdatedAt"]);
        assert_eq!(options.column_details[0].column_type, ColumnType::Int);
        assert_eq!(
            options.conditional_ignore,
            Some(ConditionalIgnore::new("Status", "Closed", "Amount"))
        );
    }

    #[test]
    fn test_empty_profile() {
        let profile: CompareProfile = serde_json::from_str("{}").unwrap();
        assert_eq!(profile, CompareProfile::default());
    }
}
