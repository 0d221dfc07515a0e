//! Column metadata and comparison policy types

use serde::{Deserialize, Serialize};

/// Inferred cell type for a column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    #[default]
    Null,
    Bool,
    Int,
    Float,
    String,
    Date,
    DateTime,
    Mixed,
}

impl CellType {
    /// Widen the type to accommodate another type
    pub fn widen(self, other: CellType) -> CellType {
        if self == other {
            return self;
        }

        match (self, other) {
            (CellType::Null, t) | (t, CellType::Null) => t,
            (CellType::Int, CellType::Float) | (CellType::Float, CellType::Int) => CellType::Float,
            (CellType::Date, CellType::DateTime) | (CellType::DateTime, CellType::Date) => {
                CellType::DateTime
            }
            _ => CellType::Mixed,
        }
    }
}

/// Column metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name (from header)
    pub name: String,
    /// Column index (0-based position)
    pub index: usize,
    /// Inferred type from data
    pub inferred_type: CellType,
}

impl Column {
    /// Create a new column with name and index
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
            inferred_type: CellType::Null,
        }
    }

    /// Create a column with a specified type
    pub fn with_type(name: impl Into<String>, index: usize, cell_type: CellType) -> Self {
        Self {
            name: name.into(),
            index,
            inferred_type: cell_type,
        }
    }
}

/// Logical type used to pick a typed comparison rule for a column.
///
/// Tags are resolved once when the policy is built. Anything that is not one
/// of the known tags becomes [`ColumnType::Raw`], which compares the rendered
/// values exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColumnType {
    Int,
    Float,
    Double,
    String,
    Date,
    DateTime,
    Raw,
}

impl ColumnType {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "INT" => ColumnType::Int,
            "FLOAT" => ColumnType::Float,
            "DOUBLE" => ColumnType::Double,
            "STRING" => ColumnType::String,
            "DATE" => ColumnType::Date,
            "DATETIME" => ColumnType::DateTime,
            _ => ColumnType::Raw,
        }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Double => "double",
            ColumnType::String => "string",
            ColumnType::Date => "date",
            ColumnType::DateTime => "datetime",
            ColumnType::Raw => "raw",
        }
    }
}

impl From<String> for ColumnType {
    fn from(tag: String) -> Self {
        ColumnType::from_tag(&tag)
    }
}

impl From<ColumnType> for String {
    fn from(t: ColumnType) -> Self {
        t.as_tag().to_string()
    }
}

impl std::str::FromStr for ColumnType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ColumnType::from_tag(s))
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Per-column comparison policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnComparisonDetail {
    /// Column the policy applies to
    pub name: String,
    /// Logical type deciding which rule is used
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Only consulted for [`ColumnType::String`]
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,
    /// Integer units, floating difference, days or seconds depending on the type
    #[serde(default)]
    pub tolerance: f64,
}

fn default_case_sensitive() -> bool {
    true
}

impl ColumnComparisonDetail {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            case_sensitive: true,
            tolerance: 0.0,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}
