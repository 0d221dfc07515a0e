//! Error types for the comparison engine

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while configuring or running a comparison
#[derive(Error, Debug)]
pub enum CompareError {
    #[error("key column {index} is out of range for a row with {width} cells")]
    KeyColumnOutOfRange { index: usize, width: usize },

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("cannot convert value '{value}' in column '{column}' to {target}")]
    Conversion {
        column: String,
        value: String,
        target: &'static str,
    },

    #[error("HTML template '{name}' not found (searched: {})", format_paths(.searched))]
    TemplateNotFound { name: String, searched: Vec<PathBuf> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CompareError>;

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
