//! CSV export of the augmented final table

use std::io::Write;

use anyhow::{Context, Result};

use crate::compare::ComparisonResult;

/// Write the final table (first dataset's columns plus key and comment) as CSV
pub fn write_final_table<W: Write>(result: &ComparisonResult, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let table = &result.final_table;

    csv_writer
        .write_record(table.columns.iter().map(|c| c.name.as_str()))
        .context("Failed to write CSV header")?;

    for row in &table.rows {
        let fields: Vec<_> = (0..table.column_count())
            .map(|i| row.get(i).map(|v| v.display()).unwrap_or_default())
            .collect();
        csv_writer
            .write_record(fields.iter().map(|f| f.as_bytes()))
            .with_context(|| format!("Failed to write row from line {}", row.source_line))?;
    }

    csv_writer.flush()?;
    Ok(())
}
