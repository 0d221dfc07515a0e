//! Colored terminal output

use std::io::{IsTerminal, Write};

use anyhow::Result;
use tabled::settings::Style;
use tabled::{Table as TextTable, Tabled};
use termcolor::{Ansi, Color, ColorChoice, ColorSpec, NoColor, WriteColor};

use crate::compare::{ComparisonResult, RowOutcome};

use super::format_elapsed;
use super::OutputFormatter;

/// One line of the terminal listing
#[derive(Tabled)]
struct ListingLine {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Column")]
    column: String,
    #[tabled(rename = "Value 1")]
    value1: String,
    #[tabled(rename = "Value 2")]
    value2: String,
}

/// Terminal summary with colors
pub struct TerminalOutput {
    color_choice: ColorChoice,
    stats_only: bool,
}

impl TerminalOutput {
    pub fn new() -> Self {
        Self {
            color_choice: ColorChoice::Auto,
            stats_only: false,
        }
    }

    pub fn with_color_choice(mut self, color_choice: ColorChoice) -> Self {
        self.color_choice = color_choice;
        self
    }

    /// Print only the counters
    pub fn with_stats_only(mut self, stats_only: bool) -> Self {
        self.stats_only = stats_only;
        self
    }

    fn use_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always | ColorChoice::AlwaysAnsi => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => std::io::stdout().is_terminal(),
        }
    }

    fn write_summary<W: WriteColor + ?Sized>(
        &self,
        result: &ComparisonResult,
        out: &mut W,
    ) -> Result<()> {
        writeln!(out, "Comparison: {} vs {}", result.label1, result.label2)?;
        writeln!(out)?;

        let counters = [
            ("Only in ", &result.label1, result.add_count, Color::Green),
            ("Only in ", &result.label2, result.delete_count, Color::Red),
        ];
        for (prefix, label, count, color) in counters {
            write!(out, "{}{}: ", prefix, label)?;
            write_count(out, count, color)?;
        }
        write!(out, "Differences: ")?;
        write_count(out, result.update_count, Color::Yellow)?;
        writeln!(out, "Exact matches: {}", result.no_change_count)?;
        writeln!(out, "Cells changed: {}", result.cells_changed())?;
        writeln!(out, "Elapsed: {}", format_elapsed(result.elapsed))?;
        Ok(())
    }

    fn write_listing<W: WriteColor + ?Sized>(
        &self,
        result: &ComparisonResult,
        out: &mut W,
    ) -> Result<()> {
        let mut lines = Vec::new();
        for row in &result.rows {
            match row.outcome() {
                RowOutcome::ExactMatch => {}
                RowOutcome::Differences => {
                    for d in &row.differences {
                        lines.push(ListingLine {
                            key: row.key.clone(),
                            outcome: result.comment(row),
                            column: d.column_name.clone(),
                            value1: d.value1.clone(),
                            value2: d.value2.clone(),
                        });
                    }
                }
                RowOutcome::OnlyTable1 | RowOutcome::OnlyTable2 => lines.push(ListingLine {
                    key: row.key.clone(),
                    outcome: result.comment(row),
                    column: String::new(),
                    value1: String::new(),
                    value2: String::new(),
                }),
            }
        }

        if lines.is_empty() {
            writeln!(out)?;
            writeln!(out, "No differences found.")?;
            return Ok(());
        }

        let mut table = TextTable::new(lines);
        table.with(Style::rounded());
        writeln!(out)?;
        writeln!(out, "{}", table)?;
        Ok(())
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for TerminalOutput {
    fn render(&self, result: &ComparisonResult, writer: &mut dyn Write) -> Result<()> {
        let mut out: Box<dyn WriteColor + '_> = if self.use_color() {
            Box::new(Ansi::new(writer))
        } else {
            Box::new(NoColor::new(writer))
        };

        self.write_summary(result, out.as_mut())?;
        if !self.stats_only {
            self.write_listing(result, out.as_mut())?;
        }
        out.flush()?;
        Ok(())
    }
}

fn write_count<W: WriteColor + ?Sized>(out: &mut W, count: usize, color: Color) -> Result<()> {
    if count > 0 {
        out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    }
    write!(out, "{}", count)?;
    out.reset()?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare_tables;
    use crate::config::CompareOptions;
    use crate::model::{CellValue, Table};

    fn render(output: TerminalOutput, t2_name: &str) -> String {
        let mut t1 = Table::with_column_names(&["Id", "Name"]);
        t1.push_row(vec![CellValue::Int(1), "Bob".into()]);
        t1.push_row(vec![CellValue::Int(2), "Sue".into()]);
        let mut t2 = Table::with_column_names(&["Id", "Name"]);
        t2.push_row(vec![CellValue::Int(1), t2_name.into()]);

        let result = compare_tables(
            &t1,
            &t2,
            &CompareOptions::default().with_labels("Prod", "Test"),
        )
        .unwrap();
        let mut buf = Vec::new();
        output
            .with_color_choice(ColorChoice::Never)
            .render(&result, &mut buf)
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_summary_and_listing() {
        let text = render(TerminalOutput::new(), "Robert");
        assert!(text.starts_with("Comparison: Prod vs Test\n"));
        assert!(text.contains("Only in Prod: 1\n"));
        assert!(text.contains("Only in Test: 0\n"));
        assert!(text.contains("Differences: 1\n"));
        assert!(text.contains("Robert"));
        assert!(text.contains("Only Found in: Prod"));
        assert!(!text.contains("\u{1b}["));
    }

    #[test]
    fn test_stats_only() {
        let text = render(TerminalOutput::new().with_stats_only(true), "Robert");
        assert!(text.contains("Cells changed: 1"));
        assert!(!text.contains("Robert"));
    }
}
