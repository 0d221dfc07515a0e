//! XML track file output

use std::io::Write;

use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::compare::{ComparisonResult, RowComparison, RowOutcome};
use crate::model::Row;

use super::{format_elapsed, OutputFormatter};

/// Primary-key values written as attributes on each record
const MAX_KEY_ATTRIBUTES: usize = 4;

/// Options for the XML report
#[derive(Debug, Clone)]
pub struct XmlReportOptions {
    pub root_name: String,
    pub record_name: String,
    pub include_summary: bool,
    pub include_additions: bool,
    pub include_updates: bool,
    pub include_deletions: bool,
    pub include_no_changes: bool,
    /// Updates list only the columns that changed
    pub only_changed_columns: bool,
}

impl Default for XmlReportOptions {
    fn default() -> Self {
        Self {
            root_name: "Comparison".to_string(),
            record_name: "Record".to_string(),
            include_summary: true,
            include_additions: true,
            include_updates: true,
            include_deletions: true,
            include_no_changes: false,
            only_changed_columns: false,
        }
    }
}

/// XML report writer
pub struct XmlOutput {
    options: XmlReportOptions,
}

impl XmlOutput {
    pub fn new(options: XmlReportOptions) -> Self {
        Self { options }
    }

    /// Render the report into a byte buffer with CRLF line endings
    pub fn to_bytes(&self, result: &ComparisonResult) -> Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let root = element_name(&self.options.root_name);
        writer.write_event(Event::Start(BytesStart::new(root.as_str())))?;

        if self.options.include_summary {
            write_summary(&mut writer, result)?;
        }

        let categories = [
            (self.options.include_additions, "Additions", RowOutcome::OnlyTable1),
            (self.options.include_updates, "Updates", RowOutcome::Differences),
            (self.options.include_deletions, "Deletions", RowOutcome::OnlyTable2),
            (self.options.include_no_changes, "NoChanges", RowOutcome::ExactMatch),
        ];
        for (enabled, block, outcome) in categories {
            if enabled {
                self.write_category(&mut writer, result, block, outcome)?;
            }
        }

        writer.write_event(Event::End(BytesEnd::new(root.as_str())))?;

        let lf = writer.into_inner();
        Ok(to_crlf(&lf))
    }

    fn write_category(
        &self,
        writer: &mut Writer<Vec<u8>>,
        result: &ComparisonResult,
        block: &str,
        outcome: RowOutcome,
    ) -> Result<()> {
        writer.write_event(Event::Start(BytesStart::new(block)))?;
        for (comparison, row) in result.entries_with(outcome) {
            self.write_record(writer, result, comparison, row)?;
        }
        writer.write_event(Event::End(BytesEnd::new(block)))?;
        Ok(())
    }

    fn write_record(
        &self,
        writer: &mut Writer<Vec<u8>>,
        result: &ComparisonResult,
        comparison: &RowComparison,
        row: &Row,
    ) -> Result<()> {
        let record_name = element_name(&self.options.record_name);

        let mut start = BytesStart::new(record_name.as_str());
        for &index in result.key_columns.iter().take(MAX_KEY_ATTRIBUTES) {
            let (Some(column), Some(value)) = (result.columns.get(index), row.get(index)) else {
                continue;
            };
            let name = element_name(&column.name);
            let text = value.display();
            start.push_attribute((name.as_str(), &*text));
        }
        writer.write_event(Event::Start(start))?;

        let is_update = comparison.outcome() == RowOutcome::Differences;
        for (index, column) in result.columns.iter().enumerate() {
            let difference = comparison.difference(&column.name);
            if is_update && self.options.only_changed_columns && difference.is_none() {
                continue;
            }

            let name = element_name(&column.name);
            let mut field = BytesStart::new(name.as_str());
            if let Some(d) = difference {
                field.push_attribute(("OldValue", d.value2.as_str()));
            }
            let value = row.get(index).map(|v| v.display()).unwrap_or_default();
            writer.write_event(Event::Start(field))?;
            writer.write_event(Event::Text(BytesText::new(&value)))?;
            writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
        }

        writer.write_event(Event::End(BytesEnd::new(record_name.as_str())))?;
        Ok(())
    }
}

impl OutputFormatter for XmlOutput {
    fn render(&self, result: &ComparisonResult, writer: &mut dyn Write) -> Result<()> {
        writer.write_all(&self.to_bytes(result)?)?;
        Ok(())
    }
}

fn write_summary(writer: &mut Writer<Vec<u8>>, result: &ComparisonResult) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("Summary")))?;
    let fields = [
        ("Table1", result.label1.clone()),
        ("Table2", result.label2.clone()),
        ("Additions", result.add_count.to_string()),
        ("Updates", result.update_count.to_string()),
        ("Deletions", result.delete_count.to_string()),
        ("NoChanges", result.no_change_count.to_string()),
        ("ElapsedTime", format_elapsed(result.elapsed)),
    ];
    for (name, value) in fields {
        writer.write_event(Event::Start(BytesStart::new(name)))?;
        writer.write_event(Event::Text(BytesText::new(&value)))?;
        writer.write_event(Event::End(BytesEnd::new(name)))?;
    }
    writer.write_event(Event::End(BytesEnd::new("Summary")))?;
    Ok(())
}

/// Spaces are not allowed in element or attribute names
pub fn element_name(name: &str) -> String {
    name.trim().replace(' ', "_")
}

fn to_crlf(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + bytes.len() / 16);
    let mut previous = None;
    for &b in bytes {
        // Text that already carries CRLF is left alone
        if b == b'\n' && previous != Some(b'\r') {
            out.push(b'\r');
        }
        out.push(b);
        previous = Some(b);
    }
    out
}
