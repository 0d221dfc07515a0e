//! HTML track file output driven by a placeholder template

use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use chrono::Local;
use tracing::debug;

use crate::compare::{ComparisonResult, RowComparison, RowOutcome};
use crate::error::CompareError;
use crate::model::Row;

use super::{html_escape, OutputFormatter};

/// File name looked up by [`FileTemplate::new`] callers that use the stock name
pub const DEFAULT_TEMPLATE_NAME: &str = "ComparisonTemplate.html";

/// Supplies the HTML template text
pub trait TemplateSource {
    /// Name used in error messages
    fn name(&self) -> String;

    /// Load the template text
    fn load(&self) -> Result<String, CompareError>;
}

impl TemplateSource for str {
    fn name(&self) -> String {
        "inline".to_string()
    }

    fn load(&self) -> Result<String, CompareError> {
        Ok(self.to_string())
    }
}

/// Template read from the first existing file among a list of candidates
#[derive(Debug, Clone)]
pub struct FileTemplate {
    name: String,
    candidates: Vec<PathBuf>,
}

impl FileTemplate {
    /// Look for `name` next to the executable, then in the working directory
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let candidates = search_dirs().into_iter().map(|d| d.join(&name)).collect();
        Self { name, candidates }
    }

    /// Use `path` as given; relative paths also fall back to the executable's
    /// directory
    pub fn from_path(path: &Path) -> Self {
        let mut candidates = vec![path.to_path_buf()];
        if path.is_relative() {
            candidates.extend(executable_dir().map(|d| d.join(path)));
        }
        Self {
            name: path.display().to_string(),
            candidates,
        }
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }
}

impl TemplateSource for FileTemplate {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn load(&self) -> Result<String, CompareError> {
        for candidate in &self.candidates {
            if candidate.is_file() {
                debug!(path = %candidate.display(), "loading HTML template");
                return Ok(std::fs::read_to_string(candidate)?);
            }
        }
        Err(CompareError::TemplateNotFound {
            name: self.name.clone(),
            searched: self.candidates.clone(),
        })
    }
}

fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

fn search_dirs() -> Vec<PathBuf> {
    executable_dir()
        .into_iter()
        .chain(std::env::current_dir().ok())
        .collect()
}

/// Options for the HTML report
#[derive(Debug, Clone)]
pub struct HtmlReportOptions {
    /// Leave exact matches out of the table
    pub only_changed_rows: bool,
    /// `chrono` format string for `{GENERATION_DATE}`
    pub date_format: String,
}

impl Default for HtmlReportOptions {
    fn default() -> Self {
        Self {
            only_changed_rows: false,
            date_format: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }
}

/// HTML report output
pub struct HtmlOutput {
    template: String,
    options: HtmlReportOptions,
}

impl HtmlOutput {
    /// Use an in-memory template
    pub fn new(template: impl Into<String>, options: HtmlReportOptions) -> Self {
        Self {
            template: template.into(),
            options,
        }
    }

    /// Load the template from a source; a missing template is an error
    pub fn from_source<S>(source: &S, options: HtmlReportOptions) -> Result<Self, CompareError>
    where
        S: TemplateSource + ?Sized,
    {
        Ok(Self::new(source.load()?, options))
    }

    /// Fill the template for a result. Fails on an invalid `date_format`.
    pub fn render_string(&self, result: &ComparisonResult) -> Result<String> {
        let mut generated = String::new();
        write!(generated, "{}", Local::now().format(&self.options.date_format))
            .map_err(|_| anyhow!("Invalid date format: {}", self.options.date_format))?;

        let entries: Vec<_> = result
            .entries()
            .filter(|(r, _)| !(self.options.only_changed_rows && r.exact_match()))
            .collect();

        let header: String = result
            .final_table
            .columns
            .iter()
            .map(|c| format!("<th>{}</th>", html_escape(&c.name)))
            .collect();

        let filters: String = (0..result.final_table.column_count())
            .map(|i| {
                format!(
                    "<th><input type=\"text\" class=\"column-filter\" data-column=\"{}\" placeholder=\"Filter...\"></th>",
                    i
                )
            })
            .collect();

        let rows: String = entries
            .iter()
            .map(|(comparison, row)| table_row(result, comparison, row))
            .collect::<Vec<_>>()
            .join("\n");

        let values = [
            ("{GENERATION_DATE}", generated),
            ("{LABEL1}", html_escape(&result.label1)),
            ("{LABEL2}", html_escape(&result.label2)),
            ("{INITIAL_ROW_COUNT}", entries.len().to_string()),
            ("{HEADER_COLUMNS}", header),
            ("{FILTER_ROW}", format!("<tr class=\"filter-row\">{}</tr>", filters)),
            ("{TABLE_ROWS}", rows),
        ];

        Ok(substitute(&self.template, &values))
    }
}

impl OutputFormatter for HtmlOutput {
    fn render(&self, result: &ComparisonResult, writer: &mut dyn Write) -> Result<()> {
        writer.write_all(self.render_string(result)?.as_bytes())?;
        Ok(())
    }
}

fn row_class(outcome: RowOutcome) -> &'static str {
    match outcome {
        RowOutcome::OnlyTable1 => "only-table1",
        RowOutcome::OnlyTable2 => "only-table2",
        RowOutcome::ExactMatch => "exact-match",
        RowOutcome::Differences => "differences",
    }
}

fn table_row(result: &ComparisonResult, comparison: &RowComparison, row: &Row) -> String {
    let mut html = format!("<tr class=\"{}\">", row_class(comparison.outcome()));
    for (index, column) in result.final_table.columns.iter().enumerate() {
        let value = row.get(index).map(|v| v.display()).unwrap_or_default();
        let difference = if index < result.columns.len() {
            comparison.difference(&column.name)
        } else {
            None
        };

        match difference {
            Some(d) => html.push_str(&format!(
                "<td class=\"diff\" title=\"{}\">{}</td>",
                html_escape(format!(
                    "Old ({}): {} | New ({}): {}",
                    result.label2, d.value2, result.label1, d.value1
                )),
                html_escape(&value)
            )),
            None => html.push_str(&format!("<td>{}</td>", html_escape(&value))),
        }
    }
    html.push_str("</tr>");
    html
}

/// Replace each placeholder in one pass so inserted text is never rescanned
fn substitute(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match values.iter().find(|(p, _)| tail.starts_with(p)) {
            Some((placeholder, value)) => {
                out.push_str(value);
                rest = &tail[placeholder.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Template used when no template file is configured
pub const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Comparison: {LABEL1} vs {LABEL2}</title>
  <style>
    body { font-family: 'Segoe UI', Arial, sans-serif; margin: 2rem; color: #222; }
    h1 { font-size: 1.5rem; margin-bottom: 0.25rem; }
    .meta { color: #666; margin-bottom: 1.5rem; }
    table { border-collapse: collapse; width: 100%; font-size: 0.875rem; }
    th, td { border: 1px solid #ccc; padding: 0.4rem 0.6rem; text-align: left; }
    th { background: #f0f0f0; }
    .filter-row input { width: 100%; box-sizing: border-box; }
    tr.only-table1 { background: #e6f4e0; }
    tr.only-table2 { background: #fbe3e6; }
    tr.differences { background: #fff6dd; }
    td.diff { background: #ffd77a; font-weight: 600; cursor: help; }
  </style>
</head>
<body>
  <h1>{LABEL1} vs {LABEL2}</h1>
  <p class="meta">Generated {GENERATION_DATE} &middot; <span id="row-count">{INITIAL_ROW_COUNT}</span> rows</p>
  <table id="comparison">
    <thead>
      <tr>{HEADER_COLUMNS}</tr>
      {FILTER_ROW}
    </thead>
    <tbody>
{TABLE_ROWS}
    </tbody>
  </table>
  <script>
    const filters = document.querySelectorAll('.column-filter');
    filters.forEach(f => f.addEventListener('input', () => {
      let shown = 0;
      document.querySelectorAll('#comparison tbody tr').forEach(tr => {
        const visible = Array.from(filters).every(input => {
          const cell = tr.children[input.dataset.column];
          return !input.value || (cell && cell.textContent.toLowerCase().includes(input.value.toLowerCase()));
        });
        tr.style.display = visible ? '' : 'none';
        if (visible) shown++;
      });
      document.getElementById('row-count').textContent = shown;
    }));
  </script>
</body>
</html>
"#;
