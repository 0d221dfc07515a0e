//! Report rendering for comparison results

mod final_table;
mod html;
mod terminal;
mod xml;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::compare::ComparisonResult;
use crate::config::{Config, OutputFormat};
use crate::error::CompareError;

pub use final_table::write_final_table;
pub use html::{
    FileTemplate, HtmlOutput, HtmlReportOptions, TemplateSource, DEFAULT_TEMPLATE,
    DEFAULT_TEMPLATE_NAME,
};
pub use terminal::TerminalOutput;
pub use xml::{element_name, XmlOutput, XmlReportOptions};

/// Trait for output formatters
pub trait OutputFormatter {
    /// Render a comparison result to a writer
    fn render(&self, result: &ComparisonResult, writer: &mut dyn Write) -> Result<()>;
}

/// Factory for creating output formatters
pub struct OutputFactory;

impl OutputFactory {
    /// Create an output formatter for the configured format.
    ///
    /// For HTML the template is loaded here, so a missing template file fails
    /// before anything is written. Without a configured file, a
    /// `ComparisonTemplate.html` next to the executable or in the working
    /// directory is preferred over the built-in template.
    pub fn create(config: &Config) -> Result<Box<dyn OutputFormatter>> {
        Ok(match config.output_format {
            OutputFormat::Terminal => {
                Box::new(TerminalOutput::new().with_stats_only(config.stats_only))
            }
            OutputFormat::Xml => Box::new(XmlOutput::new(config.xml.clone())),
            OutputFormat::Html => {
                let output = match &config.template_file {
                    Some(path) => HtmlOutput::from_source(
                        &FileTemplate::from_path(path),
                        config.html.clone(),
                    )?,
                    None => match FileTemplate::new(DEFAULT_TEMPLATE_NAME).load() {
                        Ok(template) => HtmlOutput::new(template, config.html.clone()),
                        Err(CompareError::TemplateNotFound { .. }) => {
                            HtmlOutput::new(DEFAULT_TEMPLATE, config.html.clone())
                        }
                        Err(e) => return Err(e.into()),
                    },
                };
                Box::new(output)
            }
        })
    }
}

/// Render to a file, creating or truncating it
pub fn render_to_file(
    formatter: &dyn OutputFormatter,
    result: &ComparisonResult,
    path: &Path,
) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    formatter.render(result, &mut writer)?;
    writer.flush()?;
    info!(path = %path.display(), "report written");
    Ok(())
}

/// Render to stdout
pub fn render_to_stdout(formatter: &dyn OutputFormatter, result: &ComparisonResult) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    formatter.render(result, &mut stdout)
}

/// Elapsed time as `HH:MM:SS.mmm`
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        total / 3600,
        (total / 60) % 60,
        total % 60,
        elapsed.subsec_millis()
    )
}

/// Escape text for HTML element content and attribute values
pub(crate) fn html_escape(s: impl AsRef<str>) -> String {
    s.as_ref()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
