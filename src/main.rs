//! datacompare - Key-based comparison of tabular data

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use datacompare::compare::DataComparer;
use datacompare::config::{CompareOptions, CompareProfile, ConditionalIgnore, Config, OutputFormat};
use datacompare::output::{render_to_file, render_to_stdout, write_final_table, OutputFactory};
use datacompare::parser::ParserFactory;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    Terminal,
    Xml,
    Html,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(f: CliOutputFormat) -> Self {
        match f {
            CliOutputFormat::Terminal => OutputFormat::Terminal,
            CliOutputFormat::Xml => OutputFormat::Xml,
            CliOutputFormat::Html => OutputFormat::Html,
        }
    }
}

/// Key-based row and cell comparison for tabular data (CSV, Excel, JSON)
#[derive(Parser, Debug)]
#[command(name = "datacompare")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// First dataset
    table1: PathBuf,

    /// Second dataset
    table2: PathBuf,

    /// Display name of the first dataset
    #[arg(long, default_value = "Table1")]
    label1: String,

    /// Display name of the second dataset
    #[arg(long, default_value = "Table2")]
    label2: String,

    /// Key column(s) for row matching (comma-separated); defaults to the first column
    #[arg(short, long, value_delimiter = ',')]
    key: Vec<String>,

    /// Column(s) to ignore in comparison (comma-separated)
    #[arg(long, value_delimiter = ',')]
    ignore_column: Vec<String>,

    /// Compare columns without a typed rule case-insensitively
    #[arg(long)]
    ignore_case: bool,

    /// JSON file with typed column rules and ignore settings
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Skip a column on rows where COLUMN holds VALUE (COLUMN=VALUE)
    #[arg(long, value_name = "COLUMN=VALUE", requires = "ignore_target")]
    ignore_when: Option<String>,

    /// Column skipped when --ignore-when fires
    #[arg(long, requires = "ignore_when")]
    ignore_target: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: CliOutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// HTML template file (the built-in template is used otherwise)
    #[arg(long)]
    template: Option<PathBuf>,

    /// Root element name of the XML report
    #[arg(long)]
    xml_root: Option<String>,

    /// Record element name of the XML report
    #[arg(long)]
    record_name: Option<String>,

    /// Only write changed columns (XML) or changed rows (HTML)
    #[arg(long)]
    only_changed: bool,

    /// Include exact matches in the XML report
    #[arg(long)]
    include_unchanged: bool,

    /// Leave the summary block out of the XML report
    #[arg(long)]
    no_summary: bool,

    /// Write the augmented first table as CSV
    #[arg(long, value_name = "PATH")]
    final_table: Option<PathBuf>,

    /// For Excel files: which sheet to compare
    #[arg(long)]
    sheet: Option<String>,

    /// Only show statistics, not detailed changes
    #[arg(long)]
    stats_only: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(has_changes) => {
            if has_changes {
                ExitCode::from(1) // Differences found
            } else {
                ExitCode::SUCCESS // No differences
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn build_config(cli: Cli) -> Result<Config> {
    let mut compare = CompareOptions::new()
        .with_labels(cli.label1, cli.label2)
        .with_ignore_columns(cli.ignore_column)
        .with_case_sensitive(!cli.ignore_case);

    if let Some(path) = &cli.profile {
        compare = compare.apply_profile(CompareProfile::load(path)?);
    }

    if let (Some(when), Some(target)) = (cli.ignore_when, cli.ignore_target) {
        let Some((column, value)) = when.split_once('=') else {
            bail!("--ignore-when expects COLUMN=VALUE, got: {}", when);
        };
        compare = compare.with_conditional_ignore(ConditionalIgnore::new(
            column.trim(),
            value.trim(),
            target,
        ));
    }

    let mut config = Config::new(cli.table1, cli.table2)
        .with_key_columns(cli.key)
        .with_output_format(cli.format.into());
    if let Some(sheet) = cli.sheet {
        config = config.with_sheet_name(sheet);
    }
    config.compare = compare;
    config.output_file = cli.output;
    config.final_table_file = cli.final_table;
    config.template_file = cli.template;
    config.stats_only = cli.stats_only;

    if let Some(root) = cli.xml_root {
        config.xml.root_name = root;
    }
    if let Some(record) = cli.record_name {
        config.xml.record_name = record;
    }
    config.xml.only_changed_columns = cli.only_changed;
    config.xml.include_no_changes = cli.include_unchanged;
    config.xml.include_summary = !cli.no_summary;
    config.html.only_changed_rows = cli.only_changed;

    Ok(config)
}

fn run(cli: Cli) -> Result<bool> {
    let mut config = build_config(cli)?;

    // Resolve the formatter first so a missing template fails before any work
    let formatter = OutputFactory::create(&config)?;

    let factory = ParserFactory::new();
    let table1 = factory
        .parse(&config.table1_file, &config)
        .with_context(|| format!("Failed to parse first file: {}", config.table1_file.display()))?;
    let mut table2 = factory
        .parse(&config.table2_file, &config)
        .with_context(|| {
            format!("Failed to parse second file: {}", config.table2_file.display())
        })?;

    if !config.key_columns.is_empty() {
        let keys1 = table1.resolve_columns(&config.key_columns)?;
        let keys2 = table2
            .resolve_columns(&config.key_columns)
            .with_context(|| format!("Key column missing from {}", config.table2_file.display()))?;
        // Key positions are shared, so the second table must follow the first's layout
        if keys1 != keys2 {
            debug!(keys1 = ?keys1, keys2 = ?keys2, "aligning second table columns");
            table2 = table2.aligned_to(&table1);
        }
        debug!(keys = ?keys1, "resolved key columns");
        config.compare.key_columns = keys1;
    }

    let comparer = DataComparer::new(config.compare.clone());
    let result = comparer.run_comparison(&table1, &table2)?;

    if let Some(path) = &config.final_table_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create final table: {}", path.display()))?;
        write_final_table(&result, BufWriter::new(file))?;
    }

    match &config.output_file {
        Some(path) => render_to_file(formatter.as_ref(), &result, path)?,
        None => render_to_stdout(formatter.as_ref(), &result)?,
    }

    Ok(result.has_changes())
}
