pub mod classify;
pub mod config;
pub mod convert;
pub mod field;
pub mod report;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use crate::export::OutputFormat;
use crate::importer::{get_by_key, get_for_file, SourceKind};
use crate::models::ReceiptRecord;
use crate::parser::ReportParser;
use crate::settings::{load_settings, load_settings_from, Settings};

#[derive(Parser)]
#[command(
    name = "receiptflat",
    version,
    about = "Flatten a batch receipt report into one reconciled record per receipt."
)]
pub struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// No log output and no summary
    #[arg(short, long, global = true)]
    pub quiet: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a report into flat receipt records, verifying every total.
    Convert {
        #[command(flatten)]
        input: InputArgs,
        /// Output file, or `-` for stdout (default: <input>-receipts.<ext> beside the input)
        #[arg(short, long)]
        output: Option<String>,
        /// Output format
        #[arg(long, value_enum, default_value = "csv")]
        format: OutputFormat,
    },
    /// Verify batch and report totals without writing any output.
    Check {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Show the role assigned to each row of a report.
    Classify {
        #[command(flatten)]
        input: InputArgs,
        /// Include blank rows
        #[arg(long)]
        all: bool,
    },
    /// Extract one field from one row.
    Field {
        #[command(flatten)]
        input: InputArgs,
        /// 1-indexed row number
        #[arg(long)]
        row: usize,
        /// Field name, e.g. BatchNum, ReceiptNum, Amount, BatchTotal
        #[arg(long)]
        field: String,
        /// Fail when the field is absent
        #[arg(long)]
        required: bool,
    },
    /// Show or create the settings file.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Report to read (CSV or spreadsheet workbook)
    pub file: PathBuf,
    /// Source format key: csv or xlsx (default: by file extension)
    #[arg(long)]
    pub source: Option<String>,
    /// Worksheet name for workbook input (default: first sheet)
    #[arg(long)]
    pub sheet: Option<String>,
    /// Fail on non-blank rows that match no row layout
    #[arg(long)]
    pub strict: bool,
    /// Settings file (default: ~/.config/receiptflat/settings.json)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective settings as JSON.
    Show {
        /// Settings file to read instead of the default
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Write default settings to the settings file.
    Init {
        /// Where to write (default: ~/.config/receiptflat/settings.json)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the default settings file path.
    Path,
}

pub(crate) fn resolve_settings(config: Option<&Path>) -> anyhow::Result<Settings> {
    let settings = match config {
        Some(path) => load_settings_from(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => load_settings().context("loading settings")?,
    };
    Ok(settings)
}

impl InputArgs {
    pub(crate) fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = resolve_settings(self.config.as_deref())?;
        settings.strict |= self.strict;
        Ok(settings)
    }

    pub(crate) fn source_kind(&self) -> anyhow::Result<SourceKind> {
        match &self.source {
            Some(key) => Ok(get_by_key(key)?),
            None => Ok(get_for_file(&self.file)),
        }
    }
}

/// Stream the input through a fresh parser, stopping after the report total.
pub(crate) fn run_parser(
    input: &InputArgs,
    settings: &Settings,
) -> anyhow::Result<(ReportParser, Vec<ReceiptRecord>)> {
    let source = input.source_kind()?;
    let mut parser = ReportParser::new(settings);
    let mut records = Vec::new();
    source
        .for_each_row(&input.file, input.sheet.as_deref(), |n, row| {
            parser.process_row(&row, n, &mut records)?;
            Ok(!parser.is_finished())
        })
        .with_context(|| format!("processing {}", input.file.display()))?;
    debug!(state = ?parser.state(), records = records.len(), "streamed parse complete");
    Ok((parser, records))
}

/// Read every row of the input first, then parse them in one call.
pub(crate) fn parse_all(
    input: &InputArgs,
    settings: &Settings,
) -> anyhow::Result<(ReportParser, Vec<ReceiptRecord>)> {
    let rows = input
        .source_kind()?
        .read_rows(&input.file, input.sheet.as_deref())
        .with_context(|| format!("reading {}", input.file.display()))?;
    let mut parser = ReportParser::new(settings);
    let records = parser
        .parse_rows(rows)
        .with_context(|| format!("processing {}", input.file.display()))?;
    debug!(state = ?parser.state(), records = records.len(), "parse complete");
    Ok((parser, records))
}
