use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::cli::report::format_summary;
use crate::cli::{parse_all, run_parser, InputArgs};
use crate::export::{write_records, OutputFormat};
use crate::importer::compute_checksum;
use crate::models::ReceiptRecord;
use crate::parser::ReportParser;
use crate::reports::{summarize, RunSummary};

fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("report");
    input.with_file_name(format!("{stem}-receipts.{}", format.extension()))
}

fn summary_for(
    input: &InputArgs,
    (parser, records): (ReportParser, Vec<ReceiptRecord>),
) -> anyhow::Result<(RunSummary, Vec<ReceiptRecord>, String)> {
    let checksum = compute_checksum(&input.file)
        .with_context(|| format!("reading {}", input.file.display()))?;
    Ok((summarize(&parser, &records), records, checksum))
}

pub fn run(input: &InputArgs, output: Option<&str>, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    // Parse and reconcile everything before any byte of output is written.
    let settings = input.settings()?;
    let (summary, records, checksum) = summary_for(input, run_parser(input, &settings)?)?;

    let to_stdout = output == Some("-");
    if to_stdout {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        write_records(&records, format, &mut handle)?;
        handle.flush()?;
    } else {
        let path = output
            .map(PathBuf::from)
            .unwrap_or_else(|| default_output_path(&input.file, format));
        let file = std::fs::File::create(&path)
            .with_context(|| format!("creating {}", path.display()))?;
        let mut writer = std::io::BufWriter::new(file);
        write_records(&records, format, &mut writer)
            .with_context(|| format!("writing {}", path.display()))?;
        writer.flush()?;
        info!(path = %path.display(), records = records.len(), "records written");
        if !quiet {
            println!("Wrote {} records to {}", records.len(), path.display());
        }
    }

    if !quiet {
        let text = format_summary(&summary, &input.file, &checksum);
        if to_stdout {
            eprintln!("{text}");
        } else {
            println!("\n{text}");
        }
    }
    Ok(())
}

pub fn check(input: &InputArgs, quiet: bool) -> anyhow::Result<()> {
    let settings = input.settings()?;
    let (summary, _, checksum) = summary_for(input, parse_all(input, &settings)?)?;
    if !quiet {
        println!("{}", format_summary(&summary, &input.file, &checksum));
    }
    Ok(())
}
