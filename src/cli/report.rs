use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::classifier::RowKind;
use crate::fmt::{money, plural};
use crate::reports::RunSummary;

pub fn format_batches(summary: &RunSummary) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Batch", "Processed", "Records", "Declared", "Computed"]);
    for b in &summary.batches {
        let declared = match b.declared {
            Some(total) => Cell::new(money(total)),
            None => Cell::new("not closed".yellow()),
        };
        table.add_row(vec![
            Cell::new(&b.batch_number),
            Cell::new(&b.batch_date),
            Cell::new(b.records),
            declared,
            Cell::new(money(b.computed)),
        ]);
    }
    let report_declared = match &summary.report_check {
        Some(check) => Cell::new(money(check.declared)),
        None => Cell::new("missing".yellow()),
    };
    table.add_row(vec![
        Cell::new("Report".bold()),
        Cell::new(""),
        Cell::new(summary.records),
        report_declared,
        Cell::new(money(summary.total_amount)),
    ]);
    format!("Batches\n{table}")
}

pub fn format_summary(summary: &RunSummary, input: &Path, checksum: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("Input:     {}\n", input.display()));
    out.push_str(&format!("SHA-256:   {checksum}\n"));
    out.push_str(&format!(
        "Rows:      {} read, {} ignored\n",
        summary.rows_read,
        summary.rows_of(RowKind::Unclassified)
    ));
    out.push_str(&format!(
        "Records:   {} from {} ({} split, {} transfer)\n",
        plural(summary.records, "record", "records"),
        plural(summary.receipts, "receipt", "receipts"),
        summary.split_receipts,
        summary.transfers,
    ));
    out.push('\n');
    out.push_str(&format_batches(summary));

    let open: Vec<&str> = summary
        .unreconciled_batches()
        .map(|b| b.batch_number.as_str())
        .collect();
    if !open.is_empty() {
        out.push_str(&format!(
            "\n{} no batch total seen for batch {}",
            "warning:".yellow().bold(),
            open.join(", ")
        ));
    }
    if summary.report_check.is_none() {
        out.push_str(&format!(
            "\n{} no report grand total seen; totals are only partly verified",
            "warning:".yellow().bold()
        ));
    } else if open.is_empty() {
        out.push_str(&format!("\n{}", "All totals reconciled.".green()));
    }
    out
}
