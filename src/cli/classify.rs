use comfy_table::{Cell, Table};

use crate::classifier::{classify, RowKind};
use crate::cli::InputArgs;
use crate::fields::{Field, FieldExtractor};
use crate::models::Row;

const DETAIL_WIDTH: usize = 40;

fn truncate(s: &str) -> String {
    if s.chars().count() > DETAIL_WIDTH {
        let cut: String = s.chars().take(DETAIL_WIDTH - 1).collect();
        format!("{cut}…")
    } else {
        s.to_string()
    }
}

/// Short description of what the classifier saw on a row.
pub fn row_detail(ex: &FieldExtractor, kind: RowKind, row: &Row) -> String {
    let text = |f: Field| ex.text(row, f);
    let detail = match kind {
        RowKind::ReportTotal => format!("grand total {}", text(Field::ReportTotal)),
        RowKind::BatchTotal => format!("batch total {}", text(Field::BatchTotal)),
        RowKind::BatchStart => {
            format!("batch {} processed {}", text(Field::BatchNumber), text(Field::BatchDate))
        }
        RowKind::ReceiptStart => format!(
            "receipt {} {} {}",
            text(Field::ReceiptNumber),
            text(Field::ReceiptDate),
            text(Field::Payor)
        ),
        RowKind::ReceiptContinuation => {
            format!("{} {}", text(Field::Account), text(Field::Amount))
        }
        RowKind::Unclassified => (1..=row.len())
            .map(|p| row.cell(p).as_text().trim().to_string())
            .find(|s| !s.is_empty())
            .unwrap_or_default(),
    };
    truncate(detail.trim())
}

pub fn run(input: &InputArgs, all: bool) -> anyhow::Result<()> {
    let settings = input.settings()?;
    let ex = FieldExtractor::new(settings.columns);
    let rows = input
        .source_kind()?
        .read_rows(&input.file, input.sheet.as_deref())?;

    let mut table = Table::new();
    table.set_header(vec!["Row", "Kind", "Detail"]);
    for (n, row) in &rows {
        if !all && row.is_blank() {
            continue;
        }
        let kind = classify(&ex, row);
        table.add_row(vec![
            Cell::new(n),
            Cell::new(kind.label()),
            Cell::new(row_detail(&ex, kind, row)),
        ]);
    }
    println!("{table}");
    Ok(())
}
