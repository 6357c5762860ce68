//! Report rows laid out in the default column layout.

use std::collections::BTreeMap;

use crate::models::{BudgetLine, Cell, ReceiptRecord, Row};

pub fn batch_start(batch: &str, date: &str) -> Row {
    let number = format!("Batch: {batch}");
    let date = format!("Date Processed: {date}");
    Row::sparse(&[(2, number.as_str()), (11, date.as_str())])
}

pub fn receipt_start(number: &str, date: &str, payor: &str) -> Row {
    Row::sparse(&[(3, number), (7, date), (11, payor)])
}

pub fn continuation(check: &str, account: &str, event: &str, description: &str, amount: &str) -> Row {
    Row::sparse(&[(3, check), (11, account), (16, event), (20, description), (27, amount)])
}

pub fn batch_total(batch: &str, total: &str) -> Row {
    let label = format!("Batch {batch} Total:");
    Row::sparse(&[(18, label.as_str()), (24, total)])
}

pub fn report_total(total: &str) -> Row {
    Row::sparse(&[(17, "Grand Total of Report of Receipts:"), (23, total)])
}

/// Overlay the non-blank cells of `top` onto `base`.
pub fn merge(base: &Row, top: &Row) -> Row {
    let width = base.len().max(top.len());
    let cells = (1..=width)
        .map(|p| {
            if top.cell(p).is_blank() {
                base.cell(p).clone()
            } else {
                top.cell(p).clone()
            }
        })
        .collect::<Vec<Cell>>();
    Row::new(cells)
}

/// Two batches, one split receipt and one transfer, closed by a grand total.
pub fn sample_report() -> Vec<Row> {
    vec![
        batch_start("677", "11-16-2024"),
        receipt_start("8765", "11-16-2024", "Cash Participants"),
        continuation("cash", "General", "PancakeBreakfast", "bli=28 blah blah", "35.00"),
        receipt_start("8766", "11-16-2024", "John Smith"),
        continuation("1251", "General", "", "", "20.00"),
        continuation("", "Charity", "", "bli=none fund=youth", "15.00"),
        batch_total("677", "70.00"),
        batch_start("678", "11-23-2024"),
        receipt_start("8767", "11-23-2024", "Internal Transfer In"),
        continuation("", "Savings", "", "", "1,000.00"),
        batch_total("678", "1,000.00"),
        report_total("1,070.00"),
    ]
}

/// Rows paired with their 1-indexed row numbers, as a source delivers them.
pub fn numbered(rows: Vec<Row>) -> Vec<(usize, Row)> {
    rows.into_iter().enumerate().map(|(i, row)| (i + 1, row)).collect()
}

/// The report as CSV text, one line per row.
pub fn report_csv(rows: &[Row]) -> String {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(vec![]);
    for row in rows {
        let width = row.len().max(1);
        let fields: Vec<String> = (1..=width).map(|p| row.cell(p).as_text().into_owned()).collect();
        wtr.write_record(&fields).unwrap();
    }
    String::from_utf8(wtr.into_inner().unwrap()).unwrap()
}

pub fn record(batch: &str, receipt: &str, amount: f64) -> ReceiptRecord {
    ReceiptRecord {
        batch_number: batch.to_string(),
        batch_date: "11-16-2024".to_string(),
        receipt_number: receipt.to_string(),
        receipt_date: "11-16-2024".to_string(),
        payor: "Cash Participants".to_string(),
        is_transfer: false,
        check_number: String::new(),
        account: "General".to_string(),
        event: String::new(),
        description: String::new(),
        budget_line: BudgetLine::Absent,
        amount,
        is_split: false,
        tags: BTreeMap::new(),
    }
}
