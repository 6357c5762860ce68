use std::collections::BTreeSet;
use std::io::Write;

use clap::ValueEnum;

use crate::error::Result;
use crate::models::ReceiptRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

pub const FIXED_HEADERS: [&str; 13] = [
    "ProcessDate",
    "VRDate",
    "Batch",
    "VRNumber",
    "Transfer",
    "Amount",
    "PayorPayee",
    "Account",
    "Event",
    "Description",
    "BudgetLine",
    "Split",
    "CheckNumber",
];

/// Tag keys across all records, sorted; each becomes an extra column.
pub fn tag_columns(records: &[ReceiptRecord]) -> Vec<String> {
    records
        .iter()
        .flat_map(|r| r.tags.keys())
        .filter(|k| !FIXED_HEADERS.contains(&k.as_str()))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Two decimals when that is exact, otherwise every digit the value has.
fn amount_field(amount: f64) -> String {
    let cents = format!("{amount:.2}");
    if cents.parse::<f64>().ok() == Some(amount) {
        cents
    } else {
        amount.to_string()
    }
}

pub fn write_csv<W: Write>(records: &[ReceiptRecord], writer: W) -> Result<()> {
    let tags = tag_columns(records);
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = FIXED_HEADERS.to_vec();
    header.extend(tags.iter().map(String::as_str));
    wtr.write_record(&header)?;

    for r in records {
        let mut fields = vec![
            r.batch_date.clone(),
            r.receipt_date.clone(),
            r.batch_number.clone(),
            r.receipt_number.clone(),
            r.is_transfer.to_string(),
            amount_field(r.amount),
            r.payor.clone(),
            r.account.clone(),
            r.event.clone(),
            r.description.clone(),
            r.budget_line.to_string(),
            r.is_split.to_string(),
            r.check_number.clone(),
        ];
        fields.extend(tags.iter().map(|k| r.tags.get(k).cloned().unwrap_or_default()));
        wtr.write_record(&fields)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(records: &[ReceiptRecord], mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, records).map_err(std::io::Error::from)?;
    writeln!(writer)?;
    Ok(())
}

pub fn write_records<W: Write>(records: &[ReceiptRecord], format: OutputFormat, writer: W) -> Result<()> {
    match format {
        OutputFormat::Csv => write_csv(records, writer),
        OutputFormat::Json => write_json(records, writer),
    }
}
