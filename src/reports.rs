use std::collections::{BTreeMap, BTreeSet};

use crate::classifier::RowKind;
use crate::models::ReceiptRecord;
use crate::parser::ReportParser;
use crate::reconciler::{CheckScope, TotalCheck};

#[derive(Debug, Clone, PartialEq)]
pub struct BatchLine {
    pub batch_number: String,
    pub batch_date: String,
    pub records: usize,
    pub computed: f64,
    /// `None` when no batch total row closed this batch.
    pub declared: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub rows_read: usize,
    pub kind_counts: BTreeMap<RowKind, usize>,
    pub records: usize,
    pub receipts: usize,
    pub split_receipts: usize,
    pub transfers: usize,
    pub total_amount: f64,
    pub batches: Vec<BatchLine>,
    pub report_check: Option<TotalCheck>,
}

impl RunSummary {
    pub fn unreconciled_batches(&self) -> impl Iterator<Item = &BatchLine> {
        self.batches.iter().filter(|b| b.declared.is_none())
    }

    pub fn rows_of(&self, kind: RowKind) -> usize {
        self.kind_counts.get(&kind).copied().unwrap_or(0)
    }
}

pub fn summarize(parser: &ReportParser, records: &[ReceiptRecord]) -> RunSummary {
    let mut batches: Vec<BatchLine> = Vec::new();
    for r in records {
        match batches.iter_mut().find(|b| b.batch_number == r.batch_number) {
            Some(line) => {
                line.records += 1;
                line.computed += r.amount;
            }
            None => batches.push(BatchLine {
                batch_number: r.batch_number.clone(),
                batch_date: r.batch_date.clone(),
                records: 1,
                computed: r.amount,
                declared: None,
            }),
        }
    }

    let mut report_check = None;
    for check in parser.checks() {
        match &check.scope {
            CheckScope::Batch(number) => {
                if let Some(line) = batches.iter_mut().find(|b| &b.batch_number == number) {
                    line.declared = Some(check.declared);
                }
            }
            CheckScope::Report => report_check = Some(check.clone()),
        }
    }

    let receipts: BTreeSet<(&str, &str)> = records
        .iter()
        .map(|r| (r.batch_number.as_str(), r.receipt_number.as_str()))
        .collect();
    let split_receipts: BTreeSet<(&str, &str)> = records
        .iter()
        .filter(|r| r.is_split)
        .map(|r| (r.batch_number.as_str(), r.receipt_number.as_str()))
        .collect();

    RunSummary {
        rows_read: parser.rows_read(),
        kind_counts: parser.kind_counts().clone(),
        records: records.len(),
        receipts: receipts.len(),
        split_receipts: split_receipts.len(),
        transfers: records.iter().filter(|r| r.is_transfer).count(),
        total_amount: records.iter().map(|r| r.amount).sum(),
        batches,
        report_check,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;

    #[test]
    fn test_summary_of_complete_report() {
        let mut parser = ReportParser::default();
        let records = parser.parse_rows(numbered(sample_report())).unwrap();
        let s = summarize(&parser, &records);
        assert_eq!(s.rows_read, 12);
        assert_eq!(s.records, 4);
        assert_eq!(s.receipts, 3);
        assert_eq!(s.split_receipts, 1);
        assert_eq!(s.transfers, 1);
        assert_eq!(s.rows_of(RowKind::ReceiptContinuation), 4);
        assert_eq!(s.rows_of(RowKind::Unclassified), 0);
        assert_eq!(s.batches.len(), 2);
        assert_eq!(s.batches[0].records, 3);
        assert_eq!(s.batches[0].declared, Some(70.0));
        assert_eq!(s.batches[1].batch_date, "11-23-2024");
        assert!(s.report_check.is_some());
        assert_eq!(s.unreconciled_batches().count(), 0);
        assert!((s.total_amount - 1070.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_flags_unclosed_batch() {
        let rows = vec![
            batch_start("677", "11-16-2024"),
            receipt_start("8765", "11-16-2024", "Cash Participants"),
            continuation("", "General", "", "", "35.00"),
        ];
        let mut parser = ReportParser::default();
        let records = parser.parse_rows(numbered(rows)).unwrap();
        let s = summarize(&parser, &records);
        assert!(s.report_check.is_none());
        let open: Vec<_> = s.unreconciled_batches().collect();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].batch_number, "677");
    }
}
