use std::fmt;

use crate::fields::{Field, FieldExtractor};
use crate::models::Row;

/// The role a physical row plays in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowKind {
    ReportTotal,
    BatchTotal,
    BatchStart,
    ReceiptStart,
    ReceiptContinuation,
    Unclassified,
}

impl RowKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ReportTotal => "report total",
            Self::BatchTotal => "batch total",
            Self::BatchStart => "batch start",
            Self::ReceiptStart => "receipt start",
            Self::ReceiptContinuation => "receipt continuation",
            Self::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn is_report_total_row(ex: &FieldExtractor, row: &Row) -> bool {
    ex.is_present(row, Field::ReportTotal)
}

pub fn is_batch_total_row(ex: &FieldExtractor, row: &Row) -> bool {
    ex.is_present(row, Field::BatchTotal)
}

pub fn is_batch_start_row(ex: &FieldExtractor, row: &Row) -> bool {
    ex.is_present(row, Field::BatchNumber)
}

/// Continuation rows carry the check number in the receipt number column, so
/// a receipt start is only recognized when the row has no amount.
pub fn is_receipt_start_row(ex: &FieldExtractor, row: &Row) -> bool {
    ex.is_present(row, Field::ReceiptNumber) && !ex.is_present(row, Field::Amount)
}

pub fn is_receipt_continuation_row(ex: &FieldExtractor, row: &Row) -> bool {
    ex.is_present(row, Field::Amount)
}

/// First matching predicate wins, in the order the kinds are declared.
pub fn classify(ex: &FieldExtractor, row: &Row) -> RowKind {
    if is_report_total_row(ex, row) {
        RowKind::ReportTotal
    } else if is_batch_total_row(ex, row) {
        RowKind::BatchTotal
    } else if is_batch_start_row(ex, row) {
        RowKind::BatchStart
    } else if is_receipt_start_row(ex, row) {
        RowKind::ReceiptStart
    } else if is_receipt_continuation_row(ex, row) {
        RowKind::ReceiptContinuation
    } else {
        RowKind::Unclassified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn kind(row: &Row) -> RowKind {
        classify(&FieldExtractor::default(), row)
    }

    #[test]
    fn test_classifies_each_role() {
        assert_eq!(kind(&fixtures::batch_start("677", "11-16-2024")), RowKind::BatchStart);
        assert_eq!(
            kind(&fixtures::receipt_start("8765", "11-16-2024", "Cash Participants")),
            RowKind::ReceiptStart
        );
        assert_eq!(
            kind(&fixtures::continuation("", "General", "", "", "35.00")),
            RowKind::ReceiptContinuation
        );
        assert_eq!(kind(&fixtures::batch_total("677", "35.00")), RowKind::BatchTotal);
        assert_eq!(kind(&fixtures::report_total("35.00")), RowKind::ReportTotal);
    }

    #[test]
    fn test_check_number_does_not_make_receipt_start() {
        let row = fixtures::continuation("1251", "General", "", "", "35.00");
        assert_eq!(kind(&row), RowKind::ReceiptContinuation);
    }

    #[test]
    fn test_report_total_wins_over_batch_total() {
        let mut cells = fixtures::report_total("100.00");
        cells = fixtures::merge(&cells, &fixtures::batch_total("1", "100.00"));
        assert_eq!(kind(&cells), RowKind::ReportTotal);
    }

    #[test]
    fn test_unlabeled_total_is_unclassified() {
        let row = Row::sparse(&[(18, "Subtotal"), (24, "35.00")]);
        assert_eq!(kind(&row), RowKind::Unclassified);
    }

    #[test]
    fn test_blank_and_header_rows_are_unclassified() {
        assert_eq!(kind(&Row::default()), RowKind::Unclassified);
        let header = Row::sparse(&[(2, "Receipt Detail By Date Report"), (11, "Payor")]);
        assert_eq!(kind(&header), RowKind::Unclassified);
    }
}
