use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::classifier::{classify, RowKind};
use crate::error::{FlatError, Result};
use crate::fields::{Field, FieldExtractor};
use crate::models::{BudgetLine, ReceiptRecord, Row};
use crate::reconciler::{reconcile_batch, reconcile_report, TotalCheck};
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    SeekingBatch,
    AccumulatingHeader,
    AccumulatingBody,
    /// A report total has been reconciled; later rows are ignored.
    Finished,
}

/// The receipt currently being assembled. Header fields stay `None` until
/// the row that carries them has been seen.
#[derive(Debug, Clone, Default)]
struct WorkingRecord {
    batch_number: Option<String>,
    batch_date: Option<String>,
    receipt_number: Option<String>,
    receipt_date: Option<String>,
    payor: Option<String>,
    is_transfer: bool,
    check_number: String,
    account: String,
    event: String,
    description: String,
    budget_line: BudgetLine,
    tags: BTreeMap<String, String>,
    amount: f64,
    is_split: bool,
}

fn require(value: &Option<String>, field: Field, row: usize) -> Result<String> {
    value.clone().ok_or(FlatError::MissingRequiredField {
        field: field.name(),
        row,
    })
}

impl WorkingRecord {
    fn clear(&mut self) {
        *self = Self::default();
    }

    fn snapshot(&self, row: usize) -> Result<ReceiptRecord> {
        Ok(ReceiptRecord {
            batch_number: require(&self.batch_number, Field::BatchNumber, row)?,
            batch_date: require(&self.batch_date, Field::BatchDate, row)?,
            receipt_number: require(&self.receipt_number, Field::ReceiptNumber, row)?,
            receipt_date: require(&self.receipt_date, Field::ReceiptDate, row)?,
            payor: require(&self.payor, Field::Payor, row)?,
            is_transfer: self.is_transfer,
            check_number: self.check_number.clone(),
            account: self.account.clone(),
            event: self.event.clone(),
            description: self.description.clone(),
            budget_line: self.budget_line.clone(),
            amount: self.amount,
            is_split: self.is_split,
            tags: self.tags.clone(),
        })
    }
}

fn normalize_payor(payor: &str) -> String {
    payor
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Flattens a receipt report row by row.
///
/// Rows must be fed strictly in file order. Batch and report totals are
/// checked against the records emitted so far, so rows delivered out of
/// order silently corrupt reconciliation.
///
/// Any error is fatal for the run: the parser does not checkpoint its state
/// and must not be fed further rows after a failure.
#[derive(Debug, Clone)]
pub struct ReportParser {
    extractor: FieldExtractor,
    tolerance: f64,
    strict: bool,
    transfer_payor: String,
    working: WorkingRecord,
    state: ParserState,
    checks: Vec<TotalCheck>,
    kind_counts: BTreeMap<RowKind, usize>,
    rows_read: usize,
}

impl Default for ReportParser {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl ReportParser {
    pub fn new(settings: &Settings) -> Self {
        Self {
            extractor: FieldExtractor::new(settings.columns),
            tolerance: settings.tolerance,
            strict: settings.strict,
            transfer_payor: normalize_payor(&settings.transfer_payor),
            working: WorkingRecord::default(),
            state: ParserState::SeekingBatch,
            checks: Vec::new(),
            kind_counts: BTreeMap::new(),
            rows_read: 0,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == ParserState::Finished
    }

    /// Successful total checks, in the order their rows were seen.
    pub fn checks(&self) -> &[TotalCheck] {
        &self.checks
    }

    pub fn kind_counts(&self) -> &BTreeMap<RowKind, usize> {
        &self.kind_counts
    }

    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Parse an already-read report. Each row carries the row number its
    /// source assigned, which is what errors report.
    pub fn parse_rows<I>(&mut self, rows: I) -> Result<Vec<ReceiptRecord>>
    where
        I: IntoIterator<Item = (usize, Row)>,
    {
        let mut records = Vec::new();
        for (n, row) in rows {
            self.process_row(&row, n, &mut records)?;
            if self.is_finished() {
                break;
            }
        }
        Ok(records)
    }

    /// Consume one row, appending to `records` when it completes a receipt.
    /// `records` must hold exactly what earlier calls appended.
    pub fn process_row(
        &mut self,
        row: &Row,
        row_number: usize,
        records: &mut Vec<ReceiptRecord>,
    ) -> Result<RowKind> {
        self.rows_read += 1;
        let kind = classify(&self.extractor, row);
        trace!(row = row_number, kind = %kind, "classified row");

        if self.is_finished() {
            debug!(row = row_number, "ignoring row after report total");
            return Ok(kind);
        }
        *self.kind_counts.entry(kind).or_default() += 1;

        match kind {
            RowKind::ReportTotal => self.on_report_total(row, row_number, records)?,
            RowKind::BatchTotal => self.on_batch_total(row, row_number, records)?,
            RowKind::BatchStart => self.on_batch_start(row, row_number)?,
            RowKind::ReceiptStart => self.on_receipt_start(row, row_number)?,
            RowKind::ReceiptContinuation => self.on_continuation(row, row_number, records)?,
            RowKind::Unclassified => {
                if self.strict && !row.is_blank() {
                    return Err(FlatError::UnclassifiedRow { row: row_number });
                }
            }
        }
        Ok(kind)
    }

    fn on_report_total(&mut self, row: &Row, n: usize, records: &[ReceiptRecord]) -> Result<()> {
        let declared = self.extractor.required_amount(row, Field::ReportTotal, n)?;
        let check = reconcile_report(records, declared, self.tolerance)?;
        debug!(row = n, declared, records = check.record_count, "report total reconciled");
        self.checks.push(check);
        self.working.clear();
        self.state = ParserState::Finished;
        Ok(())
    }

    fn on_batch_total(&mut self, row: &Row, n: usize, records: &[ReceiptRecord]) -> Result<()> {
        self.working.clear();
        self.state = ParserState::SeekingBatch;

        let declared = self.extractor.required_amount(row, Field::BatchTotal, n)?;
        let batch = records
            .last()
            .map(|r| r.batch_number.clone())
            .ok_or(FlatError::BatchTotalWithoutReceipts { row: n })?;
        let check = reconcile_batch(records, &batch, declared, self.tolerance)?;
        debug!(row = n, batch = %batch, declared, records = check.record_count, "batch total reconciled");
        self.checks.push(check);
        Ok(())
    }

    fn on_batch_start(&mut self, row: &Row, n: usize) -> Result<()> {
        self.working.clear();
        let batch_number = self.extractor.required_text(row, Field::BatchNumber, n)?;
        let batch_date = self.extractor.required_text(row, Field::BatchDate, n)?;
        debug!(row = n, batch = %batch_number, date = %batch_date, "batch opened");
        self.working.batch_number = Some(batch_number);
        self.working.batch_date = Some(batch_date);
        self.state = ParserState::AccumulatingHeader;
        Ok(())
    }

    fn on_receipt_start(&mut self, row: &Row, n: usize) -> Result<()> {
        let receipt_number = self.extractor.required_text(row, Field::ReceiptNumber, n)?;
        let receipt_date = self.extractor.required_text(row, Field::ReceiptDate, n)?;
        let payor = self.extractor.required_text(row, Field::Payor, n)?;
        self.working.is_transfer = normalize_payor(&payor) == self.transfer_payor;
        self.working.receipt_number = Some(receipt_number);
        self.working.receipt_date = Some(receipt_date);
        self.working.payor = Some(payor);
        self.state = ParserState::AccumulatingBody;
        Ok(())
    }

    fn on_continuation(&mut self, row: &Row, n: usize, records: &mut Vec<ReceiptRecord>) -> Result<()> {
        let ex = &self.extractor;
        self.working.account = ex.required_text(row, Field::Account, n)?;
        self.working.event = ex.text(row, Field::Event);
        self.working.description = ex.text(row, Field::Description);
        self.working.budget_line = ex.budget_line(row);
        self.working.tags = ex.tags(row);
        self.working.amount = ex.required_amount(row, Field::Amount, n)?;

        // Parts of a split receipt are consecutive; the first part's check
        // number stands for all of them.
        let is_split = match (records.last(), &self.working.receipt_number) {
            (Some(last), Some(current)) => last.receipt_number == *current,
            _ => false,
        };
        if is_split {
            self.working.is_split = true;
        } else {
            self.working.check_number = ex.text(row, Field::CheckNumber);
            self.working.is_split = false;
        }

        let record = self.working.snapshot(n)?;
        if is_split {
            if let Some(last) = records.last_mut() {
                last.is_split = true;
            }
            trace!(row = n, receipt = %record.receipt_number, "split receipt part");
        }
        records.push(record);
        self.state = ParserState::AccumulatingBody;
        Ok(())
    }
}
