use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{FlatError, Result};
use crate::models::{BudgetLine, Cell, Row};

static BATCH_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Batch: (\d+)$").unwrap());
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z][A-Za-z ]*:\s*)?((?:0\d|1[0-2])-(?:[0-2]\d|3[01])-\d{4})$").unwrap()
});
static BATCH_TOTAL_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Batch (\d+) Total:$").unwrap());
const REPORT_TOTAL_LABEL: &str = "Grand Total of Report of Receipts:";
static BUDGET_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)bli=(\w+)").unwrap());
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)([A-Za-z_][A-Za-z0-9_]*)=(\S+)").unwrap());

// ---------------------------------------------------------------------------
// Field identifiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    BatchNumber,
    BatchDate,
    ReceiptNumber,
    ReceiptDate,
    Payor,
    CheckNumber,
    Account,
    Event,
    Description,
    Amount,
    BatchTotal,
    ReportTotal,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::BatchNumber,
        Field::BatchDate,
        Field::ReceiptNumber,
        Field::ReceiptDate,
        Field::Payor,
        Field::CheckNumber,
        Field::Account,
        Field::Event,
        Field::Description,
        Field::Amount,
        Field::BatchTotal,
        Field::ReportTotal,
    ];

    /// Name used in error messages and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BatchNumber => "BatchNum",
            Self::BatchDate => "BatchDate",
            Self::ReceiptNumber => "ReceiptNum",
            Self::ReceiptDate => "ReceiptDate",
            Self::Payor => "Payor",
            Self::CheckNumber => "CheckNum",
            Self::Account => "Account",
            Self::Event => "Event",
            Self::Description => "Description",
            Self::Amount => "Amount",
            Self::BatchTotal => "BatchTotal",
            Self::ReportTotal => "ReportTotal",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = FlatError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Field::ALL
            .iter()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| FlatError::UnknownField(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Column layout
// ---------------------------------------------------------------------------

/// 1-indexed column positions of the report. The receipt number column also
/// carries the check number on continuation rows, and the batch date column
/// carries the payor on receipt-start rows and the account on continuation
/// rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub batch_number: usize,
    pub receipt_number: usize,
    pub receipt_date: usize,
    pub batch_date: usize,
    pub event: usize,
    pub report_total_label: usize,
    pub batch_total_label: usize,
    pub description: usize,
    pub report_total: usize,
    pub batch_total: usize,
    pub amount: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            batch_number: 2,
            receipt_number: 3,
            receipt_date: 7,
            batch_date: 11,
            event: 16,
            report_total_label: 17,
            batch_total_label: 18,
            description: 20,
            report_total: 23,
            batch_total: 24,
            amount: 27,
        }
    }
}

impl ColumnLayout {
    pub fn validate(&self) -> Result<()> {
        let columns = [
            ("batch_number", self.batch_number),
            ("receipt_number", self.receipt_number),
            ("receipt_date", self.receipt_date),
            ("batch_date", self.batch_date),
            ("event", self.event),
            ("report_total_label", self.report_total_label),
            ("batch_total_label", self.batch_total_label),
            ("description", self.description),
            ("report_total", self.report_total),
            ("batch_total", self.batch_total),
            ("amount", self.amount),
        ];
        for (name, position) in columns {
            if position == 0 {
                return Err(FlatError::Settings(format!(
                    "column '{name}' must be a 1-indexed position, got 0"
                )));
            }
        }
        Ok(())
    }

    pub fn spec(&self, field: Field) -> FieldSpec {
        use ValueRule::*;
        let (value, rule) = match field {
            Field::BatchNumber => (self.batch_number, BatchNumber),
            Field::BatchDate => (self.batch_date, Date),
            Field::ReceiptNumber => (self.receipt_number, Integer),
            Field::ReceiptDate => (self.receipt_date, Date),
            Field::Payor | Field::Account => (self.batch_date, Text),
            Field::CheckNumber => (self.receipt_number, Text),
            Field::Event => (self.event, Text),
            Field::Description => (self.description, Text),
            Field::Amount => (self.amount, Amount),
            Field::BatchTotal => (self.batch_total, Amount),
            Field::ReportTotal => (self.report_total, Amount),
        };
        let label = match field {
            Field::BatchTotal => Some((self.batch_total_label, LabelRule::BatchTotal)),
            Field::ReportTotal => Some((self.report_total_label, LabelRule::ReportTotal)),
            _ => None,
        };
        FieldSpec { value, label, rule }
    }
}

/// Where a field lives and how its cell is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub value: usize,
    pub label: Option<(usize, LabelRule)>,
    pub rule: ValueRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRule {
    BatchNumber,
    Date,
    Integer,
    Text,
    Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRule {
    BatchTotal,
    ReportTotal,
}

impl LabelRule {
    fn accepts(&self, label: &str) -> bool {
        match self {
            Self::BatchTotal => BATCH_TOTAL_LABEL_RE.is_match(label),
            Self::ReportTotal => label.contains(REPORT_TOTAL_LABEL),
        }
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Amount(f64),
}

impl FieldValue {
    pub fn into_text(self) -> String {
        match self {
            FieldValue::Text(s) => s,
            FieldValue::Amount(a) => a.to_string(),
        }
    }

    pub fn as_amount(&self) -> Option<f64> {
        match self {
            FieldValue::Amount(a) => Some(*a),
            FieldValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Amount(a) => write!(f, "{a}"),
        }
    }
}

/// Parse an amount, tolerating thousands separators, a currency sign,
/// surrounding quotes and accounting-style parentheses for negatives.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.replace([',', '"', '$'], "");
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let value = match s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => -inner.trim().parse::<f64>().ok()?,
        None => s.parse::<f64>().ok()?,
    };
    value.is_finite().then_some(value)
}

/// The integer at the start of `text`; whatever follows the digits is
/// ignored, so `"101.0"` and `"101 A"` both read as 101.
fn leading_integer(text: &str) -> Option<i64> {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let digits = unsigned.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let end = text.len() - unsigned.len() + digits;
    text[..end].parse().ok()
}

fn parse_cell_amount(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Number(_) | Cell::Empty => None,
        Cell::Text(s) => parse_amount(s),
    }
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    layout: ColumnLayout,
}

impl FieldExtractor {
    pub fn new(layout: ColumnLayout) -> Self {
        Self { layout }
    }

    /// The validated value of `field` on `row`, or `None` when the cell is
    /// empty or fails the field's rule.
    pub fn extract(&self, row: &Row, field: Field) -> Option<FieldValue> {
        let spec = self.layout.spec(field);
        if let Some((position, rule)) = spec.label {
            let label = row.cell(position).as_text();
            if !rule.accepts(label.trim()) {
                return None;
            }
        }

        let cell = row.cell(spec.value);
        let text = cell.as_text();
        let text = text.trim();
        match spec.rule {
            ValueRule::BatchNumber => BATCH_NUMBER_RE
                .captures(text)
                .and_then(|c| c[1].parse::<u64>().ok())
                .map(|n| FieldValue::Text(n.to_string())),
            ValueRule::Date => DATE_RE
                .captures(text)
                .map(|c| FieldValue::Text(c[1].to_string())),
            ValueRule::Integer => leading_integer(text)
                .filter(|n| *n != 0)
                .map(|n| FieldValue::Text(n.to_string())),
            ValueRule::Text => {
                (!text.is_empty()).then(|| FieldValue::Text(text.to_string()))
            }
            ValueRule::Amount => parse_cell_amount(cell).map(FieldValue::Amount),
        }
    }

    pub fn extract_required(&self, row: &Row, field: Field, row_number: usize) -> Result<FieldValue> {
        self.extract(row, field)
            .ok_or(FlatError::MissingRequiredField {
                field: field.name(),
                row: row_number,
            })
    }

    pub fn is_present(&self, row: &Row, field: Field) -> bool {
        self.extract(row, field).is_some()
    }

    pub fn text(&self, row: &Row, field: Field) -> String {
        self.extract(row, field)
            .map(FieldValue::into_text)
            .unwrap_or_default()
    }

    pub fn required_text(&self, row: &Row, field: Field, row_number: usize) -> Result<String> {
        self.extract_required(row, field, row_number)
            .map(FieldValue::into_text)
    }

    pub fn required_amount(&self, row: &Row, field: Field, row_number: usize) -> Result<f64> {
        self.extract_required(row, field, row_number)?
            .as_amount()
            .ok_or(FlatError::MissingRequiredField {
                field: field.name(),
                row: row_number,
            })
    }

    pub fn budget_line(&self, row: &Row) -> BudgetLine {
        budget_line(&self.text(row, Field::Description))
    }

    pub fn tags(&self, row: &Row) -> BTreeMap<String, String> {
        description_tags(&self.text(row, Field::Description))
    }
}

/// Budget line carried in a description as `bli=<token>`.
pub fn budget_line(description: &str) -> BudgetLine {
    let Some(caps) = BUDGET_LINE_RE.captures(description) else {
        return BudgetLine::Absent;
    };
    let token = &caps[1];
    if token.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = token.parse::<i64>() {
            return BudgetLine::Number(n);
        }
    }
    BudgetLine::Named(token.to_string())
}

/// `key=value` tokens of a description, other than the budget line.
pub fn description_tags(description: &str) -> BTreeMap<String, String> {
    TAG_RE
        .captures_iter(description)
        .filter(|c| &c[1] != "bli")
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect()
}
