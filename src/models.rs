use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// One raw cell as delivered by a row source.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Text form of the cell, untrimmed. Whole numbers render without a
    /// fractional part so that `8765.0` from a workbook reads as `8765`.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Cell::Empty => Cow::Borrowed(""),
            Cell::Text(s) => Cow::Borrowed(s.as_str()),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Cow::Owned(format!("{}", *n as i64))
            }
            Cell::Number(n) => Cow::Owned(n.to_string()),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

/// One physical line of the report. Positions are 1-indexed; reading past
/// the last cell yields an empty cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<Cell>,
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            cells: texts.into_iter().map(|s| Cell::from(s.as_ref())).collect(),
        }
    }

    pub fn cell(&self, position: usize) -> &Cell {
        position
            .checked_sub(1)
            .and_then(|i| self.cells.get(i))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Cell::is_blank)
    }

    /// Build a row with the given 1-indexed positions filled and the rest empty.
    #[cfg(test)]
    pub fn sparse(values: &[(usize, &str)]) -> Self {
        let width = values.iter().map(|(p, _)| *p).max().unwrap_or(0);
        let mut cells = vec![Cell::Empty; width];
        for (position, value) in values {
            cells[position - 1] = Cell::from(*value);
        }
        Self { cells }
    }
}

/// Budget line classification carried in a description as `bli=<token>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum BudgetLine {
    Number(i64),
    Named(String),
    #[default]
    Absent,
}

impl fmt::Display for BudgetLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetLine::Number(n) => write!(f, "{n}"),
            BudgetLine::Named(s) => write!(f, "{s}"),
            BudgetLine::Absent => Ok(()),
        }
    }
}

impl Serialize for BudgetLine {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            BudgetLine::Number(n) => serializer.serialize_i64(*n),
            BudgetLine::Named(s) => serializer.serialize_str(s),
            BudgetLine::Absent => serializer.serialize_str(""),
        }
    }
}

/// One receipt, or one part of a split receipt, flattened from the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRecord {
    pub batch_number: String,
    pub batch_date: String,
    pub receipt_number: String,
    pub receipt_date: String,
    pub payor: String,
    pub is_transfer: bool,
    pub check_number: String,
    pub account: String,
    pub event: String,
    pub description: String,
    pub budget_line: BudgetLine,
    pub amount: f64,
    pub is_split: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}
