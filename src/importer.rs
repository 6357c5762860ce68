use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{FlatError, Result};
use crate::models::{Cell, Row};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[cfg(any(feature = "xlsx", test))]
pub fn excel_serial_to_date(serial: f64) -> String {
    // Serial 0 is 1899-12-30; the phantom 1900-02-29 shifts the epoch back a day.
    chrono::NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|base| base.checked_add_signed(chrono::Duration::days(serial.floor() as i64)))
        .map(|date| date.format("%m-%d-%Y").to_string())
        .unwrap_or_default()
}

pub fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

fn has_extension(file_path: &Path, extensions: &[&str]) -> bool {
    file_path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

// ---------------------------------------------------------------------------
// Source kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceKind {
    Csv,
    #[cfg(feature = "xlsx")]
    Workbook,
}

impl SourceKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            #[cfg(feature = "xlsx")]
            Self::Workbook => "xlsx",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Csv => "CSV export",
            #[cfg(feature = "xlsx")]
            Self::Workbook => "Spreadsheet workbook",
        }
    }

    pub fn extensions(&self) -> &[&str] {
        match self {
            Self::Csv => &["csv", "txt"],
            #[cfg(feature = "xlsx")]
            Self::Workbook => &["xlsx", "xlsm", "xls", "ods"],
        }
    }

    pub fn detect(&self, file_path: &Path) -> bool {
        has_extension(file_path, self.extensions())
    }

    /// Feed every physical row of the file to `f` in file order, with its
    /// 1-indexed row number. `f` returns `false` to stop early.
    pub fn for_each_row<F>(&self, file_path: &Path, sheet: Option<&str>, f: F) -> Result<()>
    where
        F: FnMut(usize, Row) -> Result<bool>,
    {
        info!(path = %file_path.display(), source = self.name(), "reading report");
        match self {
            Self::Csv => {
                if sheet.is_some() {
                    debug!("sheet name ignored for CSV input");
                }
                for_each_csv_row(file_path, f)
            }
            #[cfg(feature = "xlsx")]
            Self::Workbook => for_each_workbook_row(file_path, sheet, f),
        }
    }

    pub fn read_rows(&self, file_path: &Path, sheet: Option<&str>) -> Result<Vec<(usize, Row)>> {
        let mut rows = Vec::new();
        self.for_each_row(file_path, sheet, |n, row| {
            rows.push((n, row));
            Ok(true)
        })?;
        Ok(rows)
    }
}

const ALL_SOURCES: &[SourceKind] = &[
    SourceKind::Csv,
    #[cfg(feature = "xlsx")]
    SourceKind::Workbook,
];

pub fn get_by_key(key: &str) -> Result<SourceKind> {
    ALL_SOURCES
        .iter()
        .find(|s| s.key().eq_ignore_ascii_case(key))
        .copied()
        .ok_or_else(|| FlatError::UnknownFormat(key.to_string()))
}

pub fn get_for_file(file_path: &Path) -> SourceKind {
    ALL_SOURCES
        .iter()
        .find(|s| s.detect(file_path))
        .copied()
        // Unknown extensions are read as CSV.
        .unwrap_or(SourceKind::Csv)
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn for_each_csv_row<F>(file_path: &Path, mut f: F) -> Result<()>
where
    F: FnMut(usize, Row) -> Result<bool>,
{
    let data = std::fs::read(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data.as_slice());

    let mut record = csv::ByteRecord::new();
    let mut lines = LineCounter::new(&data);
    let mut count = 0usize;
    while rdr.read_byte_record(&mut record)? {
        count += 1;
        let offset = record.position().map_or(0, |p| p.byte() as usize);
        let row_number = lines.line_at(offset);
        let row = Row::from_texts(record.iter().map(String::from_utf8_lossy));
        if !f(row_number, row)? {
            break;
        }
    }
    debug!(records = count, "csv read complete");
    Ok(())
}

/// Maps record offsets to 1-indexed physical lines. Offsets must not
/// decrease between calls.
struct LineCounter<'a> {
    data: &'a [u8],
    scanned: usize,
    newlines: usize,
}

impl<'a> LineCounter<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            scanned: 0,
            newlines: 0,
        }
    }

    /// The reader reports a record as starting where the previous one
    /// ended, before any blank lines it skipped, so terminators are passed
    /// over first.
    fn line_at(&mut self, offset: usize) -> usize {
        let mut start = offset.max(self.scanned).min(self.data.len());
        while matches!(self.data.get(start), Some(b'\r' | b'\n')) {
            start += 1;
        }
        self.newlines += self.data[self.scanned..start]
            .iter()
            .filter(|&&b| b == b'\n')
            .count();
        self.scanned = start;
        self.newlines + 1
    }
}

// ---------------------------------------------------------------------------
// Workbook (feature-gated)
// ---------------------------------------------------------------------------

#[cfg(feature = "xlsx")]
fn workbook_cell(data: &calamine::Data) -> Cell {
    use calamine::Data;
    match data {
        Data::String(s) => Cell::from(s.as_str()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => Cell::Text(excel_serial_to_date(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        _ => Cell::Empty,
    }
}

#[cfg(feature = "xlsx")]
fn for_each_workbook_row<F>(file_path: &Path, sheet: Option<&str>, mut f: F) -> Result<()>
where
    F: FnMut(usize, Row) -> Result<bool>,
{
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(file_path)
        .map_err(|e| FlatError::Workbook(format!("Failed to open workbook: {e}")))?;

    let name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| FlatError::Workbook("Workbook has no sheets".to_string()))?,
    };
    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| FlatError::Workbook(format!("Sheet '{name}': {e}")))?;

    // The range starts at its first used cell; pad so positions and row
    // numbers stay absolute.
    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    for (i, cells) in range.rows().enumerate() {
        let mut row = vec![Cell::Empty; first_col as usize];
        row.extend(cells.iter().map(workbook_cell));
        if !f(first_row as usize + i + 1, Row::new(row))? {
            break;
        }
    }
    Ok(())
}
