use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("{field} not found, row {row}")]
    MissingRequiredField { field: &'static str, row: usize },

    #[error("Unknown field name: '{0}'")]
    UnknownField(String),

    #[error(
        "Reported batch total does not match total of receipts scanned for batch {batch} \
         (declared {declared:.2}, computed {computed:.2})"
    )]
    BatchTotalMismatch {
        batch: String,
        declared: f64,
        computed: f64,
    },

    #[error(
        "Input report grand total does not match total of receipts scanned \
         (declared {declared:.2}, computed {computed:.2})"
    )]
    ReportTotalMismatch { declared: f64, computed: f64 },

    #[error("Batch total at row {row} closes a batch with no receipts")]
    BatchTotalWithoutReceipts { row: usize },

    #[error("Row {row} matches no known row layout")]
    UnclassifiedRow { row: usize },

    #[error("Unknown source format: {0}")]
    UnknownFormat(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, FlatError>;
