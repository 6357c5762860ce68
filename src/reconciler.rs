use crate::error::{FlatError, Result};
use crate::models::ReceiptRecord;

/// Largest difference between a declared and a computed total that still
/// counts as a match.
pub const TOTAL_TOLERANCE: f64 = 1e-5;

#[derive(Debug, Clone, PartialEq)]
pub enum CheckScope {
    Batch(String),
    Report,
}

/// Outcome of a successful total check.
#[derive(Debug, Clone, PartialEq)]
pub struct TotalCheck {
    pub scope: CheckScope,
    pub declared: f64,
    pub computed: f64,
    pub record_count: usize,
}

pub fn within_tolerance(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() < tolerance
}

pub fn reconcile_batch(
    records: &[ReceiptRecord],
    batch_number: &str,
    declared: f64,
    tolerance: f64,
) -> Result<TotalCheck> {
    let (computed, record_count) = records
        .iter()
        .filter(|r| r.batch_number == batch_number)
        .fold((0.0, 0usize), |(sum, n), r| (sum + r.amount, n + 1));

    if !within_tolerance(declared, computed, tolerance) {
        return Err(FlatError::BatchTotalMismatch {
            batch: batch_number.to_string(),
            declared,
            computed,
        });
    }
    Ok(TotalCheck {
        scope: CheckScope::Batch(batch_number.to_string()),
        declared,
        computed,
        record_count,
    })
}

pub fn reconcile_report(records: &[ReceiptRecord], declared: f64, tolerance: f64) -> Result<TotalCheck> {
    let computed: f64 = records.iter().map(|r| r.amount).sum();

    if !within_tolerance(declared, computed, tolerance) {
        return Err(FlatError::ReportTotalMismatch { declared, computed });
    }
    Ok(TotalCheck {
        scope: CheckScope::Report,
        declared,
        computed,
        record_count: records.len(),
    })
}
