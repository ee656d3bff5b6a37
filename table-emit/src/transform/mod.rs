//! Transformation module.
//!
//! - Normalizer: validated [`Matrix`] to ordered [`Record`]s
//! - Pipeline: request, validate, correct, persist

pub mod pipeline;

pub use pipeline::*;

use crate::models::{Matrix, Record};

/// Turn a validated matrix into records, dropping the header.
///
/// Expects output of [`crate::validation::validate`]; rows are not checked
/// again here.
pub fn to_records(matrix: &Matrix) -> Vec<Record> {
    matrix
        .data_rows()
        .iter()
        .map(|row| {
            debug_assert_eq!(row.len(), 2, "unvalidated row reached the normalizer");
            Record {
                country: row.first().cloned().unwrap_or_default(),
                capital: row.get(1).cloned().unwrap_or_default(),
            }
        })
        .collect()
}
