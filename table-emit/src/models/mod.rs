//! Domain models for the table-emit pipeline.
//!
//! - [`Matrix`] - validated CSV rows, header included
//! - [`Record`] - one country/capital pair
//! - [`HEADER`] / [`ROW_COUNT`] - the fixed target shape

use serde::{Deserialize, Serialize};

// =============================================================================
// Target Shape
// =============================================================================

/// The only accepted header row.
pub const HEADER: [&str; 2] = ["country", "capital"];

/// Number of data rows expected after the header.
pub const ROW_COUNT: usize = 20;

/// Header as a single CSV line.
pub fn header_line() -> String {
    HEADER.join(",")
}

// =============================================================================
// Matrix
// =============================================================================

/// Parsed CSV rows, header first.
///
/// Only [`crate::validation::validate`] builds one, so every `Matrix` seen
/// outside this crate satisfies the target shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: Vec<Vec<String>>,
}

impl Matrix {
    pub(crate) fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// All rows, header included.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// The header row (empty if there are no rows).
    pub fn header(&self) -> &[String] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rows after the header.
    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }
}

// =============================================================================
// Record
// =============================================================================

/// One normalized data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub country: String,
    pub capital: String,
}

impl Record {
    pub fn new(country: impl Into<String>, capital: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            capital: capital.into(),
        }
    }

    /// Fields in header order.
    pub fn fields(&self) -> [&str; 2] {
        [self.country.as_str(), self.capital.as_str()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_line() {
        assert_eq!(header_line(), "country,capital");
    }

    #[test]
    fn test_matrix_accessors() {
        let matrix = Matrix::from_rows(vec![
            vec!["country".into(), "capital".into()],
            vec!["France".into(), "Paris".into()],
        ]);
        assert_eq!(matrix.header(), ["country", "capital"]);
        assert_eq!(matrix.data_rows().len(), 1);
        assert_eq!(matrix.data_rows()[0][1], "Paris");
    }

    #[test]
    fn test_empty_matrix() {
        let matrix = Matrix::from_rows(vec![]);
        assert!(matrix.header().is_empty());
        assert!(matrix.data_rows().is_empty());
    }

    #[test]
    fn test_record_serializes_fixed_keys() {
        let record = Record::new("Peru", "Lima");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["country"], "Peru");
        assert_eq!(json["capital"], "Lima");
        assert_eq!(record.fields(), ["Peru", "Lima"]);
    }
}
