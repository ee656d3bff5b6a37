//! Shape validation for model replies.
//!
//! [`validate`] runs the checks in a fixed order and stops at the first
//! violation, so exactly one [`ValidationFailure`] is ever reported:
//!
//! 1. RFC4180 tokenizing (`ParseError`)
//! 2. header is exactly `country,capital` (`HeaderMismatch`)
//! 3. exactly 20 data rows (`RowCountMismatch`)
//! 4. two fields per data row (`ColumnCountMismatch`)
//! 5. countries strictly ascending in code-point order (`SortOrderViolation`)
//!
//! # Example
//!
//! ```rust,ignore
//! use table_emit::validation::validate;
//!
//! match validate(&reply) {
//!     Ok(matrix) => println!("{} data rows", matrix.data_rows().len()),
//!     Err(failure) => eprintln!("[{}] {}", failure.kind(), failure),
//! }
//! ```

use crate::error::{ValidationFailure, ValidationResult};
use crate::models::{header_line, Matrix, HEADER, ROW_COUNT};
use crate::parser::{extract_code_fence, parse_rows, ParsedRow};

/// Validate a raw model reply and return its rows.
///
/// A ```csv fenced block is used when present; otherwise the whole text.
pub fn validate(raw_text: &str) -> ValidationResult<Matrix> {
    let csv_text = extract_code_fence(raw_text);

    let rows = parse_rows(csv_text).map_err(|e| ValidationFailure::ParseError(e.to_string()))?;
    if rows.is_empty() {
        return Err(ValidationFailure::ParseError("no CSV rows found".to_string()));
    }

    check_header(&rows[0])?;

    let data = &rows[1..];
    check_row_count(data)?;
    check_columns(data)?;
    check_sort_order(data)?;

    Ok(Matrix::from_rows(rows.into_iter().map(|r| r.fields).collect()))
}

fn check_header(header: &ParsedRow) -> ValidationResult<()> {
    if header.fields.iter().map(String::as_str).eq(HEADER) {
        return Ok(());
    }
    Err(ValidationFailure::HeaderMismatch {
        expected: header_line(),
        actual: header.fields.join(","),
    })
}

fn check_row_count(data: &[ParsedRow]) -> ValidationResult<()> {
    if data.len() == ROW_COUNT {
        return Ok(());
    }
    Err(ValidationFailure::RowCountMismatch {
        expected: ROW_COUNT,
        actual: data.len(),
    })
}

fn check_columns(data: &[ParsedRow]) -> ValidationResult<()> {
    let expected = HEADER.len();
    match data.iter().enumerate().find(|(_, r)| r.fields.len() != expected) {
        Some((i, row)) => Err(ValidationFailure::ColumnCountMismatch {
            row: i + 1,
            line: row.line,
            expected,
            actual: row.fields.len(),
        }),
        None => Ok(()),
    }
}

/// `str` ordering is byte order, which for UTF-8 is code-point order.
fn check_sort_order(data: &[ParsedRow]) -> ValidationResult<()> {
    for (i, pair) in data.windows(2).enumerate() {
        let previous = &pair[0].fields[0];
        let next = &pair[1].fields[0];
        if previous >= next {
            return Err(ValidationFailure::SortOrderViolation {
                row: i + 1,
                previous: previous.clone(),
                next: next.clone(),
            });
        }
    }
    Ok(())
}
