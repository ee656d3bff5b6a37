//! Error types for the table-emit pipeline.
//!
//! One enum per layer, composed into [`PipelineError`] at the top:
//!
//! - [`ValidationFailure`] - shape violations in a model reply (recoverable)
//! - [`TransportError`] - model provider failures (fatal)
//! - [`PersistError`] - sink write failures (fatal)
//! - [`PipelineError`] - top-level run errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Validation Failures
// =============================================================================

/// A single violated invariant of the expected table shape.
///
/// The `Display` output is what the model sees in a correction prompt, so each
/// variant describes exactly what was wrong and what was expected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// The text is not well-formed RFC4180 CSV.
    #[error("the reply could not be parsed as CSV: {0}")]
    ParseError(String),

    /// The first row is not the expected header.
    #[error("header mismatch: expected `{expected}`, got `{actual}`")]
    HeaderMismatch { expected: String, actual: String },

    /// Wrong number of data rows after the header.
    #[error("row count was {actual}, expected {expected}")]
    RowCountMismatch { expected: usize, actual: usize },

    /// A data row (1-based) does not have the expected number of fields.
    #[error("data row {row} (line {line}) has {actual} fields, expected {expected}")]
    ColumnCountMismatch {
        row: usize,
        line: u64,
        expected: usize,
        actual: usize,
    },

    /// Data rows `row` and `row + 1` (1-based) are not strictly ascending.
    #[error("{}", sort_order_message(.row, .previous, .next))]
    SortOrderViolation {
        row: usize,
        previous: String,
        next: String,
    },
}

fn sort_order_message(row: &usize, previous: &str, next: &str) -> String {
    if previous == next {
        format!(
            "rows {} and {} both contain `{}`; country names must be unique",
            row,
            row + 1,
            previous
        )
    } else {
        format!(
            "rows {} and {} are out of order: {} before {}",
            row,
            row + 1,
            previous,
            next
        )
    }
}

impl ValidationFailure {
    /// Stable name of the violated check.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ParseError(_) => "ParseError",
            Self::HeaderMismatch { .. } => "HeaderMismatch",
            Self::RowCountMismatch { .. } => "RowCountMismatch",
            Self::ColumnCountMismatch { .. } => "ColumnCountMismatch",
            Self::SortOrderViolation { .. } => "SortOrderViolation",
        }
    }
}

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors from the model provider.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Missing API key.
    #[error("Missing API key: {0}")]
    MissingApiKey(String),

    /// HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    /// The provider answered with an error status.
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// The provider answered with an unreadable body.
    #[error("Invalid JSON response: {0}")]
    InvalidJson(String),
}

// =============================================================================
// Persist Errors
// =============================================================================

/// Errors while writing records to a sink.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer error.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// SQLite error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Table name cannot be quoted safely.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level errors returned by [`crate::transform::pipeline::run_once`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Every attempt failed validation; carries the last failure.
    #[error("validation failed after {attempts} attempt(s): [{}] {failure}", .failure.kind())]
    Exhausted {
        attempts: u32,
        failure: ValidationFailure,
    },

    /// Model request error.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Sink error.
    #[error("Persist error: {0}")]
    Persist(#[from] PersistError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for validation.
pub type ValidationResult<T> = Result<T, ValidationFailure>;

/// Result type for model requests.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for sink operations.
pub type PersistResult<T> = Result<T, PersistError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
