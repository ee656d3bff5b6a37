//! RFC4180 tokenizing of model replies.
//!
//! Turns raw reply text into rows of string fields. No shape checks here;
//! see [`crate::validation`] for those.

use once_cell::sync::Lazy;
use regex::Regex;

/// First ```csv fenced block, language tag case-insensitive.
static CSV_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)```csv[ \t]*\r?\n?(.*?)```").expect("fence pattern is valid")
});

/// CSV parsing error with context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvError {
    pub line: u64,
    pub message: String,
}

impl std::fmt::Display for CsvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for CsvError {}

impl CsvError {
    pub fn new(line: u64, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// One tokenized CSV record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    /// 1-based line where the record starts
    pub line: u64,
    pub fields: Vec<String>,
}

/// Extract the CSV payload from a model reply.
///
/// Returns the trimmed contents of the first ```csv block, or the whole
/// trimmed text when there is no such block.
pub fn extract_code_fence(text: &str) -> &str {
    match CSV_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(m) => m.as_str().trim(),
        None => text.trim(),
    }
}

/// Tokenize CSV text into rows.
///
/// Quoted fields may hold commas, newlines and doubled quotes. Rows may have
/// any number of fields; the caller decides what is acceptable.
pub fn parse_rows(csv_text: &str) -> Result<Vec<ParsedRow>, CsvError> {
    check_quoting(csv_text)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or(0);
            CsvError::new(line, e.to_string())
        })?;

        let line = record.position().map(|p| p.line()).unwrap_or(0);
        rows.push(ParsedRow {
            line,
            fields: record.iter().map(str::to_string).collect(),
        });
    }

    Ok(rows)
}

/// Position inside the current field while scanning quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldState {
    Start,
    Unquoted,
    Quoted,
    /// Just saw a quote inside a quoted field: it closes or doubles.
    AfterQuote,
}

/// Reject quoting that a lenient reader would accept and mangle.
///
/// A quote may only open a field, close it, or be doubled inside a quoted
/// field. A closing quote must be followed by a comma, a line break or the
/// end of input.
fn check_quoting(csv_text: &str) -> Result<(), CsvError> {
    let mut state = FieldState::Start;
    let mut line = 1u64;
    let mut opened_at = 0u64;

    for c in csv_text.chars() {
        state = match (state, c) {
            (FieldState::Quoted, '"') => FieldState::AfterQuote,
            (FieldState::Quoted, '\n') => {
                line += 1;
                FieldState::Quoted
            }
            (FieldState::Quoted, _) => FieldState::Quoted,
            (FieldState::AfterQuote, '"') => FieldState::Quoted,
            (FieldState::Start, '"') => {
                opened_at = line;
                FieldState::Quoted
            }
            (FieldState::Unquoted, '"') => {
                return Err(CsvError::new(line, "quote inside an unquoted field"));
            }
            (_, ',') | (_, '\r') => FieldState::Start,
            (_, '\n') => {
                line += 1;
                FieldState::Start
            }
            (FieldState::AfterQuote, other) => {
                return Err(CsvError::new(
                    line,
                    format!("unexpected {:?} after closing quote", other),
                ));
            }
            _ => FieldState::Unquoted,
        };
    }

    if state == FieldState::Quoted {
        return Err(CsvError::new(opened_at, "unbalanced quote: quoted field is never closed"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(rows: &[ParsedRow]) -> Vec<Vec<&str>> {
        rows.iter()
            .map(|r| r.fields.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn test_extract_from_csv_fence() {
        let reply = "Here you go:\n\n```csv\ncountry,capital\nPeru,Lima\n```\n\nAnything else?";
        assert_eq!(extract_code_fence(reply), "country,capital\nPeru,Lima");
    }

    #[test]
    fn test_extract_fence_case_insensitive() {
        let reply = "```CSV\ncountry,capital\n```";
        assert_eq!(extract_code_fence(reply), "country,capital");
    }

    #[test]
    fn test_extract_without_fence_trims() {
        assert_eq!(extract_code_fence("\n  country,capital\n"), "country,capital");
    }

    #[test]
    fn test_simple_rows() {
        let rows = parse_rows("country,capital\nPeru,Lima").unwrap();
        assert_eq!(fields(&rows), vec![vec!["country", "capital"], vec!["Peru", "Lima"]]);
        assert_eq!(rows[0].line, 1);
        assert_eq!(rows[1].line, 2);
    }

    #[test]
    fn test_quoted_fields() {
        let csv = "\"Korea, South\",Seoul\nItaly,\"Rome \"\"Eternal City\"\"\"";
        let rows = parse_rows(csv).unwrap();
        assert_eq!(rows[0].fields, vec!["Korea, South", "Seoul"]);
        assert_eq!(rows[1].fields, vec!["Italy", "Rome \"Eternal City\""]);
    }

    #[test]
    fn test_embedded_newline_keeps_start_line() {
        let csv = "a,\"multi\nline\"\nb,c";
        let rows = parse_rows(csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fields[1], "multi\nline");
        assert_eq!(rows[1].line, 3);
    }

    #[test]
    fn test_ragged_rows_allowed() {
        let rows = parse_rows("a,b\nc,d,e\nf").unwrap();
        assert_eq!(rows[1].fields.len(), 3);
        assert_eq!(rows[2].fields.len(), 1);
    }

    #[test]
    fn test_unbalanced_quote() {
        let err = parse_rows("country,capital\n\"Peru,Lima\nChile,Santiago").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("unbalanced"));
    }

    #[test]
    fn test_stray_quote_in_unquoted_field() {
        let err = parse_rows("country,capital\nCote d\"Ivoire,Yamoussoukro").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_paired_stray_quotes_rejected() {
        let err = parse_rows("country,capital\nItaly,Ro\"m\"e").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("unquoted field"));
    }

    #[test]
    fn test_text_after_closing_quote_rejected() {
        let err = parse_rows("country,capital\nPeru,Lima\nItaly,\"Rome\"x").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.message.contains("after closing quote"));
    }

    #[test]
    fn test_closing_quote_before_crlf() {
        let rows = parse_rows("\"country\",\"capital\"\r\n\"Peru\",Lima").unwrap();
        assert_eq!(fields(&rows), vec![vec!["country", "capital"], vec!["Peru", "Lima"]]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let rows = parse_rows("country,capital\r\nPeru,Lima\r\n").unwrap();
        assert_eq!(fields(&rows), vec![vec!["country", "capital"], vec!["Peru", "Lima"]]);
    }

    #[test]
    fn test_error_message_format() {
        let err = CsvError::new(5, "bad field");
        assert_eq!(err.to_string(), "line 5: bad field");
    }
}
