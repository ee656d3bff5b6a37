//! Prompt text for table requests and corrections.

use crate::error::ValidationFailure;
use crate::models::{header_line, ROW_COUNT};

/// User prompt used when none is given on the command line.
pub const DEFAULT_USER_PROMPT: &str = "Produce the list of countries and their capitals.";

/// Output contract sent as the system message.
pub fn system_prompt() -> String {
    [
        "You are a data emitter. Return ONLY valid CSV inside one single ```csv fenced block.".to_string(),
        format!("Header MUST be exactly: {}", header_line()),
        "Use RFC4180 quoting rules: quote fields that contain commas, quotes or newlines; escape quotes by doubling them.".to_string(),
        format!("Exactly {} data rows (no more, no less).", ROW_COUNT),
        "Sort rows A→Z by the country column (plain character order), with no duplicate countries.".to_string(),
    ]
    .join("\n")
}

/// Follow-up request after a failed attempt.
///
/// Names the violated check, then repeats the previous output verbatim so the
/// model can fix it in place.
pub fn correction_prompt(failure: &ValidationFailure, previous: &str) -> String {
    format!(
        r#"Your previous output was invalid for this reason:
- {failure}

Re-emit the result as CSV ONLY, in one single ```csv fenced block,
with header `{header}`, exactly {rows} data rows sorted by country,
RFC4180 quoting. No commentary.
Here is your previous output to fix, do NOT add explanations:

{previous}
"#,
        failure = failure,
        header = header_line(),
        rows = ROW_COUNT,
        previous = previous,
    )
}
