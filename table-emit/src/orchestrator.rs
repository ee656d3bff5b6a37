//! Request → validate → correct loop.
//!
//! The loop is an explicit state machine:
//!
//! ```text
//!            ┌──────────────────────────────┐
//!            ▼                              │
//!      ┌────────────┐    ┌────────────┐    ┌┴───────────┐
//!  ──▶ │ Requesting │──▶ │ Validating │──▶ │ Correcting │
//!      └────────────┘    └─────┬──────┘    └────────────┘
//!                              │
//!                 ┌────────────┴────────────┐
//!                 ▼                         ▼
//!           ┌───────────┐            ┌───────────┐
//!           │ Succeeded │            │ Exhausted │
//!           └───────────┘            └───────────┘
//! ```
//!
//! Attempts are strictly sequential: each correction prompt is built from the
//! failure of the attempt right before it. A transport error ends the run
//! immediately; it is never retried here.

use crate::ai::{correction_prompt, system_prompt, Conversation, ModelClient};
use crate::error::{TransportResult, ValidationFailure};
use crate::logs::{log_info, log_success, log_warning};
use crate::models::Record;
use crate::transform::to_records;
use crate::validation::validate;

/// States of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    /// About to send the next request.
    Requesting,
    /// Holding the reply of the current attempt.
    Validating(String),
    /// Building the correction for this failure.
    Correcting(ValidationFailure),
    /// Terminal: the reply validated.
    Succeeded(Vec<Record>),
    /// Terminal: the attempt budget is spent.
    Exhausted(ValidationFailure),
}

/// Per-run bookkeeping, dropped when the run ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptState {
    /// 1-based index of the current attempt
    pub attempt: u32,
    pub max_attempts: u32,
    pub last_response: Option<String>,
    pub last_failure: Option<ValidationFailure>,
}

impl AttemptState {
    /// A budget of zero is treated as one attempt.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempt: 1,
            max_attempts: max_attempts.max(1),
            last_response: None,
            last_failure: None,
        }
    }

    pub fn is_last(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

/// How a run ended, transport errors aside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded {
        records: Vec<Record>,
        attempts: u32,
    },
    Exhausted {
        failure: ValidationFailure,
        attempts: u32,
    },
}

/// Drives one table request to success or exhaustion.
pub struct Orchestrator<'a> {
    client: &'a dyn ModelClient,
    user_prompt: String,
}

impl<'a> Orchestrator<'a> {
    pub fn new(client: &'a dyn ModelClient, user_prompt: impl Into<String>) -> Self {
        Self {
            client,
            user_prompt: user_prompt.into(),
        }
    }

    /// Run the loop with at most `max_attempts` requests.
    pub async fn run(&self, max_attempts: u32) -> TransportResult<Outcome> {
        let mut conversation = Conversation::new(system_prompt());
        conversation.push_user(self.user_prompt.as_str());

        let mut attempts = AttemptState::new(max_attempts);
        let mut state = State::Requesting;

        loop {
            state = match state {
                State::Requesting => {
                    log_info(format!(
                        "🤖 Attempt {}/{}: requesting table from {}",
                        attempts.attempt,
                        attempts.max_attempts,
                        self.client.name()
                    ));
                    State::Validating(self.client.send(&conversation).await?)
                }

                State::Validating(raw) => {
                    let result = validate(&raw);
                    attempts.last_response = Some(raw);
                    match result {
                        Ok(matrix) => State::Succeeded(to_records(&matrix)),
                        Err(failure) => {
                            log_warning(format!("[{}] {}", failure.kind(), failure));
                            attempts.last_failure = Some(failure.clone());
                            if attempts.is_last() {
                                State::Exhausted(failure)
                            } else {
                                attempts.attempt += 1;
                                State::Correcting(failure)
                            }
                        }
                    }
                }

                State::Correcting(failure) => {
                    let previous = attempts.last_response.as_deref().unwrap_or_default();
                    let correction = correction_prompt(&failure, previous);
                    conversation.push_assistant(previous);
                    conversation.push_user(correction);
                    State::Requesting
                }

                State::Succeeded(records) => {
                    log_success(format!(
                        "Valid table after {} attempt(s): {} records",
                        attempts.attempt,
                        records.len()
                    ));
                    return Ok(Outcome::Succeeded {
                        records,
                        attempts: attempts.attempt,
                    });
                }

                State::Exhausted(failure) => {
                    log_warning(format!("Giving up after {} attempt(s)", attempts.attempt));
                    return Ok(Outcome::Exhausted {
                        failure,
                        attempts: attempts.attempt,
                    });
                }
            };
        }
    }
}
