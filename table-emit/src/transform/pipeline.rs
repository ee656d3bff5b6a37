//! High-level pipeline API: request a table, validate it, persist it.
//!
//! # Example
//!
//! ```rust,ignore
//! use table_emit::ai::{client_from_env, Provider};
//! use table_emit::sinks::CsvSink;
//! use table_emit::transform::pipeline::{run_once, RunOptions};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = client_from_env(Provider::OpenAi, None, None)?;
//!     let sink = CsvSink::new("out/data.csv");
//!     let report = run_once(client.as_ref(), &sink, &RunOptions::default()).await?;
//!     println!("{} records in {} attempt(s)", report.records.len(), report.attempts);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::ai::{ModelClient, DEFAULT_USER_PROMPT};
use crate::error::{PipelineError, PipelineResult};
use crate::logs::{log_error, log_info};
use crate::models::Record;
use crate::orchestrator::{Orchestrator, Outcome};
use crate::sinks::{emit, Sink};

/// Default attempt budget: the first request plus two corrections.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Options for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOptions {
    /// User prompt for the first request
    pub prompt: String,

    /// Upper bound on model requests
    pub max_attempts: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_USER_PROMPT.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Records as persisted
    pub records: Vec<Record>,

    /// Requests it took
    pub attempts: u32,

    /// Sink description
    pub destination: String,
}

/// Request, validate and correct until the table is valid, then persist it.
///
/// Exhausting the budget, a transport error and a sink error all end the run
/// with an error; only the first is preceded by retries.
pub async fn run_once(
    client: &dyn ModelClient,
    sink: &dyn Sink,
    options: &RunOptions,
) -> PipelineResult<RunReport> {
    log_info(format!("▶ Prompt: {:?}", options.prompt));
    log_info(format!("Output: {}", sink.destination()));

    let outcome = Orchestrator::new(client, options.prompt.as_str())
        .run(options.max_attempts)
        .await?;

    match outcome {
        Outcome::Succeeded { records, attempts } => {
            emit(&records, sink)?;
            Ok(RunReport {
                records,
                attempts,
                destination: sink.destination(),
            })
        }
        Outcome::Exhausted { failure, attempts } => {
            log_error(format!("No valid table after {} attempt(s)", attempts));
            Err(PipelineError::Exhausted { attempts, failure })
        }
    }
}
