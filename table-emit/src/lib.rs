//! # table-emit - validated tables from a language model
//!
//! Asks a model for a `country,capital` table of exactly 20 sorted rows,
//! checks the reply strictly, sends precise corrections until it is right
//! (or the attempt budget runs out), then writes the records to a sink.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Model reply │────▶│  Validator  │────▶│ Normalizer  │────▶│    Sink     │
//! │  (raw CSV)  │     │ (5 checks)  │     │  (records)  │     │ (csv/sqlite)│
//! └─────────────┘     └──────┬──────┘     └─────────────┘     └─────────────┘
//!        ▲                   │ failure
//!        └── correction ◀────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use table_emit::{client_from_env, run_once, CsvSink, Provider, RunOptions};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let client = client_from_env(Provider::OpenAi, None, None).unwrap();
//!     let report = run_once(client.as_ref(), &CsvSink::new("out/data.csv"), &RunOptions::default())
//!         .await
//!         .unwrap();
//!     println!("Wrote {} records", report.records.len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per layer
//! - [`logs`] - Progress log broadcaster
//! - [`models`] - Matrix, Record, target shape
//! - [`parser`] - Code-fence extraction and RFC4180 tokenizing
//! - [`validation`] - Shape checks
//! - [`transform`] - Normalizer and pipeline
//! - [`orchestrator`] - Retry/correction state machine
//! - [`ai`] - Model clients and prompts
//! - [`sinks`] - CSV, SQLite and null sinks

// Core modules
pub mod error;
pub mod logs;
pub mod models;

// Parsing and validation
pub mod parser;
pub mod validation;

// Transformation
pub mod transform;

// Retry loop
pub mod orchestrator;

// AI
pub mod ai;

// Output
pub mod sinks;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{PersistError, PipelineError, TransportError, ValidationFailure};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Matrix, Record, HEADER, ROW_COUNT};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::validate;

// =============================================================================
// Re-exports - Normalizer / Pipeline
// =============================================================================

pub use transform::{run_once, to_records, RunOptions, RunReport, DEFAULT_MAX_ATTEMPTS};

// =============================================================================
// Re-exports - Orchestrator
// =============================================================================

pub use orchestrator::{AttemptState, Orchestrator, Outcome, State};

// =============================================================================
// Re-exports - AI Clients
// =============================================================================

pub use ai::{client_from_env, AnthropicClient, Conversation, ModelClient, OpenAiClient, Provider};

// =============================================================================
// Re-exports - Sinks
// =============================================================================

pub use sinks::{CsvSink, NullSink, Sink, SinkConfig, SinkKind, SqliteOptions, SqliteSink};
