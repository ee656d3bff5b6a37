//! table-emit CLI - ask a model for a validated country/capital table
//!
//! # Commands
//!
//! ```bash
//! table-emit run                                  # default prompt, CSV to out/data.csv
//! table-emit run "List 20 countries" -n 5         # custom prompt, 5 attempts
//! table-emit run --sink sqlite --sqlite-table capitals
//! table-emit run --log-json run.jsonl             # also save a transcript of the run
//! table-emit validate reply.txt                   # check a saved reply (or stdin)
//! ```
//!
//! Exit code is 0 on success, 1 when attempts are exhausted or on any
//! transport or persist error; details go to stderr.

use clap::{Parser, Subcommand};
use std::fs::{self, File};
use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};
use table_emit::ai::DEFAULT_USER_PROMPT;
use table_emit::logs::{drain, write_json_lines, LOG_BROADCASTER};
use table_emit::sinks::{write_records, DEFAULT_OUTPUT};
use table_emit::{
    client_from_env, run_once, to_records, validate, Provider, RunOptions, SinkConfig, SinkKind,
    SqliteOptions, DEFAULT_MAX_ATTEMPTS,
};

#[derive(Parser)]
#[command(name = "table-emit")]
#[command(about = "Request a country/capital table from an LLM, validate it, persist it", long_about = None)]
struct Cli {
    /// Hide progress logs
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Request, validate (with corrections) and persist a table
    Run {
        /// User prompt for the first request
        prompt: Option<String>,

        /// Maximum number of model requests
        #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..))]
        max_attempts: u32,

        /// Output backend
        #[arg(short, long, value_enum, default_value_t = SinkKind::Csv)]
        sink: SinkKind,

        /// CSV output path (also the base for SQLite defaults)
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// SQLite database path (default: output path with .sqlite)
        #[arg(long)]
        sqlite_db: Option<PathBuf>,

        /// SQLite table name (default: output file stem)
        #[arg(long)]
        sqlite_table: Option<String>,

        /// Drop and recreate the SQLite table first
        #[arg(long)]
        sqlite_replace: bool,

        /// Keep the stored capital when a country already exists
        #[arg(long)]
        sqlite_no_update: bool,

        /// Leave the SQLite journal mode alone instead of switching to WAL
        #[arg(long)]
        sqlite_no_wal: bool,

        /// Model provider
        #[arg(long, value_enum, env = "TABLE_EMIT_PROVIDER", default_value_t = Provider::OpenAi)]
        provider: Provider,

        /// Model name (provider default if unset)
        #[arg(short, long, env = "TABLE_EMIT_MODEL")]
        model: Option<String>,

        /// Completion token limit (provider default if unset)
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Write the run's progress log as JSON lines to this file
        #[arg(long)]
        log_json: Option<PathBuf>,
    },

    /// Validate a saved model reply and print the normalized CSV
    Validate {
        /// Reply file (default: stdin)
        input: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    if cli.quiet {
        LOG_BROADCASTER.set_echo(false);
    }

    let result = match cli.command {
        Commands::Run {
            prompt,
            max_attempts,
            sink,
            output,
            sqlite_db,
            sqlite_table,
            sqlite_replace,
            sqlite_no_update,
            sqlite_no_wal,
            provider,
            model,
            max_tokens,
            log_json,
        } => {
            let sink_config = match sink {
                SinkKind::Csv => SinkConfig::Csv { path: output },
                SinkKind::Sqlite => SinkConfig::sqlite_from(
                    &output,
                    sqlite_db,
                    sqlite_table,
                    SqliteOptions {
                        replace_table: sqlite_replace,
                        update_existing: !sqlite_no_update,
                        wal: !sqlite_no_wal,
                    },
                ),
                SinkKind::None => SinkConfig::Null,
            };
            let options = RunOptions {
                prompt: prompt.unwrap_or_else(|| DEFAULT_USER_PROMPT.to_string()),
                max_attempts,
            };
            cmd_run(
                options,
                sink_config,
                provider,
                model.as_deref(),
                max_tokens,
                log_json.as_deref(),
            )
            .await
        }

        Commands::Validate { input } => cmd_validate(input.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_run(
    options: RunOptions,
    sink_config: SinkConfig,
    provider: Provider,
    model: Option<&str>,
    max_tokens: Option<u32>,
    log_json: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = client_from_env(provider, model, max_tokens)?;
    let sink = sink_config.build();

    let mut transcript = log_json.map(|_| LOG_BROADCASTER.subscribe());
    let result = run_once(client.as_ref(), sink.as_ref(), &options).await;

    // Failed runs get a transcript too
    if let (Some(path), Some(rx)) = (log_json, transcript.as_mut()) {
        write_json_lines(BufWriter::new(File::create(path)?), &drain(rx))?;
    }
    let report = result?;

    eprintln!(
        "\n✨ Wrote {} records to {} ({} attempt(s))",
        report.records.len(),
        report.destination,
        report.attempts
    );
    Ok(())
}

fn cmd_validate(input: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let raw = match input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    match validate(&raw) {
        Ok(matrix) => {
            println!("VALID");
            write_records(std::io::stdout().lock(), &to_records(&matrix))?;
            Ok(())
        }
        Err(failure) => {
            println!("INVALID");
            println!("[{}] {}", failure.kind(), failure);
            Err(failure.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn reply_file(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_validate_accepts_sorted_table() {
        let rows: Vec<String> = (0..20).map(|i| format!("Country{:02},Capital{:02}", i, i)).collect();
        let file = reply_file(&format!("country,capital\n{}\n", rows.join("\n")));

        assert!(cmd_validate(Some(file.path())).is_ok());
    }

    #[test]
    fn test_validate_failure_is_returned() {
        let file = reply_file("country,capital\nPeru,Lima\n");

        let err = cmd_validate(Some(file.path())).unwrap_err();
        assert_eq!(err.to_string(), "row count was 1, expected 20");
    }

    #[test]
    fn test_validate_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(cmd_validate(Some(&dir.path().join("missing.txt"))).is_err());
    }
}
