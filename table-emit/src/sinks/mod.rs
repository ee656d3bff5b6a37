//! Output sinks.
//!
//! A [`Sink`] takes validated records and stores them. The pipeline only ever
//! sees `dyn Sink`, so backends are interchangeable:
//!
//! - [`CsvSink`] - overwrites a CSV file
//! - [`SqliteSink`] - upserts into a SQLite table keyed by country
//! - [`NullSink`] - stores nothing (dry runs)
//!
//! Sinks do not validate; records come from the validator/normalizer.

pub mod csv;
pub mod sqlite;

use std::path::{Path, PathBuf};

use crate::error::PersistResult;
use crate::logs::{log_info, log_success};
use crate::models::Record;

pub use self::csv::{write_records, CsvSink};
pub use self::sqlite::{SqliteOptions, SqliteSink};

/// Default CSV output path.
pub const DEFAULT_OUTPUT: &str = "out/data.csv";

/// Persistence capability.
pub trait Sink {
    /// Store `records` in order.
    fn persist(&self, records: &[Record]) -> PersistResult<()>;

    /// Where records end up, for logs and reports.
    fn destination(&self) -> String;
}

/// Accepts anything, stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl Sink for NullSink {
    fn persist(&self, _records: &[Record]) -> PersistResult<()> {
        Ok(())
    }

    fn destination(&self) -> String {
        "nowhere (dry run)".to_string()
    }
}

/// Persist with progress logging.
pub fn emit(records: &[Record], sink: &dyn Sink) -> PersistResult<()> {
    log_info(format!("💾 Writing {} records to {}", records.len(), sink.destination()));
    sink.persist(records)?;
    log_success(format!("Records written to {}", sink.destination()));
    Ok(())
}

/// Sink backend names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SinkKind {
    Csv,
    Sqlite,
    None,
}

/// Sink selection, resolved before a run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkConfig {
    Csv {
        path: PathBuf,
    },
    Sqlite {
        db_path: PathBuf,
        table: String,
        options: SqliteOptions,
    },
    Null,
}

impl SinkConfig {
    /// SQLite settings, defaulting next to the CSV output path.
    ///
    /// `out/data.csv` gives database `out/data.sqlite` and table `data`.
    pub fn sqlite_from(
        csv_path: &Path,
        db_path: Option<PathBuf>,
        table: Option<String>,
        options: SqliteOptions,
    ) -> Self {
        let db_path = db_path.unwrap_or_else(|| csv_path.with_extension("sqlite"));
        let table = table.unwrap_or_else(|| {
            csv_path
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|s| !s.is_empty())
                .unwrap_or("data")
                .to_string()
        });
        SinkConfig::Sqlite { db_path, table, options }
    }

    pub fn build(self) -> Box<dyn Sink> {
        match self {
            SinkConfig::Csv { path } => Box::new(CsvSink::new(path)),
            SinkConfig::Sqlite { db_path, table, options } => {
                Box::new(SqliteSink::new(db_path, table).with_options(options))
            }
            SinkConfig::Null => Box::new(NullSink),
        }
    }
}
