//! SQLite table sink.
//!
//! Upserts records keyed by `country`: new countries are inserted, existing
//! ones get their capital updated (or are left alone with
//! `update_existing: false`). All rows go in one transaction.

use rusqlite::{params, Connection};
use std::path::PathBuf;

use super::Sink;
use crate::error::{PersistError, PersistResult};
use crate::models::Record;

/// Write behaviour of a [`SqliteSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqliteOptions {
    /// Drop and recreate the table before writing
    pub replace_table: bool,
    /// On a duplicate country, overwrite the stored capital
    pub update_existing: bool,
    /// Switch the database to `journal_mode=WAL`
    pub wal: bool,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            replace_table: false,
            update_existing: true,
            wal: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SqliteSink {
    db_path: PathBuf,
    table: String,
    options: SqliteOptions,
}

impl SqliteSink {
    pub fn new(db_path: impl Into<PathBuf>, table: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            table: table.into(),
            options: SqliteOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SqliteOptions) -> Self {
        self.options = options;
        self
    }

    fn write(&self, conn: &mut Connection, records: &[Record]) -> PersistResult<()> {
        let table = quote_ident(&self.table)?;
        let index = quote_ident(&format!("{}__uniq__country", self.table))?;
        let on_conflict = if self.options.update_existing {
            "DO UPDATE SET \"capital\" = excluded.\"capital\""
        } else {
            "DO NOTHING"
        };

        let tx = conn.transaction()?;
        if self.options.replace_table {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))?;
        }
        tx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (\"country\" TEXT NOT NULL, \"capital\" TEXT);
             CREATE UNIQUE INDEX IF NOT EXISTS {index} ON {table} (\"country\");"
        ))?;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {table} (\"country\", \"capital\") VALUES (?1, ?2)
                 ON CONFLICT(\"country\") {on_conflict}"
            ))?;
            for record in records {
                stmt.execute(params![record.country, record.capital])?;
            }
        }

        tx.commit()?;
        Ok(())
    }
}

impl Sink for SqliteSink {
    fn persist(&self, records: &[Record]) -> PersistResult<()> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut conn = Connection::open(&self.db_path)?;
        if self.options.wal {
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        }
        self.write(&mut conn, records)
    }

    fn destination(&self) -> String {
        format!("{} (table '{}')", self.db_path.display(), self.table)
    }
}

/// Quote an identifier with double quotes; embedded quotes are refused.
fn quote_ident(name: &str) -> PersistResult<String> {
    if name.is_empty() || name.contains('"') {
        return Err(PersistError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", name))
}
