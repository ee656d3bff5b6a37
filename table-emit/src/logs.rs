//! Progress logging for pipeline runs.
//!
//! Entries are echoed to stderr (stdout carries command output) unless the
//! echo is off, and fanned out over a broadcast channel. The CLI subscribes
//! for `run --log-json`, drains the channel once the run is over and writes a
//! JSON-lines transcript of every attempt.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Entries kept per subscriber before the oldest are dropped.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    fn marker(self) -> &'static str {
        match self {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        }
    }
}

/// One progress line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth, e.g. 1 for HTTP details under an attempt
    pub indent: u8,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            indent: 0,
        }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }
}

/// Process-wide broadcaster used by the `log_*` helpers
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
    echo: AtomicBool,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            echo: AtomicBool::new(true),
        }
    }

    pub fn log(&self, entry: LogEntry) {
        if self.echo.load(Ordering::Relaxed) {
            eprintln!(
                "{}{} {}",
                "   ".repeat(entry.indent as usize),
                entry.level.marker(),
                entry.message
            );
        }

        // No receivers is fine
        let _ = self.sender.send(entry);
    }

    /// Turn the stderr echo on or off (`--quiet`)
    pub fn set_echo(&self, enabled: bool) {
        self.echo.store(enabled, Ordering::Relaxed);
    }

    /// Receiver for the entries logged from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Take everything currently buffered in `rx` without waiting.
///
/// Entries lost to a lagging receiver are skipped.
pub fn drain(rx: &mut broadcast::Receiver<LogEntry>) -> Vec<LogEntry> {
    let mut entries = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(entry) => entries.push(entry),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return entries,
        }
    }
}

/// Write one JSON object per entry, newline-terminated.
pub fn write_json_lines<W: Write>(mut out: W, entries: &[LogEntry]) -> io::Result<()> {
    for entry in entries {
        serde_json::to_writer(&mut out, entry)?;
        out.write_all(b"\n")?;
    }
    out.flush()
}

pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Info, msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Success, msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Warning, msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Error, msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Info, msg).with_indent(indent));
}

pub fn log_warning_indent(msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Warning, msg).with_indent(indent));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet(capacity: usize) -> LogBroadcaster {
        let broadcaster = LogBroadcaster::with_capacity(capacity);
        broadcaster.set_echo(false);
        broadcaster
    }

    #[test]
    fn test_drain_returns_entries_in_order() {
        let broadcaster = quiet(16);
        let mut rx = broadcaster.subscribe();

        broadcaster.log(LogEntry::new(LogLevel::Info, "requesting"));
        broadcaster.log(LogEntry::new(LogLevel::Warning, "row count was 19").with_indent(1));

        let entries = drain(&mut rx);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "requesting");
        assert_eq!(entries[1].level, LogLevel::Warning);
        assert_eq!(entries[1].indent, 1);

        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_drain_skips_lagged_entries() {
        let broadcaster = quiet(2);
        let mut rx = broadcaster.subscribe();

        for i in 0..3 {
            broadcaster.log(LogEntry::new(LogLevel::Info, format!("attempt {}", i)));
        }

        let messages: Vec<String> = drain(&mut rx).into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["attempt 1", "attempt 2"]);
    }

    #[test]
    fn test_entries_before_subscribe_are_not_seen() {
        let broadcaster = quiet(16);
        broadcaster.log(LogEntry::new(LogLevel::Error, "nobody listening"));

        let mut rx = broadcaster.subscribe();
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_json_lines_transcript() {
        let entries = vec![
            LogEntry::new(LogLevel::Warning, "[RowCountMismatch] row count was 18, expected 20"),
            LogEntry::new(LogLevel::Success, "done").with_indent(1),
        ];

        let mut out = Vec::new();
        write_json_lines(&mut out, &entries).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["level"], "warning");
        assert_eq!(first["message"], "[RowCountMismatch] row count was 18, expected 20");
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["level"], "success");
        assert_eq!(second["indent"], 1);
    }
}
