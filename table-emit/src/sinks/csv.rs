//! CSV file sink.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use super::Sink;
use crate::error::PersistResult;
use crate::models::{Record, HEADER};

/// Writes `country,capital` plus one line per record, replacing the file.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Sink for CsvSink {
    fn persist(&self, records: &[Record]) -> PersistResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        // File::create truncates: no append, no merge
        let file = fs::File::create(&self.path)?;
        write_records(file, records)
    }

    fn destination(&self) -> String {
        self.path.display().to_string()
    }
}

/// Header and records as RFC4180 CSV, `\n` line endings.
pub fn write_records<W: Write>(out: W, records: &[Record]) -> PersistResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);

    writer.write_record(HEADER)?;
    for record in records {
        writer.write_record(record.fields())?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_records;
    use crate::transform::to_records;
    use crate::validation::validate;
    use tempfile::tempdir;

    #[test]
    fn test_writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("dir").join("out.csv");

        CsvSink::new(&path).persist(&sample_records()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 21);
        assert_eq!(lines[0], "country,capital");
        assert_eq!(lines[1], "Argentina,Buenos Aires");
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "old,content\nthat,is\nmuch,longer\n".repeat(50)).unwrap();

        CsvSink::new(&path).persist(&[Record::new("Peru", "Lima")]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "country,capital\nPeru,Lima\n");
    }

    #[test]
    fn test_quotes_only_when_needed() {
        let mut out = Vec::new();
        let records = vec![
            Record::new("Korea, South", "Seoul"),
            Record::new("Italy", "Rome \"Caput Mundi\""),
            Record::new("Peru", "Lima"),
        ];
        write_records(&mut out, &records).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "country,capital\n\"Korea, South\",Seoul\nItaly,\"Rome \"\"Caput Mundi\"\"\"\nPeru,Lima\n"
        );
    }

    #[test]
    fn test_round_trip_through_validator() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut records = sample_records();
        records[11] = Record::new("Korea, South", "Seoul");
        records[9] = Record::new("Italy", "Rome \"Caput Mundi\"");
        CsvSink::new(&path).persist(&records).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        let matrix = validate(&written).unwrap();
        assert_eq!(to_records(&matrix), records);
    }
}
