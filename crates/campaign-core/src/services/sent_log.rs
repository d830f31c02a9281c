//! Append-only CSV record of every delivered email

use crate::error::Result;
use chrono::{Local, NaiveDateTime};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

pub const SENT_LOG_HEADER: [&str; 4] = ["Sender Email", "Recipient Email", "Name", "Timestamp"];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct SentLog {
    path: PathBuf,
}

impl SentLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, sender: &str, recipient: &str, name: &str) -> Result<()> {
        self.record_at(sender, recipient, name, Local::now().naive_local())
    }

    /// Append one row, writing the header first when the file is empty
    pub fn record_at(
        &self,
        sender: &str,
        recipient: &str,
        name: &str,
        sent_at: NaiveDateTime,
    ) -> Result<()> {
        crate::paths::ensure_parent_dir(&self.path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let is_empty = file.metadata()?.len() == 0;

        let mut writer = csv::Writer::from_writer(file);
        if is_empty {
            writer.write_record(SENT_LOG_HEADER)?;
        }
        let timestamp = sent_at.format(TIMESTAMP_FORMAT).to_string();
        writer.write_record([sender, recipient, name, timestamp.as_str()])?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 10)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_header_written_once() {
        let dir = TempDir::new().unwrap();
        let log = SentLog::new(dir.path().join("logs").join("sent_emails.csv"));

        log.record_at("s@example.com", "a@example.com", "Ada", at(9, 0, 0)).unwrap();
        log.record_at("s@example.com", "b@example.com", "Smith, Bob", at(9, 0, 2)).unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(
            content,
            "Sender Email,Recipient Email,Name,Timestamp\n\
             s@example.com,a@example.com,Ada,2026-01-10 09:00:00\n\
             s@example.com,b@example.com,\"Smith, Bob\",2026-01-10 09:00:02\n"
        );
    }

    #[test]
    fn test_existing_log_is_appended() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sent.csv");
        std::fs::write(&path, "Sender Email,Recipient Email,Name,Timestamp\n").unwrap();

        SentLog::new(&path)
            .record_at("s@example.com", "a@example.com", "", at(10, 0, 0))
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("Sender Email").count(), 1);
        assert!(content.ends_with("s@example.com,a@example.com,,2026-01-10 10:00:00\n"));
    }
}
