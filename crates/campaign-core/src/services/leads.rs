//! Lead sheet: the CSV the campaign reads from and writes sent flags back to
//!
//! Rows are kept as raw strings so every column survives the rewrite, even
//! ones the campaign never looks at.

use crate::error::{CampaignError, Result};
use campaign_types::Lead;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub const EMAIL_COLUMN: &str = "email";
pub const FULL_NAME_COLUMN: &str = "full_name";
pub const PHONE_COLUMN: &str = "phone";
pub const LINKEDIN_COLUMN: &str = "linkedin_id";
pub const COMPANY_COLUMN: &str = "company_name";
pub const LOCATION_COLUMN: &str = "location";
pub const UNSUBSCRIBE_COLUMN: &str = "massemail_unsubscribe";
pub const EMAIL_SENT_COLUMN: &str = "massemail_email_sent";

const FLAG_SET: &str = "1";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadSheet {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl LeadSheet {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CampaignError::NotFound(format!("lead sheet {} not found", path.display()))
            } else {
                CampaignError::Io(e)
            }
        })?;

        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let mut row: Vec<String> = record?.iter().map(str::to_string).collect();
            row.resize(headers.len().max(row.len()), String::new());
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell value; missing columns read as `None`
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column(column)?;
        self.rows.get(row)?.get(index).map(String::as_str)
    }

    /// Neither unsubscribed nor already sent
    pub fn is_pending(&self, row: usize) -> bool {
        let flag = |column| self.value(row, column).unwrap_or("0") == FLAG_SET;
        !flag(UNSUBSCRIBE_COLUMN) && !flag(EMAIL_SENT_COLUMN)
    }

    /// Indices of the first `limit` pending rows, in file order
    pub fn pending(&self, limit: usize) -> Vec<usize> {
        (0..self.rows.len())
            .filter(|&row| self.is_pending(row))
            .take(limit)
            .collect()
    }

    pub fn lead(&self, row: usize) -> Lead {
        let text = |column| self.value(row, column).unwrap_or("").trim().to_string();
        let optional = |column| {
            self.value(row, column)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Lead {
            email: text(EMAIL_COLUMN),
            full_name: text(FULL_NAME_COLUMN),
            phone: optional(PHONE_COLUMN),
            linkedin_id: optional(LINKEDIN_COLUMN),
            company_name: optional(COMPANY_COLUMN),
            location: optional(LOCATION_COLUMN),
        }
    }

    /// Flag a row as sent, adding the column when the sheet lacks it
    pub fn mark_sent(&mut self, row: usize) {
        let index = match self.column(EMAIL_SENT_COLUMN) {
            Some(index) => index,
            None => {
                self.headers.push(EMAIL_SENT_COLUMN.to_string());
                let width = self.headers.len();
                for r in &mut self.rows {
                    r.resize(width, String::new());
                }
                width - 1
            }
        };

        if let Some(r) = self.rows.get_mut(row) {
            if r.len() <= index {
                r.resize(index + 1, String::new());
            }
            r[index] = FLAG_SET.to_string();
        }
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Rewrite the sheet through a temp file in the same directory
    pub fn save_atomic<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        self.write_to(tmp.as_file_mut())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| CampaignError::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SHEET: &str = "\
email,full_name,company_name,massemail_unsubscribe,massemail_email_sent,notes
a@example.com,Ada,Acme,0,0,first
b@example.com,Bob,,1,0,unsubscribed
c@example.com,Cy,,0,1,already sent
d@example.com, Dee ,,,,blank flags
";

    fn sheet() -> LeadSheet {
        LeadSheet::from_reader(SHEET.as_bytes()).unwrap()
    }

    #[test]
    fn test_pending_filters_flags() {
        let sheet = sheet();
        assert_eq!(sheet.len(), 4);
        assert_eq!(sheet.pending(800), vec![0, 3]);
        assert_eq!(sheet.pending(1), vec![0]);
    }

    #[test]
    fn test_missing_flag_columns_read_as_not_set() {
        let sheet = LeadSheet::from_reader("email,full_name\nx@example.com,X\n".as_bytes()).unwrap();
        assert_eq!(sheet.pending(10), vec![0]);
    }

    #[test]
    fn test_lead_fields_are_trimmed() {
        let lead = sheet().lead(3);
        assert_eq!(lead.email, "d@example.com");
        assert_eq!(lead.full_name, "Dee");
        assert_eq!(lead.company_name, None);

        let first = sheet().lead(0);
        assert_eq!(first.company_name.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_mark_sent_adds_missing_column() {
        let mut sheet =
            LeadSheet::from_reader("email,full_name\nx@example.com,X\ny@example.com,Y\n".as_bytes())
                .unwrap();
        sheet.mark_sent(1);

        let mut out = Vec::new();
        sheet.write_to(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "email,full_name,massemail_email_sent\nx@example.com,X,\ny@example.com,Y,1\n"
        );
        assert_eq!(sheet.pending(10), vec![0]);
    }

    #[test]
    fn test_save_atomic_preserves_other_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("leads.csv");
        std::fs::write(&path, SHEET).unwrap();

        let mut sheet = LeadSheet::load(&path).unwrap();
        sheet.mark_sent(0);
        sheet.save_atomic(&path).unwrap();

        let reloaded = LeadSheet::load(&path).unwrap();
        assert_eq!(reloaded.value(0, EMAIL_SENT_COLUMN), Some("1"));
        assert_eq!(reloaded.value(0, "notes"), Some("first"));
        assert_eq!(reloaded.pending(800), vec![3]);
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let err = LeadSheet::load("/nonexistent/leads.csv").unwrap_err();
        assert!(matches!(err, CampaignError::NotFound(_)));
    }
}
