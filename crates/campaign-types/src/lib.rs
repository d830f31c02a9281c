//! Shared types for the lead campaign tools

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sender mailbox credentials as stored in the accounts JSON file
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct SenderAccount {
    #[serde(rename = "EMAIL_USER")]
    pub user: String,

    #[serde(rename = "EMAIL_PASS")]
    pub password: String,
}

impl fmt::Debug for SenderAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenderAccount")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// One row of the lead sheet, reduced to the fields the campaign uses
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Lead {
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub linkedin_id: Option<String>,
    pub company_name: Option<String>,
    pub location: Option<String>,
}

impl Lead {
    /// Addresses without an `@` are never handed to SMTP
    pub fn has_valid_email(&self) -> bool {
        !self.email.is_empty() && self.email.contains('@')
    }
}

/// Job type entry as returned by `GET /job-types`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobType {
    #[serde(default)]
    pub unique_id: Option<String>,
    pub id: i64,
}

/// Payload for `POST /job_activity_logs`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityRecord {
    #[serde(rename = "job_id")]
    pub job_type_id: i64,
    pub employee_id: i64,
    pub activity_count: u32,
    pub candidate_id: Option<i64>,
    pub notes: String,
    pub activity_date: NaiveDate,
}

/// Payload for `POST /vendor_contact`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VendorContact {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin_id: Option<String>,
    pub company_name: Option<String>,
    pub location: Option<String>,
    pub source_email: Option<String>,
}

impl VendorContact {
    /// Build a contact record for a lead that was emailed from `source_email`
    pub fn from_lead(lead: &Lead, source_email: &str) -> Self {
        let full_name = if lead.full_name.is_empty() {
            "Unknown".to_string()
        } else {
            lead.full_name.clone()
        };

        Self {
            full_name,
            email: Some(lead.email.clone()).filter(|e| !e.is_empty()),
            phone: lead.phone.clone(),
            linkedin_id: lead.linkedin_id.clone(),
            company_name: lead.company_name.clone(),
            location: lead.location.clone(),
            source_email: Some(source_email.to_string()),
        }
    }
}

/// Outcome of one batch run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CampaignSummary {
    /// Pending leads picked for this run (after the batch limit)
    pub selected: usize,
    pub sent: usize,
    pub failed: usize,
    /// Leads skipped because their address is unusable
    pub skipped: usize,
    pub csv_saved: bool,
    /// `None` when nothing was sent and no activity was reported
    pub activity_logged: Option<bool>,
}

impl fmt::Display for CampaignSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sent == 0 {
            return write!(f, "No emails were sent successfully");
        }

        write!(f, "Campaign complete: {} emails sent successfully", self.sent)?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        if self.activity_logged == Some(false) {
            write!(f, ", but activity logging failed")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_account_uses_env_style_keys() {
        let json = r#"[{"EMAIL_USER": "a@example.com", "EMAIL_PASS": "secret"}]"#;
        let accounts: Vec<SenderAccount> = serde_json::from_str(json).unwrap();

        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].user, "a@example.com");
        assert!(!format!("{:?}", accounts[0]).contains("secret"));
    }

    #[test]
    fn test_activity_record_wire_format() {
        let record = ActivityRecord {
            job_type_id: 7,
            employee_id: 411,
            activity_count: 5,
            candidate_id: None,
            notes: "batch done".to_string(),
            activity_date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["job_id"], 7);
        assert_eq!(value["candidate_id"], serde_json::Value::Null);
        assert_eq!(value["activity_date"], "2026-01-10");
    }

    #[test]
    fn test_job_type_tolerates_missing_unique_id() {
        let json = r#"[{"id": 1}, {"id": 2, "unique_id": "x", "name": "X"}]"#;
        let job_types: Vec<JobType> = serde_json::from_str(json).unwrap();

        assert_eq!(job_types[0].unique_id, None);
        assert_eq!(job_types[1].unique_id.as_deref(), Some("x"));
    }

    #[test]
    fn test_vendor_contact_defaults_name() {
        let lead = Lead {
            email: "lead@example.com".to_string(),
            ..Default::default()
        };

        let contact = VendorContact::from_lead(&lead, "sender@example.com");
        assert_eq!(contact.full_name, "Unknown");
        assert_eq!(contact.source_email.as_deref(), Some("sender@example.com"));
    }

    #[test]
    fn test_lead_email_validation() {
        let mut lead = Lead::default();
        assert!(!lead.has_valid_email());

        lead.email = "not-an-address".to_string();
        assert!(!lead.has_valid_email());

        lead.email = "ok@example.com".to_string();
        assert!(lead.has_valid_email());
    }

    #[test]
    fn test_summary_final_line() {
        let mut summary = CampaignSummary::default();
        assert_eq!(summary.to_string(), "No emails were sent successfully");

        summary.sent = 3;
        summary.activity_logged = Some(true);
        assert_eq!(summary.to_string(), "Campaign complete: 3 emails sent successfully");

        summary.activity_logged = Some(false);
        assert!(summary.to_string().ends_with("but activity logging failed"));
    }
}
