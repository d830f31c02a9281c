//! Activity API client: job-type lookup, activity logging, vendor contacts
//!
//! Every call goes through [`SessionManager::with_retry_on_expiry`]. The
//! public `bool` operations never return errors; failures end up in the log.

use crate::clients::session::SessionManager;
use crate::config::ActivityApiConfig;
use crate::constants::NO_CANDIDATE;
use crate::error::{CampaignError, Result};
use campaign_types::{ActivityRecord, JobType, VendorContact};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const JOB_TYPES_PATH: &str = "job-types";
const ACTIVITY_LOGS_PATH: &str = "job_activity_logs";
const VENDOR_CONTACT_PATH: &str = "vendor_contact";

/// One activity to report
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    pub count: u32,
    pub notes: String,
    /// `None` and `Some(0)` both mean "no candidate"
    pub candidate_id: Option<i64>,
    /// Defaults to today's local date
    pub date: Option<NaiveDate>,
}

impl ActivityEntry {
    pub fn new(count: u32, notes: impl Into<String>) -> Self {
        Self {
            count,
            notes: notes.into(),
            candidate_id: None,
            date: None,
        }
    }

    pub fn with_candidate(mut self, candidate_id: i64) -> Self {
        self.candidate_id = Some(candidate_id);
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// Server acknowledgement of a logged activity
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityLogged {
    /// Server-assigned record id, when the response carried one
    pub record_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CreatedRecord {
    #[serde(default)]
    id: Option<Value>,
}

/// Decode a `/job-types` listing entry by entry; entries without an
/// integer `id` or with a non-string `unique_id` are skipped
pub fn parse_job_types(entries: Vec<Value>) -> Vec<JobType> {
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<JobType>(entry) {
            Ok(job_type) => Some(job_type),
            Err(e) => {
                log::debug!("Skipping malformed job type entry: {}", e);
                None
            }
        })
        .collect()
}

/// First job type whose `unique_id` matches
pub fn find_job_type(job_types: &[JobType], logical_name: &str) -> Option<i64> {
    job_types
        .iter()
        .find(|job_type| job_type.unique_id.as_deref() == Some(logical_name))
        .map(|job_type| job_type.id)
}

pub struct ActivityReporter {
    session: Arc<SessionManager>,
    job_unique_id: String,
    employee_id: i64,
    default_candidate_id: i64,
}

impl ActivityReporter {
    pub fn new(session: Arc<SessionManager>, config: &ActivityApiConfig) -> Self {
        Self {
            session,
            job_unique_id: config.job_unique_id.clone(),
            employee_id: config.employee_id,
            default_candidate_id: config.default_candidate_id,
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Resolve a logical job identifier to its numeric id
    pub async fn resolve_job_type(&self, logical_name: &str) -> Result<i64> {
        let url = self.session.endpoints().endpoint(JOB_TYPES_PATH);
        let url = url.as_str();
        let transport = self.session.transport();

        let response = self
            .session
            .with_retry_on_expiry(|token| async move { transport.get(url, &token).await })
            .await?;

        let job_types = parse_job_types(response.json::<Vec<Value>>()?);
        find_job_type(&job_types, logical_name).ok_or_else(|| {
            CampaignError::NotFound(format!("job type '{}' not found in database", logical_name))
        })
    }

    /// Build the record for `entry` against a resolved job type
    pub fn build_record(&self, job_type_id: i64, entry: &ActivityEntry) -> ActivityRecord {
        let requested = entry.candidate_id.unwrap_or(NO_CANDIDATE);
        let candidate_id = if requested == NO_CANDIDATE {
            self.default_candidate_id
        } else {
            requested
        };

        ActivityRecord {
            job_type_id,
            employee_id: self.employee_id,
            activity_count: entry.count,
            candidate_id: Some(candidate_id).filter(|id| *id != NO_CANDIDATE),
            notes: entry.notes.clone(),
            activity_date: entry.date.unwrap_or_else(|| Local::now().date_naive()),
        }
    }

    /// Post one activity record, surfacing the failure kind
    pub async fn try_log_activity(&self, entry: &ActivityEntry) -> Result<ActivityLogged> {
        if !self.session.has_token().await {
            return Err(CampaignError::Config("No API token configured".to_string()));
        }

        let job_type_id = self.resolve_job_type(&self.job_unique_id).await.map_err(|e| {
            log::warn!("Could not resolve job type '{}': {}", self.job_unique_id, e);
            e
        })?;

        let record = self.build_record(job_type_id, entry);
        let payload = serde_json::to_value(&record)?;
        let payload = &payload;
        let url = self.session.endpoints().endpoint(ACTIVITY_LOGS_PATH);
        let url = url.as_str();
        let transport = self.session.transport();

        let response = self
            .session
            .with_retry_on_expiry(|token| async move {
                transport.post_json(url, &token, payload).await
            })
            .await?;

        let record_id = response
            .json::<CreatedRecord>()
            .ok()
            .and_then(|created| created.id)
            .and_then(|id| id.as_i64().or_else(|| id.as_str()?.parse().ok()));

        Ok(ActivityLogged { record_id })
    }

    /// Log an activity; `true` on success, `false` (with a log line) otherwise
    pub async fn log_activity(&self, entry: ActivityEntry) -> bool {
        match self.try_log_activity(&entry).await {
            Ok(logged) => {
                let id = logged
                    .record_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "N/A".to_string());
                log::info!(
                    "Activity logged: {} emails sent (Activity ID: {})",
                    entry.count,
                    id
                );
                true
            }
            Err(e) => {
                log::error!("Cannot log activity: {}", e);
                false
            }
        }
    }

    /// Record a contacted lead as a vendor contact
    pub async fn save_vendor_contact(&self, contact: &VendorContact) -> bool {
        match self.try_save_vendor_contact(contact).await {
            Ok(()) => {
                log::debug!("Saved vendor contact {}", contact.full_name);
                true
            }
            Err(e) => {
                log::error!("Failed to save vendor contact: {}", e);
                false
            }
        }
    }

    async fn try_save_vendor_contact(&self, contact: &VendorContact) -> Result<()> {
        if !self.session.has_token().await {
            return Err(CampaignError::Config("No API token configured".to_string()));
        }

        let payload = serde_json::to_value(contact)?;
        let payload = &payload;
        let url = self.session.endpoints().endpoint(VENDOR_CONTACT_PATH);
        let url = url.as_str();
        let transport = self.session.transport();

        self.session
            .with_retry_on_expiry(|token| async move {
                transport.post_json(url, &token, payload).await
            })
            .await?;
        Ok(())
    }
}
