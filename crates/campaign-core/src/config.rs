//! Configuration management for the campaign system
//!
//! All settings come from environment-style keys (usually a `.env` file
//! loaded by the runner). Sender mailbox credentials live in a separate
//! JSON file referenced by `EMAIL_ACCOUNTS_FILE`.

use crate::constants::*;
use crate::error::{CampaignError, Result};
use campaign_types::SenderAccount;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Raw configuration structure matching the environment keys exactly
/// (the `config` crate lowercases them)
#[derive(Debug, Deserialize)]
struct RawEnv {
    #[serde(default)]
    wbl_api_url: String,
    wbl_api_token: Option<String>,
    wbl_email: Option<String>,
    wbl_password: Option<String>,

    #[serde(default = "default_job_unique_id")]
    job_unique_id: String,
    #[serde(default = "default_employee_id")]
    employee_id: i64,
    #[serde(default = "default_candidate_id")]
    selected_candidate_id: i64,
    #[serde(default = "default_api_timeout")]
    api_timeout_seconds: u64,

    #[serde(default)]
    smtp_server: String,
    #[serde(default = "default_smtp_port")]
    smtp_port: u16,
    #[serde(default = "default_smtp_timeout")]
    smtp_timeout_seconds: u64,
    reply_to_email: Option<String>,
    #[serde(default = "default_sender_display_name")]
    sender_display_name: String,
    email_accounts_file: Option<String>,

    #[serde(default = "default_batch_limit")]
    batch_limit: usize,
    #[serde(default = "default_email_delay")]
    email_delay_seconds: u64,
    #[serde(default = "default_max_emails_per_account")]
    max_emails_per_account: u32,
    #[serde(default)]
    record_vendor_contacts: bool,

    #[serde(default = "default_email_subject")]
    email_subject: String,
    email_template_file: Option<String>,
    #[serde(default = "default_unsubscribe_url")]
    unsubscribe_url: String,
}

/// Login identifier and secret for the activity API
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub identifier: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"***")
            .finish()
    }
}

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct CampaignConfig {
    pub api: ActivityApiConfig,
    pub smtp: SmtpConfig,
    pub batch: BatchConfig,
    pub email: EmailContentConfig,
}

#[derive(Debug, Clone)]
pub struct ActivityApiConfig {
    pub base_url: String,
    /// Bootstrap token; replaced by login when missing or expired
    pub bearer_token: Option<String>,
    pub credentials: Option<Credentials>,
    pub job_unique_id: String,
    pub employee_id: i64,
    pub default_candidate_id: i64,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub timeout_seconds: u64,
    pub reply_to: Option<String>,
    pub sender_display_name: String,
    pub accounts_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub limit: usize,
    pub delay_seconds: u64,
    pub max_emails_per_account: u32,
    pub record_vendor_contacts: bool,
}

#[derive(Debug, Clone)]
pub struct EmailContentConfig {
    pub subject: String,
    pub template_file: Option<PathBuf>,
    pub unsubscribe_url: String,
}

// Default functions
fn default_job_unique_id() -> String {
    DEFAULT_JOB_UNIQUE_ID.to_string()
}

fn default_employee_id() -> i64 {
    DEFAULT_EMPLOYEE_ID
}

fn default_candidate_id() -> i64 {
    DEFAULT_CANDIDATE_ID
}

fn default_api_timeout() -> u64 {
    DEFAULT_API_TIMEOUT_SECONDS
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

fn default_smtp_timeout() -> u64 {
    DEFAULT_SMTP_TIMEOUT_SECONDS
}

fn default_sender_display_name() -> String {
    DEFAULT_SENDER_DISPLAY_NAME.to_string()
}

fn default_batch_limit() -> usize {
    DEFAULT_BATCH_LIMIT
}

fn default_email_delay() -> u64 {
    DEFAULT_EMAIL_DELAY_SECONDS
}

fn default_max_emails_per_account() -> u32 {
    DEFAULT_MAX_EMAILS_PER_ACCOUNT
}

fn default_email_subject() -> String {
    DEFAULT_EMAIL_SUBJECT.to_string()
}

fn default_unsubscribe_url() -> String {
    DEFAULT_UNSUBSCRIBE_URL.to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CampaignConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_source(config::Environment::default())
    }

    /// Load configuration from an explicit key/value map (keys as in the env file)
    pub fn from_map<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let source: config::Map<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        Self::from_source(config::Environment::default().source(Some(source)))
    }

    fn from_source(env: config::Environment) -> Result<Self> {
        let raw: RawEnv = config::Config::builder()
            .add_source(env.ignore_empty(true))
            .build()
            .and_then(|c| c.try_deserialize::<RawEnv>())
            .map_err(|e| CampaignError::Config(format!("Failed to read environment: {}", e)))?;

        Ok(Self::from_raw(raw))
    }

    /// Convert raw env values into typed sections
    fn from_raw(raw: RawEnv) -> Self {
        let credentials = match (non_empty(raw.wbl_email), non_empty(raw.wbl_password)) {
            (Some(identifier), Some(secret)) => Some(Credentials { identifier, secret }),
            _ => None,
        };

        Self {
            api: ActivityApiConfig {
                base_url: raw.wbl_api_url.trim().to_string(),
                bearer_token: non_empty(raw.wbl_api_token),
                credentials,
                job_unique_id: raw.job_unique_id,
                employee_id: raw.employee_id,
                default_candidate_id: raw.selected_candidate_id,
                timeout_seconds: raw.api_timeout_seconds,
            },
            smtp: SmtpConfig {
                host: raw.smtp_server.trim().to_string(),
                port: raw.smtp_port,
                timeout_seconds: raw.smtp_timeout_seconds,
                reply_to: non_empty(raw.reply_to_email),
                sender_display_name: raw.sender_display_name,
                accounts_file: non_empty(raw.email_accounts_file).map(PathBuf::from),
            },
            batch: BatchConfig {
                limit: raw.batch_limit,
                delay_seconds: raw.email_delay_seconds,
                max_emails_per_account: raw.max_emails_per_account,
                record_vendor_contacts: raw.record_vendor_contacts,
            },
            email: EmailContentConfig {
                subject: raw.email_subject,
                template_file: non_empty(raw.email_template_file).map(PathBuf::from),
                unsubscribe_url: raw.unsubscribe_url,
            },
        }
    }

    /// Validate everything a full sending run needs
    pub fn validate(&self) -> Result<()> {
        self.api.validate()?;

        if self.smtp.host.is_empty() {
            return Err(CampaignError::Config("SMTP_SERVER is required".to_string()));
        }

        if self.smtp.accounts_file.is_none() {
            return Err(CampaignError::Config("EMAIL_ACCOUNTS_FILE is required".to_string()));
        }

        if self.batch.limit == 0 {
            return Err(CampaignError::Config("BATCH_LIMIT must be at least 1".to_string()));
        }

        if self.batch.max_emails_per_account == 0 {
            return Err(CampaignError::Config(
                "MAX_EMAILS_PER_ACCOUNT must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl ActivityApiConfig {
    /// Missing credentials are not an error here; the session degrades instead
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(CampaignError::Config("WBL_API_URL is required".to_string()));
        }

        reqwest::Url::parse(&self.base_url)
            .map_err(|e| CampaignError::Config(format!("WBL_API_URL is not a valid URL: {}", e)))?;

        Ok(())
    }
}

/// Load sender accounts from a JSON file
pub fn load_sender_accounts<P: AsRef<Path>>(path: P) -> Result<Vec<SenderAccount>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        CampaignError::Config(format!("Failed to read accounts file {}: {}", path.display(), e))
    })?;

    parse_sender_accounts(&content)
}

/// Parse sender accounts from a JSON string
pub fn parse_sender_accounts(json: &str) -> Result<Vec<SenderAccount>> {
    let accounts: Vec<SenderAccount> = serde_json::from_str(json)
        .map_err(|e| CampaignError::Config(format!("Failed to parse accounts file: {}", e)))?;

    if accounts.is_empty() {
        return Err(CampaignError::Config(
            "At least one sender account is required".to_string(),
        ));
    }

    if let Some(account) = accounts.iter().find(|a| a.user.is_empty() || a.password.is_empty()) {
        return Err(CampaignError::Config(format!(
            "Sender account '{}' is missing EMAIL_USER or EMAIL_PASS",
            account.user
        )));
    }

    Ok(accounts)
}
