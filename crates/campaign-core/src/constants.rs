/// Campaign configuration constants

/// Logical job identifier reported to the activity API
pub const DEFAULT_JOB_UNIQUE_ID: &str = "leads_mass_email_sender";

/// Employee the activity is booked against
pub const DEFAULT_EMPLOYEE_ID: i64 = 411;

/// Candidate substituted when the caller passes no candidate
pub const DEFAULT_CANDIDATE_ID: i64 = 570;

/// Candidate id meaning "no candidate"
pub const NO_CANDIDATE: i64 = 0;

/// Timeout for activity API calls
pub const DEFAULT_API_TIMEOUT_SECONDS: u64 = 30;

/// Maximum leads processed per run
pub const DEFAULT_BATCH_LIMIT: usize = 800;

/// Sends per sender account before rotating to the next one
pub const DEFAULT_MAX_EMAILS_PER_ACCOUNT: u32 = 100;

pub const DEFAULT_EMAIL_DELAY_SECONDS: u64 = 2;

pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_SMTP_TIMEOUT_SECONDS: u64 = 30;

pub const DEFAULT_SENDER_DISPLAY_NAME: &str = "Whitebox Learning";
pub const DEFAULT_EMAIL_SUBJECT: &str = "New Batch Alert! Join our AI & ML Training Program!";
pub const DEFAULT_UNSUBSCRIBE_URL: &str = "https://www.whitebox-learning.com/leads_unsubscribe";

/// Key of the bearer token assignment in the env file
pub const TOKEN_ENV_KEY: &str = "WBL_API_TOKEN";
