//! Error types for the campaign system

use thiserror::Error;

/// Main error type for all campaign operations
#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Mail delivery failed: {0}")]
    Mail(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl CampaignError {
    /// True for the failures that a fresh token could fix
    pub fn is_auth(&self) -> bool {
        matches!(self, CampaignError::Auth(_))
    }
}

/// Result type for campaign operations
pub type Result<T> = std::result::Result<T, CampaignError>;
