//! Campaign Core Library
//!
//! Business logic for the leads mass email campaign: configuration, the
//! authenticated activity API session, SMTP delivery and the batch runner.

pub mod clients;
pub mod config;
pub mod constants;
pub mod error;
pub mod paths;
pub mod services;

// Re-export main types for easy access
pub use config::CampaignConfig;
pub use error::{CampaignError, Result};

// Re-export all client types
pub use clients::{
    ActivityEntry,
    ActivityReporter,
    EnvFileTokenStore,
    HttpTransport,
    SessionManager,
    SmtpMailer,
};

// Re-export service types
pub use services::{BatchRunner, EmailTemplate, SentLog};
