//! Client modules for external services

pub mod activity;
pub mod mailer;
pub mod session;
pub mod token;
pub mod token_store;
pub mod transport;

// Re-export all client types
pub use activity::{find_job_type, ActivityEntry, ActivityLogged, ActivityReporter};
pub use mailer::{Mailer, OutgoingEmail, SmtpMailer};
pub use session::{ApiEndpoints, SessionManager};
pub use token::{BearerToken, Expiry};
pub use token_store::{EnvFileTokenStore, TokenStore};
pub use transport::{ApiResponse, ApiTransport, HttpTransport};
