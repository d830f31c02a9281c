//! Service modules for the campaign batch

pub mod batch_runner;
pub mod leads;
pub mod rotation;
pub mod sent_log;
pub mod template;

// Re-export service types
pub use batch_runner::BatchRunner;
pub use leads::LeadSheet;
pub use rotation::AccountRotator;
pub use sent_log::SentLog;
pub use template::EmailTemplate;
