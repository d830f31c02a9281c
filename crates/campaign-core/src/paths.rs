/// Path constants and utilities for a campaign run
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

// Static storage for configurable data root
static DATA_ROOT: OnceCell<String> = OnceCell::new();

// Static storage for configurable logs root
static LOGS_ROOT: OnceCell<String> = OnceCell::new();

// Default root constants (relative to the working directory)
const DEFAULT_DATA_ROOT: &str = ".";
const DEFAULT_LOGS_ROOT: &str = "logs";

// File names (relative to roots)
pub const ENV_FILE_NAME: &str = ".env";
pub const LEADS_FILE_NAME: &str = "leads_emails.csv";
pub const SENT_LOG_FILE_NAME: &str = "sent_emails.csv";
pub const ACTIVITY_LOG_FILE_NAME: &str = "activity_logger.log";

/// Initialize the data root directory. Can only be called once.
/// If not called, the working directory is used.
pub fn init_data_root(path: String) -> Result<(), String> {
    DATA_ROOT.set(path).map_err(|_| "Data root already initialized".to_string())
}

/// Initialize the logs root directory. Can only be called once.
/// If not called, `logs` below the working directory is used.
pub fn init_logs_root(path: String) -> Result<(), String> {
    LOGS_ROOT.set(path).map_err(|_| "Logs root already initialized".to_string())
}

fn get_data_root() -> &'static str {
    DATA_ROOT.get().map(|s| s.as_str()).unwrap_or(DEFAULT_DATA_ROOT)
}

fn get_logs_root() -> &'static str {
    LOGS_ROOT.get().map(|s| s.as_str()).unwrap_or(DEFAULT_LOGS_ROOT)
}

// Path builder functions
pub fn data_root() -> PathBuf {
    PathBuf::from(get_data_root())
}

pub fn env_file() -> PathBuf {
    data_root().join(ENV_FILE_NAME)
}

pub fn leads_file() -> PathBuf {
    data_root().join(LEADS_FILE_NAME)
}

pub fn logs_root() -> PathBuf {
    PathBuf::from(get_logs_root())
}

pub fn sent_log_file() -> PathBuf {
    logs_root().join(SENT_LOG_FILE_NAME)
}

pub fn activity_log_file() -> PathBuf {
    logs_root().join(ACTIVITY_LOG_FILE_NAME)
}

/// Create the parent directory of `path` if it has one
pub fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
