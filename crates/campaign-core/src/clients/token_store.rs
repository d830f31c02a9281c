//! Token persistence so the next run can start pre-authenticated

use crate::constants::TOKEN_ENV_KEY;
use crate::error::{CampaignError, Result};
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Durable home for a freshly issued bearer token
pub trait TokenStore: Send + Sync {
    fn persist(&self, token: &str) -> Result<()>;
}

/// Keeps the token as a `KEY=value` line in an env file
pub struct EnvFileTokenStore {
    path: PathBuf,
    key: String,
}

impl EnvFileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_key(path, TOKEN_ENV_KEY)
    }

    pub fn with_key(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the existing assignment in place, or append one
    fn apply(&self, content: &str, token: &str) -> Result<String> {
        let pattern = Regex::new(&format!(r"(?m)^{}=[^\r\n]*", regex::escape(&self.key)))
            .map_err(|e| CampaignError::Validation(format!("Invalid env key pattern: {}", e)))?;
        let assignment = format!("{}={}", self.key, token);

        if pattern.is_match(content) {
            return Ok(pattern
                .replace_all(content, regex::NoExpand(&assignment))
                .into_owned());
        }

        let mut updated = content.to_string();
        if !updated.is_empty() && !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push_str(&assignment);
        updated.push('\n');
        Ok(updated)
    }
}

impl TokenStore for EnvFileTokenStore {
    fn persist(&self, token: &str) -> Result<()> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let updated = self.apply(&content, token)?;

        // Temp file in the same directory so the rename stays on one filesystem
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(updated.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| CampaignError::Io(e.error))?;

        log::debug!("Stored {} in {}", self.key, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_replaces_existing_assignment_in_place() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "WBL_API_URL=http://localhost:8000\nWBL_API_TOKEN=old-token\nEMPLOYEE_ID=411\n",
        )
        .unwrap();

        EnvFileTokenStore::new(&path).persist("new-token").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "WBL_API_URL=http://localhost:8000\nWBL_API_TOKEN=new-token\nEMPLOYEE_ID=411\n"
        );
    }

    #[test]
    fn test_appends_when_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "WBL_API_URL=http://localhost:8000").unwrap();

        EnvFileTokenStore::new(&path).persist("abc").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "WBL_API_URL=http://localhost:8000\nWBL_API_TOKEN=abc\n");
    }

    #[test]
    fn test_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fresh.env");

        EnvFileTokenStore::new(&path).persist("abc").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "WBL_API_TOKEN=abc\n");
    }

    #[test]
    fn test_empty_assignment_and_similar_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "OLD_WBL_API_TOKEN=keep\nWBL_API_TOKEN=\n").unwrap();

        EnvFileTokenStore::new(&path).persist("t$1").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "OLD_WBL_API_TOKEN=keep\nWBL_API_TOKEN=t$1\n");
    }

    #[test]
    fn test_crlf_line_endings_are_kept() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "WBL_API_TOKEN=old\r\nEMPLOYEE_ID=411\r\n").unwrap();

        EnvFileTokenStore::new(&path).persist("new").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "WBL_API_TOKEN=new\r\nEMPLOYEE_ID=411\r\n");
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join(".env");

        assert!(EnvFileTokenStore::new(&path).persist("abc").is_err());
    }
}
