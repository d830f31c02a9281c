//! Campaign email rendering

use crate::error::{CampaignError, Result};
use std::path::Path;

const BUILTIN_TEMPLATE: &str = include_str!("../../templates/campaign_email.html");

const NAME_PLACEHOLDER: &str = "{{name}}";
const UNSUBSCRIBE_PLACEHOLDER: &str = "{{unsubscribe_url}}";

/// Greeting used when a lead has no name on file
const FALLBACK_NAME: &str = "there";

/// HTML body with `{{name}}` and `{{unsubscribe_url}}` placeholders
#[derive(Debug, Clone)]
pub struct EmailTemplate {
    html: String,
}

impl Default for EmailTemplate {
    fn default() -> Self {
        Self {
            html: BUILTIN_TEMPLATE.to_string(),
        }
    }
}

impl EmailTemplate {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let html = std::fs::read_to_string(path).map_err(|e| {
            CampaignError::Config(format!(
                "Failed to read email template {}: {}",
                path.display(),
                e
            ))
        })?;

        if !html.contains(UNSUBSCRIBE_PLACEHOLDER) {
            log::warn!(
                "Email template {} has no {} placeholder",
                path.display(),
                UNSUBSCRIBE_PLACEHOLDER
            );
        }

        Ok(Self::new(html))
    }

    /// Fill in the greeting and unsubscribe link for one recipient
    pub fn render(&self, name: &str, unsubscribe_url: &str) -> String {
        let name = name.trim();
        let name = if name.is_empty() { FALLBACK_NAME } else { name };

        self.html
            .replace(NAME_PLACEHOLDER, &escape_html(name))
            .replace(UNSUBSCRIBE_PLACEHOLDER, &escape_html(unsubscribe_url))
    }
}

/// Unsubscribe link for `email`, carried as the `email` query parameter
pub fn unsubscribe_link(base_url: &str, email: &str) -> Result<String> {
    let url = reqwest::Url::parse_with_params(base_url, &[("email", email)]).map_err(|e| {
        CampaignError::Config(format!("Invalid UNSUBSCRIBE_URL '{}': {}", base_url, e))
    })?;
    Ok(url.into())
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
