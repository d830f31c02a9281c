//! HTTP transport used by the activity API clients
//!
//! The session and reporter only ever talk to the API through
//! [`ApiTransport`], so tests can swap in a fake and count requests.

use crate::error::{CampaignError, Result};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Status and raw body of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json_body(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED.as_u16()
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Server error body for log lines: pretty JSON when possible, raw text otherwise
    pub fn error_detail(&self) -> String {
        match serde_json::from_str::<Value>(&self.body) {
            Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| self.body.clone()),
            Err(_) if self.body.trim().is_empty() => "<empty body>".to_string(),
            Err(_) => self.body.clone(),
        }
    }

    /// Turn a non-2xx status into the matching error
    pub fn into_checked(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else if self.is_unauthorized() {
            Err(CampaignError::Auth(format!(
                "request rejected as unauthorized: {}",
                self.error_detail()
            )))
        } else {
            Err(CampaignError::Server {
                status: self.status,
                body: self.error_detail(),
            })
        }
    }
}

/// Request primitives needed by the activity API
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// `application/x-www-form-urlencoded` POST without authentication
    async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<ApiResponse>;

    /// Bearer-authenticated GET
    async fn get(&self, url: &str, bearer: &str) -> Result<ApiResponse>;

    /// Bearer-authenticated JSON POST
    async fn post_json(&self, url: &str, bearer: &str, body: &Value) -> Result<ApiResponse>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    http_client: HttpClient,
}

impl HttpTransport {
    pub fn new(timeout_seconds: u64) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| CampaignError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }

    async fn read(response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ApiResponse { status, body })
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<ApiResponse> {
        let response = self.http_client.post(url).form(fields).send().await?;
        Self::read(response).await
    }

    async fn get(&self, url: &str, bearer: &str) -> Result<ApiResponse> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(bearer)
            .send()
            .await?;
        Self::read(response).await
    }

    async fn post_json(&self, url: &str, bearer: &str, body: &Value) -> Result<ApiResponse> {
        let response = self
            .http_client
            .post(url)
            .bearer_auth(bearer)
            .json(body)
            .send()
            .await?;
        Self::read(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_classification() {
        assert!(ApiResponse::new(200, "").is_success());
        assert!(ApiResponse::new(201, "").is_success());
        assert!(!ApiResponse::new(401, "").is_success());
        assert!(ApiResponse::new(401, "").is_unauthorized());
        assert!(!ApiResponse::new(403, "").is_unauthorized());
    }

    #[test]
    fn test_into_checked_maps_statuses() {
        assert!(ApiResponse::new(200, "{}").into_checked().is_ok());

        let err = ApiResponse::new(401, "").into_checked().unwrap_err();
        assert!(err.is_auth());

        match ApiResponse::new(422, r#"{"detail":"bad date"}"#).into_checked() {
            Err(CampaignError::Server { status, body }) => {
                assert_eq!(status, 422);
                assert!(body.contains("bad date"));
            }
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_detail_falls_back_to_text() {
        assert_eq!(ApiResponse::new(500, "boom").error_detail(), "boom");
        assert_eq!(ApiResponse::new(500, "  ").error_detail(), "<empty body>");

        let detail = ApiResponse::json_body(400, &json!({"detail": "x"})).error_detail();
        assert!(detail.contains("\"detail\": \"x\""));
    }
}
