//! Authenticated session for the activity API
//!
//! Owns the bearer token for one run: acquires it by credential login when
//! missing or expired, persists newly issued tokens, and wraps outbound
//! calls so that a 401 triggers exactly one refresh followed by exactly
//! one retry.
//!
//! Refreshes are single-flight. Callers that observe the same rejected
//! token queue on `refresh_lock`; the first one logs in and the rest find
//! the token already replaced and reuse it.

use crate::clients::token::BearerToken;
use crate::clients::token_store::TokenStore;
use crate::clients::transport::{ApiResponse, ApiTransport};
use crate::config::{ActivityApiConfig, Credentials};
use crate::error::{CampaignError, Result};
use serde::Deserialize;
use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Path segment every API endpoint lives under
const API_SEGMENT: &str = "/api";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// URL layout of the activity API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiEndpoints {
    base_url: String,
}

impl ApiEndpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    /// Base URL with the `/api` segment guaranteed
    pub fn api_base(&self) -> String {
        if self.base_url.ends_with(API_SEGMENT) {
            self.base_url.clone()
        } else {
            format!("{}{}", self.base_url, API_SEGMENT)
        }
    }

    /// Authenticated endpoint below the API base
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base(), path.trim_start_matches('/'))
    }

    /// Login lives at `{base}/login`; local development servers mount it
    /// below `/api` instead
    pub fn login_url(&self) -> String {
        if self.is_loopback() && !self.base_url.ends_with(API_SEGMENT) {
            format!("{}{}/login", self.base_url, API_SEGMENT)
        } else {
            format!("{}/login", self.base_url)
        }
    }

    fn is_loopback(&self) -> bool {
        let Ok(url) = reqwest::Url::parse(&self.base_url) else {
            return self.base_url.contains("localhost");
        };

        let Some(host) = url.host_str() else {
            return false;
        };

        host.eq_ignore_ascii_case("localhost")
            || host
                .trim_start_matches('[')
                .trim_end_matches(']')
                .parse::<IpAddr>()
                .map(|ip| ip.is_loopback())
                .unwrap_or(false)
    }
}

pub struct SessionManager {
    endpoints: ApiEndpoints,
    credentials: Option<Credentials>,
    token: RwLock<Option<BearerToken>>,
    refresh_lock: Mutex<()>,
    transport: Arc<dyn ApiTransport>,
    token_store: Arc<dyn TokenStore>,
}

impl SessionManager {
    /// Create a session without touching the network
    pub fn new(
        config: &ActivityApiConfig,
        transport: Arc<dyn ApiTransport>,
        token_store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            endpoints: ApiEndpoints::new(&config.base_url),
            credentials: config.credentials.clone(),
            token: RwLock::new(config.bearer_token.clone().map(BearerToken::new)),
            refresh_lock: Mutex::new(()),
            transport,
            token_store,
        }
    }

    /// Create a session and make sure it holds a usable token.
    ///
    /// Authentication problems are logged, never returned: the session
    /// then fails each authenticated call explicitly.
    pub async fn connect(
        config: &ActivityApiConfig,
        transport: Arc<dyn ApiTransport>,
        token_store: Arc<dyn TokenStore>,
    ) -> Self {
        let session = Self::new(config, transport, token_store);
        if let Err(e) = session.ensure_authenticated().await {
            log::error!("Activity API session is not authenticated: {}", e);
        }
        session
    }

    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }

    pub fn transport(&self) -> &dyn ApiTransport {
        self.transport.as_ref()
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    pub async fn current_token(&self) -> Option<BearerToken> {
        self.token.read().await.clone()
    }

    /// Missing, undecodable and past-`exp` tokens all count as expired
    pub async fn is_token_expired(&self) -> bool {
        match self.token.read().await.as_ref() {
            Some(token) => token.is_expired(),
            None => true,
        }
    }

    /// Log in when the token is missing or expired
    pub async fn ensure_authenticated(&self) -> Result<()> {
        if !self.is_token_expired().await {
            log::debug!("Existing activity API token is still valid");
            return Ok(());
        }

        if self.credentials.is_none() {
            log::warn!(
                "WBL_API_TOKEN not set/expired and WBL_EMAIL/WBL_PASSWORD not configured. \
                 Activity logging will fail."
            );
            // An expired token that cannot be refreshed is never sent
            *self.token.write().await = None;
            return Err(CampaignError::Config(
                "no usable token and no login credentials configured".to_string(),
            ));
        }

        let _guard = self.refresh_lock.lock().await;
        if !self.is_token_expired().await {
            return Ok(());
        }
        self.login().await.map(|_| ())
    }

    /// Exchange the configured credentials for a new bearer token.
    ///
    /// On success the token is persisted (best effort) and replaces the
    /// in-memory one. On any failure the current token is left untouched.
    pub async fn login(&self) -> Result<BearerToken> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            CampaignError::Config("login credentials are not configured".to_string())
        })?;

        let url = self.endpoints.login_url();
        log::info!("Logging in to activity API at {}", url);

        let response = self
            .transport
            .post_form(
                &url,
                &[
                    ("username", credentials.identifier.as_str()),
                    ("password", credentials.secret.as_str()),
                ],
            )
            .await
            .map_err(|e| {
                log::error!("Auto-login failed: {}", e);
                e
            })?;

        if !response.is_success() {
            log::error!(
                "Auto-login rejected with status {}: {}",
                response.status,
                response.error_detail()
            );
            return Err(CampaignError::Auth(format!(
                "login rejected with status {}",
                response.status
            )));
        }

        let issued = response
            .json::<LoginResponse>()
            .map_err(|e| CampaignError::Auth(format!("malformed login response: {}", e)))?
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                log::error!("No access_token in login response");
                CampaignError::Auth("no token issued".to_string())
            })?;

        let token = BearerToken::new(issued);
        if let Err(e) = self.token_store.persist(token.as_str()) {
            log::warn!("Failed to persist new token: {}", e);
        }

        *self.token.write().await = Some(token.clone());
        log::info!("Token obtained and saved: {}", token.redacted());
        Ok(token)
    }

    /// Run an authenticated call, refreshing once and retrying once on 401.
    ///
    /// `call` receives the bearer token to use and performs one request.
    /// Transport failures and non-401 statuses from the first attempt are
    /// returned as-is. The second attempt's outcome is final.
    pub async fn with_retry_on_expiry<F, Fut>(&self, call: F) -> Result<ApiResponse>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<ApiResponse>>,
    {
        let token = self.require_token().await?;

        let first = call(token.as_str().to_string()).await?;
        if !first.is_unauthorized() {
            return first.into_checked();
        }

        log::warn!("Token rejected with 401, attempting refresh...");
        if let Err(e) = self.refresh_after_rejection(&token).await {
            log::error!("Token refresh failed: {}", e);
            return Err(match e {
                CampaignError::Auth(msg) => CampaignError::Auth(msg),
                other => CampaignError::Auth(format!("token refresh failed: {}", other)),
            });
        }

        let fresh = self.require_token().await?;
        call(fresh.as_str().to_string())
            .await
            .and_then(ApiResponse::into_checked)
            .map_err(|e| {
                log::error!("Retry failed after token refresh: {}", e);
                e
            })
    }

    /// Token for the next request; an expired one is refused when no
    /// credentials are configured
    async fn require_token(&self) -> Result<BearerToken> {
        let token = self.current_token().await.ok_or_else(|| {
            CampaignError::Config(
                "no API token configured and login credentials are missing".to_string(),
            )
        })?;

        if self.credentials.is_none() && token.is_expired() {
            return Err(CampaignError::Config(
                "API token has expired and login credentials are missing".to_string(),
            ));
        }
        Ok(token)
    }

    /// Replace `stale` with a fresh token, unless a concurrent caller
    /// already did so while this one waited for the lock
    async fn refresh_after_rejection(&self, stale: &BearerToken) -> Result<()> {
        if self.credentials.is_none() {
            return Err(CampaignError::Auth(
                "cannot refresh token: credentials not configured".to_string(),
            ));
        }

        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.current_token().await {
            if &current != stale && !current.is_expired() {
                log::debug!("Token already refreshed by a concurrent caller");
                return Ok(());
            }
        }

        log::info!("Refreshing expired token...");
        let issued = self.login().await?;
        if issued.is_expired() {
            return Err(CampaignError::Auth(
                "login issued a token that is already expired".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Recording fakes shared by the client tests

    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Method {
        PostForm,
        Get,
        PostJson,
    }

    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub method: Method,
        pub url: String,
        pub bearer: Option<String>,
        pub form: Vec<(String, String)>,
        pub body: Option<serde_json::Value>,
    }

    type Responder = Box<dyn Fn(&RecordedCall) -> Result<ApiResponse> + Send + Sync>;

    /// Transport that answers through a closure and records every request
    pub struct FakeTransport {
        responder: Responder,
        calls: StdMutex<Vec<RecordedCall>>,
    }

    impl FakeTransport {
        pub fn new<F>(responder: F) -> Arc<Self>
        where
            F: Fn(&RecordedCall) -> Result<ApiResponse> + Send + Sync + 'static,
        {
            Arc::new(Self {
                responder: Box::new(responder),
                calls: StdMutex::new(Vec::new()),
            })
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn count(&self, method: Method, url_suffix: &str) -> usize {
            self.calls()
                .iter()
                .filter(|c| c.method == method && c.url.ends_with(url_suffix))
                .count()
        }

        fn answer(&self, call: RecordedCall) -> Result<ApiResponse> {
            let response = (self.responder)(&call);
            self.calls.lock().unwrap().push(call);
            response
        }
    }

    #[async_trait]
    impl ApiTransport for FakeTransport {
        async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<ApiResponse> {
            self.answer(RecordedCall {
                method: Method::PostForm,
                url: url.to_string(),
                bearer: None,
                form: fields
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                body: None,
            })
        }

        async fn get(&self, url: &str, bearer: &str) -> Result<ApiResponse> {
            self.answer(RecordedCall {
                method: Method::Get,
                url: url.to_string(),
                bearer: Some(bearer.to_string()),
                form: Vec::new(),
                body: None,
            })
        }

        async fn post_json(
            &self,
            url: &str,
            bearer: &str,
            body: &serde_json::Value,
        ) -> Result<ApiResponse> {
            self.answer(RecordedCall {
                method: Method::PostJson,
                url: url.to_string(),
                bearer: Some(bearer.to_string()),
                form: Vec::new(),
                body: Some(body.clone()),
            })
        }
    }

    /// Token store that remembers what it was asked to persist
    #[derive(Default)]
    pub struct MemoryTokenStore {
        pub saved: StdMutex<Vec<String>>,
        pub fail: bool,
    }

    impl MemoryTokenStore {
        pub fn failing() -> Arc<Self> {
            Arc::new(Self {
                saved: StdMutex::new(Vec::new()),
                fail: true,
            })
        }

        pub fn saved(&self) -> Vec<String> {
            self.saved.lock().unwrap().clone()
        }
    }

    impl TokenStore for MemoryTokenStore {
        fn persist(&self, token: &str) -> Result<()> {
            if self.fail {
                return Err(CampaignError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only env file",
                )));
            }
            self.saved.lock().unwrap().push(token.to_string());
            Ok(())
        }
    }

    pub fn api_config(token: Option<String>, with_credentials: bool) -> ActivityApiConfig {
        ActivityApiConfig {
            base_url: "http://localhost:8000".to_string(),
            bearer_token: token,
            credentials: with_credentials
                .then(|| Credentials::new("operator@example.com", "hunter2")),
            job_unique_id: "leads_mass_email_sender".to_string(),
            employee_id: 411,
            default_candidate_id: 570,
            timeout_seconds: 5,
        }
    }

    pub fn login_ok(token: &str) -> Result<ApiResponse> {
        Ok(ApiResponse::json_body(
            200,
            &serde_json::json!({ "access_token": token, "token_type": "bearer" }),
        ))
    }
}
