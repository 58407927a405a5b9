use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::Duration;

use taxchat_logging::{debug_line, log_exchange_to_file, log_request, log_response, warn_line};
use taxchat_types::{
    Acknowledgement, ConversationSummary, Credentials, HistoryResponse, IngestReport,
    PasswordResetRequested, ProfileUpdate, ProfileUpdated, Registration, SendMessageRequest,
    SendMessageResponse, SessionCreated, TokenResponse, User,
};

use crate::client::{AuthApi, ChatApi};
use crate::config::normalize_base_url;
use crate::error::{ApiError, ApiResult};

/// reqwest-backed client for the assistant backend
pub struct HttpClient {
    base_url: String,
    client: reqwest::Client,
    token: RwLock<Option<String>>,
    verbose: bool,
    logs_dir: Option<PathBuf>,
}

impl HttpClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Client whose requests give up after `timeout`
    pub fn with_timeout(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            client,
            token: RwLock::new(None),
            verbose: false,
            logs_dir: None,
        }
    }

    /// Print every request and response to the console
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Append every exchange to a dated log file in `logs_dir`
    pub fn log_to(mut self, logs_dir: Option<PathBuf>) -> Self {
        self.logs_dir = logs_dir;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Base URL plus `segments`, each percent-encoded as a single path segment
    fn url(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(format!("{} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<serde_json::Value>,
    ) -> ApiResult<T> {
        let url = self.url(segments)?;
        let token = self.token();

        debug_line(self.verbose, format!("🌐 API call: {} {}", method, url));
        log_request(method.as_str(), url.as_str(), token.as_deref(), body.as_ref(), self.verbose);

        let mut request = self.client
            .request(method.clone(), url.clone())
            .header("Content-Type", "application/json");
        if let Some(token) = &token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        log_response(&status, &text, self.verbose);
        if let Some(logs_dir) = &self.logs_dir {
            if let Err(e) = log_exchange_to_file(logs_dir, method.as_str(), url.as_str(), status.as_u16(), &text) {
                warn_line(format!("HTTP log disabled for this request: {}", e));
            }
        }

        if !status.is_success() {
            return Err(ApiError::Http { status: status.as_u16(), body: text });
        }

        // Some endpoints answer 200 with an empty body
        let text = if text.trim().is_empty() { "{}" } else { text.as_str() };
        Ok(serde_json::from_str(text)?)
    }
}

#[async_trait]
impl ChatApi for HttpClient {
    async fn create_session(&self) -> ApiResult<SessionCreated> {
        self.request(Method::POST, &["new-session"], None).await
    }

    async fn send_message(&self, session_id: &str, message: &str) -> ApiResult<SendMessageResponse> {
        let body = SendMessageRequest {
            session_id: session_id.to_string(),
            message: message.to_string(),
        };
        self.request(Method::POST, &["chat"], Some(serde_json::to_value(body)?)).await
    }

    async fn get_history(&self, session_id: &str) -> ApiResult<HistoryResponse> {
        self.request(Method::GET, &["history", session_id], None).await
    }

    async fn list_conversations(&self) -> ApiResult<Vec<ConversationSummary>> {
        self.request(Method::GET, &["my-conversations"], None).await
    }

    async fn delete_conversation(&self, session_id: &str) -> ApiResult<Acknowledgement> {
        self.request(Method::DELETE, &["conversations", session_id], None).await
    }

    async fn ingest_documents(&self, force_rebuild: bool) -> ApiResult<IngestReport> {
        self.request(Method::POST, &["ingest"], Some(json!({ "force_rebuild": force_rebuild }))).await
    }

    async fn ingest_status(&self) -> ApiResult<serde_json::Value> {
        self.request(Method::GET, &["ingest", "status"], None).await
    }
}

#[async_trait]
impl AuthApi for HttpClient {
    async fn register(&self, registration: &Registration) -> ApiResult<TokenResponse> {
        self.request(Method::POST, &["auth", "register"], Some(serde_json::to_value(registration)?)).await
    }

    async fn login(&self, email: &str, password: &str) -> ApiResult<TokenResponse> {
        let body = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.request(Method::POST, &["auth", "login"], Some(serde_json::to_value(body)?)).await
    }

    async fn me(&self) -> ApiResult<User> {
        self.request(Method::GET, &["auth", "me"], None).await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<ProfileUpdated> {
        self.request(Method::PUT, &["auth", "profile"], Some(serde_json::to_value(update)?)).await
    }

    async fn change_password(&self, current_password: &str, new_password: &str) -> ApiResult<Acknowledgement> {
        let body = json!({
            "current_password": current_password,
            "new_password": new_password,
        });
        self.request(Method::PUT, &["auth", "change-password"], Some(body)).await
    }

    async fn forgot_password(&self, email: &str) -> ApiResult<PasswordResetRequested> {
        self.request(Method::POST, &["auth", "forgot-password"], Some(json!({ "email": email }))).await
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> ApiResult<Acknowledgement> {
        let body = json!({
            "token": token,
            "new_password": new_password,
        });
        self.request(Method::POST, &["auth", "reset-password"], Some(body)).await
    }

    async fn logout(&self) -> ApiResult<Acknowledgement> {
        self.request(Method::POST, &["auth", "logout"], None).await
    }

    fn set_token(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }
}
