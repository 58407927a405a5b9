use async_trait::async_trait;

use taxchat_types::{
    Acknowledgement, ConversationSummary, HistoryResponse, IngestReport, PasswordResetRequested,
    ProfileUpdate, ProfileUpdated, Registration, SendMessageResponse, SessionCreated,
    TokenResponse, User,
};

use crate::error::{ApiError, ApiResult};

pub mod http;
pub mod mock;

/// Conversation endpoints of the assistant backend
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Open a fresh backend session
    async fn create_session(&self) -> ApiResult<SessionCreated>;

    /// Ask a question within a session
    async fn send_message(&self, session_id: &str, message: &str) -> ApiResult<SendMessageResponse>;

    /// Stored turns of a session; fails when the backend does not know it
    async fn get_history(&self, session_id: &str) -> ApiResult<HistoryResponse>;

    /// Conversations owned by the logged-in account
    async fn list_conversations(&self) -> ApiResult<Vec<ConversationSummary>> {
        Err(ApiError::Unsupported("listing conversations"))
    }

    async fn delete_conversation(&self, _session_id: &str) -> ApiResult<Acknowledgement> {
        Err(ApiError::Unsupported("deleting conversations"))
    }

    /// Ask the backend to (re)index its source documents
    async fn ingest_documents(&self, _force_rebuild: bool) -> ApiResult<IngestReport> {
        Err(ApiError::Unsupported("document ingestion"))
    }

    async fn ingest_status(&self) -> ApiResult<serde_json::Value> {
        Err(ApiError::Unsupported("ingestion status"))
    }
}

/// Account endpoints of the assistant backend
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn register(&self, registration: &Registration) -> ApiResult<TokenResponse>;

    async fn login(&self, email: &str, password: &str) -> ApiResult<TokenResponse>;

    /// Account behind the current bearer token
    async fn me(&self) -> ApiResult<User>;

    async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<ProfileUpdated>;

    async fn change_password(&self, current_password: &str, new_password: &str) -> ApiResult<Acknowledgement>;

    async fn forgot_password(&self, email: &str) -> ApiResult<PasswordResetRequested>;

    async fn reset_password(&self, token: &str, new_password: &str) -> ApiResult<Acknowledgement>;

    async fn logout(&self) -> ApiResult<Acknowledgement>;

    /// Replace the bearer token used for subsequent requests
    fn set_token(&self, token: Option<String>);
}
