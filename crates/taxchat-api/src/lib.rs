//! # taxchat-api
//!
//! Client side of the tax-reform assistant REST API:
//! - session creation, message exchange and history retrieval
//! - account endpoints (register, login, profile, password reset)
//! - document ingestion triggers
//!
//! ## Features
//!
//! - **Two traits**: `ChatApi` for conversations, `AuthApi` for accounts
//! - **HTTP client**: `HttpClient` backed by reqwest, with bearer token support
//! - **Offline mode**: `MockApi` answers canned questions without a backend
//!
//! ## Example
//!
//! ```rust,no_run
//! use taxchat_api::{ChatApi, HttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), taxchat_api::ApiError> {
//!     let client = HttpClient::new("http://localhost:8000/api");
//!     let session = client.create_session().await?;
//!     let reply = client
//!         .send_message(&session.session_id, "What are the new VAT rates?")
//!         .await?;
//!     println!("{}", reply.answer);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;

pub use client::{
    AuthApi,
    ChatApi,
    http::HttpClient,
    mock::MockApi,
};

pub use config::{
    ApiMode,
    normalize_base_url,
};

pub use error::{ApiError, ApiResult};
