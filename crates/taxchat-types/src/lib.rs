//! Core types and structures for taxchat
//!
//! This crate provides the flat records shared by the API client and the
//! terminal application: chat turns, citations, recent-chat entries and the
//! authentication payloads exchanged with the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub mod text;

pub use text::{format_date, generate_local_session_id, short_id, truncate_text};

// ============================================================================
// Constants
// ============================================================================

/// Default base URL of the assistant backend
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Maximum number of entries kept in the recent chats list
pub const MAX_RECENT_CHATS: usize = 15;

/// Recent chat title length (characters, before the ellipsis)
pub const TITLE_MAX_CHARS: usize = 30;

/// Recent chat preview length (characters, before the ellipsis)
pub const PREVIEW_MAX_CHARS: usize = 50;

/// Same-session recent chats newer than this are replaced, not duplicated
pub const DUPLICATE_WINDOW_MS: i64 = 5_000;

/// How much of an HTTP error body is kept in error messages
pub const ERROR_BODY_MAX_CHARS: usize = 100;

/// Text of the assistant bubble shown when sending fails
pub const SEND_FAILURE_TEXT: &str =
    "Sorry, I encountered an error. Please try again or check your connection.";

// ============================================================================
// Message Types
// ============================================================================

/// Author of a chat turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Other(name) => name,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Role::User)
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            other => Role::Other(other.to_string()),
        }
    }
}

impl Serialize for Role {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Role::from(s.as_str()))
    }
}

/// How the backend routed a question
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Qa,
    Clarify,
    Compare,
    ClaimCheck,
    Smalltalk,
    Other(String),
}

impl Route {
    pub fn as_str(&self) -> &str {
        match self {
            Route::Qa => "qa",
            Route::Clarify => "clarify",
            Route::Compare => "compare",
            Route::ClaimCheck => "claim_check",
            Route::Smalltalk => "smalltalk",
            Route::Other(name) => name,
        }
    }

    /// Badge text shown next to assistant answers
    pub fn label(&self) -> String {
        match self {
            Route::Qa => "Q&A".to_string(),
            Route::Clarify => "Seeking Clarification".to_string(),
            Route::Compare => "Comparison Mode".to_string(),
            Route::ClaimCheck => "Fact Checking".to_string(),
            Route::Smalltalk => "General Chat".to_string(),
            Route::Other(name) => format!("Mode: {}", name),
        }
    }
}

impl From<&str> for Route {
    fn from(s: &str) -> Self {
        match s {
            "" | "qa" => Route::Qa,
            "clarify" => Route::Clarify,
            "compare" => Route::Compare,
            "claim_check" => Route::ClaimCheck,
            "smalltalk" => Route::Smalltalk,
            other => Route::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Route {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Route {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.as_deref().map(Route::from).unwrap_or_default())
    }
}

/// Helper function to deserialize string or null values
pub fn deserialize_string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        _ => Ok(String::new()),
    }
}

fn deserialize_vec_or_null<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_bool_or_null<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// A source passage backing an answer
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default, deserialize_with = "deserialize_string_or_null")]
    pub chunk_id: String,
    #[serde(default, deserialize_with = "deserialize_string_or_null")]
    pub source: String,
    #[serde(default, deserialize_with = "deserialize_string_or_null")]
    pub pages: String,
    #[serde(default, deserialize_with = "deserialize_string_or_null")]
    pub quote: String,
}

/// One rendered conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default = "now_millis")]
    pub id: i64,
    pub role: Role,
    #[serde(alias = "content", default, deserialize_with = "deserialize_string_or_null")]
    pub text: String,
    #[serde(alias = "created_at", default, deserialize_with = "deserialize_string_or_null")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "deserialize_vec_or_null")]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub route: Route,
    #[serde(default, deserialize_with = "deserialize_bool_or_null")]
    pub refusal: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ChatMessage {
    /// A user turn stamped with `now`
    pub fn user(text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: now.timestamp_millis(),
            role: Role::User,
            text: text.into(),
            timestamp: now.to_rfc3339(),
            citations: Vec::new(),
            route: Route::Qa,
            refusal: false,
            is_error: false,
        }
    }

    /// Assistant bubble shown in place of an answer when sending failed
    pub fn send_failure(id: i64, now: DateTime<Utc>) -> Self {
        Self {
            id,
            role: Role::Assistant,
            text: SEND_FAILURE_TEXT.to_string(),
            timestamp: now.to_rfc3339(),
            citations: Vec::new(),
            route: Route::Qa,
            refusal: false,
            is_error: true,
        }
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

// ============================================================================
// Recent Chats
// ============================================================================

/// Local pointer to a backend session, shown in the history list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentChat {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub date: String,
    pub session_id: String,
    pub conversation_id: String,
}

impl RecentChat {
    /// Parsed `date`; `None` when the stored value is malformed
    pub fn date_time(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }
}

// ============================================================================
// API Payloads
// ============================================================================

/// Response of `POST /new-session`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub session_id: String,
    pub message: String,
}

/// Response of `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageResponse {
    #[serde(default, deserialize_with = "deserialize_string_or_null")]
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_vec_or_null")]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub route: Route,
    #[serde(default, deserialize_with = "deserialize_bool_or_null")]
    pub refusal: bool,
    #[serde(default, alias = "created_at", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_title: Option<String>,
}

/// Response of `GET /history/{session_id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_vec_or_null")]
    pub messages: Vec<ChatMessage>,
}

/// Entry of `GET /my-conversations`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub session_id: String,
    #[serde(default, deserialize_with = "deserialize_string_or_null")]
    pub title: String,
    #[serde(default)]
    pub message_count: u64,
    #[serde(default, deserialize_with = "deserialize_string_or_null")]
    pub created_at: String,
    #[serde(default, deserialize_with = "deserialize_string_or_null")]
    pub updated_at: String,
    #[serde(default)]
    pub last_message: Option<String>,
}

/// Response of `POST /ingest`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    #[serde(default)]
    pub indexed_chunks: u64,
    #[serde(default)]
    pub added: u64,
    #[serde(default)]
    pub updated: u64,
    #[serde(default)]
    pub skipped: u64,
}

// ============================================================================
// Authentication
// ============================================================================

/// Account as returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default, deserialize_with = "deserialize_string_or_null")]
    pub created_at: String,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

/// Response of login and registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Body of `POST /auth/register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Body of `POST /auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Body of `PUT /auth/profile`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Response of `PUT /auth/profile`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpdated {
    #[serde(default)]
    pub message: Option<String>,
    pub user: User,
}

/// Response of `POST /auth/forgot-password`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PasswordResetRequested {
    #[serde(default)]
    pub message: Option<String>,
    /// Only returned by development backends
    #[serde(default)]
    pub demo_token: Option<String>,
}

/// Generic `{ "message": ... }` acknowledgement
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub message: Option<String>,
}
