//! Chat session controller.
//!
//! Holds the visible conversation plus the bits of state that outlive a run
//! (active session id, recent chats) and keeps them in sync with the store.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;

use taxchat_api::{ApiResult, ChatApi};
use taxchat_logging::{debug_line, warn_line};
use taxchat_types::{
    generate_local_session_id, short_id, ChatMessage, RecentChat, Role, SendMessageResponse,
};

use crate::chat::recent::{record_exchange, record_new_chat, unique_sessions};
use crate::storage::{SharedStore, ACTIVE_SESSION_KEY, RECENT_CHATS_KEY};

pub const NEW_SESSION_FAILED: &str = "Could not create new session. Using local session.";
pub const LOAD_CHAT_FAILED: &str = "Could not load chat history. Starting new chat instead.";

pub struct ChatSession<A: ChatApi + ?Sized> {
    api: Arc<A>,
    store: SharedStore,
    messages: Vec<ChatMessage>,
    loading: bool,
    error: Option<String>,
    session_id: String,
    recent_chats: Vec<RecentChat>,
    verbose: bool,
}

impl<A: ChatApi + ?Sized> ChatSession<A> {
    pub fn new(api: Arc<A>, store: SharedStore) -> Self {
        Self {
            api,
            store,
            messages: Vec::new(),
            loading: false,
            error: None,
            session_id: String::new(),
            recent_chats: Vec::new(),
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn recent_chats(&self) -> &[RecentChat] {
        &self.recent_chats
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    /// Restore recent chats and the active session, creating one when needed.
    ///
    /// Never fails because of the backend: if no session can be created a
    /// local `fallback_` id is used instead.
    pub async fn initialize(&mut self) -> Result<()> {
        if let Some(existing) = self.load_local_state().await {
            debug_line(self.verbose, format!("📂 Found existing session: {}", short_id(&existing)));
            match self.api.get_history(&existing).await {
                Ok(history) => {
                    self.session_id = existing;
                    self.messages = history.messages;
                    debug_line(self.verbose, format!("✅ Restored {} messages", self.messages.len()));
                    return Ok(());
                }
                Err(e) => {
                    debug_line(self.verbose, format!("⚠️ Stored session unavailable ({}), creating a new one", e));
                }
            }
        }

        if let Err(e) = self.create_new_session().await {
            debug_line(self.verbose, format!("❌ Session creation failed: {}", e));
            let fallback = generate_local_session_id("fallback", Utc::now());
            self.remember_session(&fallback).await;
            self.session_id = fallback;
            self.messages.clear();
        }

        Ok(())
    }

    /// Read recent chats and the stored active session id without asking the
    /// backend anything. Returns the stored id, if any.
    pub async fn load_local_state(&mut self) -> Option<String> {
        self.recent_chats = self.load_recent_chats().await;
        debug_line(
            self.verbose,
            format!(
                "📚 Loaded {} recent chats ({} sessions)",
                self.recent_chats.len(),
                unique_sessions(&self.recent_chats)
            ),
        );

        let stored = self.store.lock().await.get(ACTIVE_SESSION_KEY);
        let stored = stored.filter(|id| !id.is_empty() && id != "undefined");
        if let Some(id) = &stored {
            self.session_id = id.clone();
        }
        stored
    }

    /// Ask the backend for a fresh session and make it active
    pub async fn create_new_session(&mut self) -> ApiResult<String> {
        let created = self.api.create_session().await?;
        debug_line(self.verbose, format!("🆕 Created session: {}", short_id(&created.session_id)));

        self.remember_session(&created.session_id).await;
        self.session_id = created.session_id.clone();
        self.messages.clear();
        Ok(created.session_id)
    }

    /// Send `text` in the active session.
    ///
    /// Returns `Ok(false)` when the message was ignored (blank, or another
    /// request still in flight). A backend failure is not an error here: it
    /// shows up as the banner plus an error bubble.
    pub async fn send_message(&mut self, text: &str) -> Result<bool> {
        if text.trim().is_empty() || self.loading {
            return Ok(false);
        }

        self.error = None;
        let user_message = ChatMessage::user(text, Utc::now());
        let user_id = user_message.id;
        self.messages.push(user_message);
        self.loading = true;

        let session_id = self.session_id.clone();
        let result = self.api.send_message(&session_id, text).await;
        self.loading = false;

        match result {
            Ok(reply) => {
                let assistant = assistant_message(user_id + 1, reply);
                self.recent_chats =
                    record_exchange(&self.recent_chats, text, &assistant.text, &session_id, Utc::now());
                self.messages.push(assistant);
                self.persist_recent_chats().await;
            }
            Err(e) => {
                self.error = Some(format!("Failed to send message: {}", e));
                self.messages.push(ChatMessage::send_failure(user_id + 1, Utc::now()));
            }
        }

        Ok(true)
    }

    /// Switch to a brand new conversation and return its id
    pub async fn start_new_chat(&mut self) -> String {
        match self.create_new_session().await {
            Ok(session_id) => {
                self.recent_chats = record_new_chat(&self.recent_chats, &session_id, Utc::now());
                self.persist_recent_chats().await;
                session_id
            }
            Err(e) => {
                debug_line(self.verbose, format!("❌ New session failed: {}", e));
                let local = generate_local_session_id("new", Utc::now());
                self.remember_session(&local).await;
                self.session_id = local.clone();
                self.messages.clear();
                self.error = Some(NEW_SESSION_FAILED.to_string());
                local
            }
        }
    }

    /// Reopen a recent chat.
    ///
    /// When its history cannot be fetched a new chat is started and the
    /// fetch error is returned.
    pub async fn load_chat(&mut self, chat: &RecentChat) -> Result<()> {
        debug_line(self.verbose, format!("📂 Loading chat: {}", short_id(&chat.session_id)));
        self.remember_session(&chat.session_id).await;
        self.session_id = chat.session_id.clone();

        match self.api.get_history(&chat.session_id).await {
            Ok(history) => {
                self.messages = history.messages;
                Ok(())
            }
            Err(e) => {
                self.error = Some(LOAD_CHAT_FAILED.to_string());
                self.start_new_chat().await;
                Err(e.into())
            }
        }
    }

    /// Reopen the `index`-th recent chat, counting from 1
    pub async fn load_recent(&mut self, index: usize) -> Result<()> {
        let chat = index
            .checked_sub(1)
            .and_then(|i| self.recent_chats.get(i))
            .cloned()
            .ok_or_else(|| {
                anyhow::anyhow!("No recent chat #{} ({} available)", index, self.recent_chats.len())
            })?;
        self.load_chat(&chat).await
    }

    pub async fn clear_recent_chats(&mut self) -> Result<()> {
        self.recent_chats.clear();
        self.store.lock().await.remove(RECENT_CHATS_KEY)?;
        Ok(())
    }

    /// Number of assistant turns currently on screen
    pub fn answer_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| !m.role.is_user() && !m.is_error)
            .count()
    }

    async fn load_recent_chats(&self) -> Vec<RecentChat> {
        match self.store.lock().await.get_json::<Vec<RecentChat>>(RECENT_CHATS_KEY) {
            Ok(chats) => chats.unwrap_or_default(),
            Err(e) => {
                warn_line(format!("Ignoring stored recent chats: {}", e));
                Vec::new()
            }
        }
    }

    async fn persist_recent_chats(&self) {
        if self.recent_chats.is_empty() {
            return;
        }
        if let Err(e) = self.store.lock().await.set_json(RECENT_CHATS_KEY, &self.recent_chats) {
            warn_line(format!("Could not save recent chats: {}", e));
        }
    }

    async fn remember_session(&self, session_id: &str) {
        if let Err(e) = self.store.lock().await.set(ACTIVE_SESSION_KEY, session_id) {
            warn_line(format!("Could not save active session: {}", e));
        }
    }
}

fn assistant_message(id: i64, reply: SendMessageResponse) -> ChatMessage {
    ChatMessage {
        id,
        role: Role::Assistant,
        text: reply.answer,
        timestamp: reply.timestamp.unwrap_or_else(|| Utc::now().to_rfc3339()),
        citations: reply.citations,
        route: reply.route,
        refusal: reply.refusal,
        is_error: false,
    }
}
