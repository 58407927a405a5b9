//! Recent chats bookkeeping.
//!
//! The list is newest-first and capped at [`MAX_RECENT_CHATS`]. Several
//! answers arriving in quick succession for the same session collapse into
//! one entry, so the list shows conversations rather than individual turns.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use taxchat_types::{
    truncate_text, RecentChat, DUPLICATE_WINDOW_MS, MAX_RECENT_CHATS, PREVIEW_MAX_CHARS,
    TITLE_MAX_CHARS,
};

fn conversation_id(session_id: &str, now: DateTime<Utc>) -> String {
    format!("{}_{}", session_id, now.timestamp_millis())
}

fn non_empty_or(text: String, fallback: &str) -> String {
    if text.is_empty() {
        fallback.to_string()
    } else {
        text
    }
}

/// Record a question/answer pair for `session_id`
pub fn record_exchange(
    chats: &[RecentChat],
    user_message: &str,
    assistant_reply: &str,
    session_id: &str,
    now: DateTime<Utc>,
) -> Vec<RecentChat> {
    let id = conversation_id(session_id, now);
    let entry = RecentChat {
        id: id.clone(),
        title: non_empty_or(truncate_text(user_message, TITLE_MAX_CHARS), "New Message"),
        preview: non_empty_or(truncate_text(assistant_reply, PREVIEW_MAX_CHARS), "AI response"),
        date: now.to_rfc3339(),
        session_id: session_id.to_string(),
        conversation_id: id,
    };

    let kept = chats
        .iter()
        .filter(|chat| !is_recent_duplicate(chat, session_id, now))
        .take(MAX_RECENT_CHATS - 1)
        .cloned();

    std::iter::once(entry).chain(kept).collect()
}

/// Record a freshly started, still empty conversation
pub fn record_new_chat(chats: &[RecentChat], session_id: &str, now: DateTime<Utc>) -> Vec<RecentChat> {
    let id = conversation_id(session_id, now);
    let entry = RecentChat {
        id: id.clone(),
        title: "New Chat".to_string(),
        preview: "Started new conversation".to_string(),
        date: now.to_rfc3339(),
        session_id: session_id.to_string(),
        conversation_id: id,
    };

    std::iter::once(entry)
        .chain(chats.iter().take(MAX_RECENT_CHATS - 1).cloned())
        .collect()
}

/// Same session and dated within the duplicate window of `now`
fn is_recent_duplicate(chat: &RecentChat, session_id: &str, now: DateTime<Utc>) -> bool {
    if chat.session_id != session_id {
        return false;
    }
    match chat.date_time() {
        Some(date) => (now - date).num_milliseconds().abs() < DUPLICATE_WINDOW_MS,
        None => false,
    }
}

/// Number of distinct sessions referenced by the list
pub fn unique_sessions(chats: &[RecentChat]) -> usize {
    chats
        .iter()
        .map(|chat| chat.session_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}
