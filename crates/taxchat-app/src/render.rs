//! Terminal rendering of chat turns and lists.
//!
//! Everything is built as a `String` first so the REPL and the one-shot
//! commands print the same thing.

use colored::Colorize;
use std::fmt::Write;

use taxchat_types::{format_date, ChatMessage, Citation, ConversationSummary, RecentChat, Route, User};

use crate::topics::QUICK_TOPICS;

pub const REFUSAL_TITLE: &str = "Limited Response";
pub const REFUSAL_TEXT: &str = "This query may be outside the scope of Nigerian tax reform topics.";

fn route_icon(route: &Route) -> &'static str {
    match route {
        Route::Clarify => "🤔 ",
        Route::Compare => "📊 ",
        Route::ClaimCheck => "🔍 ",
        Route::Smalltalk => "💬 ",
        Route::Qa => "❓ ",
        Route::Other(_) => "",
    }
}

/// Badge for non-default routes; `None` for plain Q&A answers
pub fn route_badge(route: &Route) -> Option<String> {
    if *route == Route::Qa {
        return None;
    }
    Some(format!("{}{}", route_icon(route), route.label()))
}

/// Lines describing one cited source
pub fn citation_lines(citation: &Citation) -> Vec<String> {
    let mut lines = Vec::new();

    let source = if citation.source.trim().is_empty() { "Document" } else { citation.source.as_str() };
    lines.push(source.to_string());

    if !citation.pages.is_empty() && citation.pages != "p.?" {
        lines.push(format!("Pages: {}", citation.pages));
    }
    if !citation.chunk_id.is_empty() {
        let short: String = citation.chunk_id.chars().take(8).collect();
        lines.push(format!("ID: {}...", short));
    }
    if !citation.quote.is_empty() {
        lines.push(format!("\"{}\"", citation.quote));
    }
    lines
}

pub fn format_message(message: &ChatMessage) -> String {
    let mut out = String::new();
    let date = format_date(&message.timestamp);

    if message.role.is_user() {
        let _ = writeln!(out, "{} {}", "You:".bright_green().bold(), date.bright_black());
        let _ = writeln!(out, "{}", message.text);
        return out;
    }

    let _ = writeln!(out, "{} {}", "Assistant:".bright_cyan().bold(), date.bright_black());

    if message.is_error {
        let _ = writeln!(out, "{} {}", "⚠️".yellow(), message.text.red());
        return out;
    }

    let _ = writeln!(out, "{}", message.text);

    if let Some(badge) = route_badge(&message.route) {
        let _ = writeln!(out, "  {}", badge.bright_magenta());
    }

    if message.refusal {
        let _ = writeln!(out, "  {} {}", "⚠️".yellow(), REFUSAL_TITLE.yellow().bold());
        let _ = writeln!(out, "     {}", REFUSAL_TEXT.yellow());
    }

    if !message.citations.is_empty() {
        let _ = writeln!(out, "  {}", "📄 Reference Sources".bright_blue().bold());
        for (i, citation) in message.citations.iter().enumerate() {
            let lines = citation_lines(citation);
            let mut lines = lines.iter();
            if let Some(first) = lines.next() {
                let _ = writeln!(out, "  {}. {}", i + 1, first.bold());
            }
            for line in lines {
                let _ = writeln!(out, "     {}", line.bright_black());
            }
        }
    }

    out
}

pub fn format_conversation(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(format_message)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_error_banner(error: &str) -> String {
    format!("{} {}", "❌".bright_red(), error.bright_red())
}

pub fn format_recent_chats(chats: &[RecentChat]) -> String {
    if chats.is_empty() {
        return format!("{}", "No recent chats yet.".bright_black());
    }

    let mut out = format!("{}\n", "🕘 Recent chats:".bright_cyan());
    for (i, chat) in chats.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. {} {}",
            i + 1,
            chat.title.bold(),
            format!("({})", format_date(&chat.date)).bright_black()
        );
        let _ = writeln!(out, "     {}", chat.preview.bright_black());
    }
    out
}

pub fn format_conversations(conversations: &[ConversationSummary]) -> String {
    if conversations.is_empty() {
        return format!("{}", "No saved conversations.".bright_black());
    }

    let mut out = String::new();
    for conversation in conversations {
        let title = if conversation.title.is_empty() { "Untitled" } else { conversation.title.as_str() };
        let _ = writeln!(
            out,
            "  {} {} {}",
            title.bold(),
            format!("[{} messages, {}]", conversation.message_count, format_date(&conversation.updated_at))
                .bright_black(),
            conversation.session_id.bright_black()
        );
        if let Some(last) = &conversation.last_message {
            let _ = writeln!(out, "     {}", last.bright_black());
        }
    }
    out
}

pub fn format_user(user: &User) -> String {
    let mut out = format!("{} {}", "👤".bright_cyan(), user.display_name().bold());
    let _ = write!(out, " <{}>", user.email);
    if user.display_name() != user.username {
        let _ = write!(out, " (@{})", user.username);
    }
    if !user.is_verified {
        let _ = write!(out, " {}", "unverified".yellow());
    }
    out
}

pub fn format_welcome() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "📄 Nigerian Tax Reform Bills 2024".bright_cyan().bold());
    let _ = writeln!(out, "{}", "Official Q&A Assistant for the 2024 Tax Reform Legislation".bright_black());
    let _ = writeln!(out);
    out.push_str(&format_topics());
    out
}

pub fn format_topics() -> String {
    let mut out = format!("{}\n", "Common Inquiries".bold());
    for (i, topic) in QUICK_TOPICS.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. {} - {}",
            i + 1,
            topic.title.bright_green(),
            topic.description.bright_black()
        );
        let _ = writeln!(out, "     {}", topic.question);
    }
    out
}

pub fn format_help() -> String {
    let mut out = format!("{}\n", "Commands:".bright_cyan());
    for (command, description) in [
        ("/new", "Start a new conversation"),
        ("/recent", "List recent chats"),
        ("/open <n>", "Reopen recent chat number n"),
        ("/clear-recent", "Forget all recent chats"),
        ("/history", "Show the current conversation again"),
        ("/topics", "Show common inquiries"),
        ("/topic <n>", "Ask common inquiry number n"),
        ("/whoami", "Show the signed-in account"),
        ("/help", "Show this help"),
        ("exit, quit", "Leave"),
    ] {
        let _ = writeln!(out, "  {:<16} - {}", command, description);
    }
    out
}
